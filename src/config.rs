use crate::analyzer::motion::{DEFAULT_SENSITIVITY, MAX_SENSITIVITY, MIN_SENSITIVITY};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchcamConfig {
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MotionConfig {
    /// Average per-channel change a pixel needs to count as moved (5..=50)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: u8,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Motion level above which a motion activity is recorded
    #[serde(default = "default_motion_report_level")]
    pub motion_report_level: u8,

    /// Motion level above which the activity is high severity
    #[serde(default = "default_motion_high_level")]
    pub motion_high_level: u8,

    /// Object confidence above which an object activity is recorded
    #[serde(default = "default_object_report_confidence")]
    pub object_report_confidence: f64,

    /// Run the alert monitor after each frame
    #[serde(default = "default_alerts_enabled")]
    pub alerts_enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct MatcherConfig {
    /// Fixed seed for the match noise; entropy when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StoreConfig {
    /// Number of activities listed when no limit is given
    #[serde(default = "default_list_limit")]
    pub default_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Frames per second when replaying images; 0 replays unpaced
    #[serde(default = "default_replay_fps")]
    pub fps: u32,
}

impl WatchcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("watchcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("motion.sensitivity", default_sensitivity() as i64)?
            .set_default(
                "pipeline.motion_report_level",
                default_motion_report_level() as i64,
            )?
            .set_default(
                "pipeline.motion_high_level",
                default_motion_high_level() as i64,
            )?
            .set_default(
                "pipeline.object_report_confidence",
                default_object_report_confidence(),
            )?
            .set_default("pipeline.alerts_enabled", default_alerts_enabled())?
            .set_default("store.default_limit", default_list_limit() as i64)?
            .set_default("replay.fps", default_replay_fps() as i64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables, e.g. WATCHCAM__MOTION__SENSITIVITY
            .add_source(
                Environment::with_prefix("WATCHCAM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: WatchcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&self.motion.sensitivity) {
            return Err(ConfigError::Message(format!(
                "Motion sensitivity must be between {} and {}",
                MIN_SENSITIVITY, MAX_SENSITIVITY
            )));
        }

        if self.pipeline.motion_report_level > 100 || self.pipeline.motion_high_level > 100 {
            return Err(ConfigError::Message(
                "Motion levels must be between 0 and 100".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.pipeline.object_report_confidence) {
            return Err(ConfigError::Message(
                "Object report confidence must be between 0 and 100".to_string(),
            ));
        }

        if self.store.default_limit == 0 {
            return Err(ConfigError::Message(
                "Store default_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for WatchcamConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            pipeline: PipelineConfig::default(),
            matcher: MatcherConfig::default(),
            store: StoreConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            motion_report_level: default_motion_report_level(),
            motion_high_level: default_motion_high_level(),
            object_report_confidence: default_object_report_confidence(),
            alerts_enabled: default_alerts_enabled(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_limit: default_list_limit(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            fps: default_replay_fps(),
        }
    }
}

// Default value functions
fn default_sensitivity() -> u8 {
    DEFAULT_SENSITIVITY
}

fn default_motion_report_level() -> u8 {
    20
}
fn default_motion_high_level() -> u8 {
    50
}
fn default_object_report_confidence() -> f64 {
    40.0
}
fn default_alerts_enabled() -> bool {
    true
}

fn default_list_limit() -> usize {
    crate::events::DEFAULT_GET_LIMIT
}

fn default_replay_fps() -> u32 {
    10
}
