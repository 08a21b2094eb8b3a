use crate::alerts::{Alert, AlertMonitor};
use crate::analyzer::contrast::{ObjectContrastDetector, ObjectResult};
use crate::analyzer::face::{FaceDetector, FaceResult};
use crate::analyzer::motion::{MotionDetector, MotionResult};
use crate::config::{PipelineConfig, WatchcamConfig};
use crate::events::{Activity, ActivityKind, ActivityStore, Severity};
use crate::frame::Frame;
use serde::Serialize;
use tracing::{debug, info};

/// Counters about pipeline activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineMetrics {
    pub frames_processed: u64,
    pub motion_frames: u64,
    pub object_frames: u64,
    pub face_frames: u64,
    pub activities_recorded: u64,
}

/// Everything the pipeline learned from one frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_id: u64,
    pub motion: MotionResult,
    pub objects: ObjectResult,
    pub faces: FaceResult,
    pub person_present: bool,
    /// Activities recorded while processing this frame, in order
    pub activities: Vec<Activity>,
    /// Alerts newly raised after this frame
    pub alerts: Vec<Alert>,
}

/// Runs the detectors over each frame of one stream and records what they find.
///
/// Detectors run in a fixed order: motion, objects, faces. The activity store
/// is owned by the caller and lent for each frame.
#[derive(Debug)]
pub struct DetectionPipeline {
    config: PipelineConfig,
    motion: MotionDetector,
    objects: ObjectContrastDetector,
    faces: FaceDetector,
    alerts: AlertMonitor,
    person_present: bool,
    metrics: PipelineMetrics,
}

impl DetectionPipeline {
    pub fn new(config: &WatchcamConfig) -> Self {
        info!(
            "Creating detection pipeline (sensitivity {}, motion report > {}, object report > {})",
            config.motion.sensitivity,
            config.pipeline.motion_report_level,
            config.pipeline.object_report_confidence
        );

        Self {
            config: config.pipeline.clone(),
            motion: MotionDetector::new(config.motion.sensitivity),
            objects: ObjectContrastDetector::new(),
            faces: FaceDetector::new(),
            alerts: AlertMonitor::new(),
            person_present: false,
            metrics: PipelineMetrics::default(),
        }
    }

    /// Analyze one frame and record resulting activities in `store`
    pub fn process_frame(&mut self, frame: &Frame, store: &mut ActivityStore) -> FrameReport {
        debug!(
            "Processing frame {} ({}x{})",
            frame.id,
            frame.width(),
            frame.height()
        );

        let mut activities = Vec::new();

        let motion = self.motion.detect_motion(frame);
        if motion.has_motion {
            self.metrics.motion_frames += 1;
            if motion.motion_level > self.config.motion_report_level {
                let severity = if motion.motion_level > self.config.motion_high_level {
                    Severity::High
                } else {
                    Severity::Medium
                };
                activities.push(store.add(
                    ActivityKind::Motion,
                    format!("Motion detected at {}% level", motion.motion_level),
                    severity,
                ));
            }
        }

        let objects = self.objects.detect_objects(frame);
        if objects.detected {
            self.metrics.object_frames += 1;
            if objects.confidence > self.config.object_report_confidence {
                activities.push(store.add(
                    ActivityKind::Object,
                    format!(
                        "Object detected with {}% confidence",
                        objects.confidence.round()
                    ),
                    Severity::Low,
                ));
            }
        }

        let faces = self.faces.detect_faces(frame);
        if faces.detected {
            self.metrics.face_frames += 1;
        }

        let person_present = self.faces.is_person_present();
        if person_present && !self.person_present {
            info!("Person present in frame {}", frame.id);
            activities.push(store.add(
                ActivityKind::Person,
                format!(
                    "Person present: {} face region{} at {}% confidence",
                    faces.regions.len(),
                    if faces.regions.len() == 1 { "" } else { "s" },
                    faces.confidence.round()
                ),
                Severity::Medium,
            ));
        }
        self.person_present = person_present;

        let alerts = if self.config.alerts_enabled {
            self.alerts.check(store)
        } else {
            Vec::new()
        };

        self.metrics.frames_processed += 1;
        self.metrics.activities_recorded += (activities.len() + alerts.len()) as u64;

        FrameReport {
            frame_id: frame.id,
            motion,
            objects,
            faces,
            person_present,
            activities,
            alerts,
        }
    }

    /// Change the motion sensitivity (clamped to 5..=50)
    pub fn set_sensitivity(&mut self, level: u8) {
        self.motion.set_sensitivity(level);
    }

    pub fn metrics(&self) -> PipelineMetrics {
        self.metrics
    }

    pub fn face_detector(&self) -> &FaceDetector {
        &self.faces
    }

    pub fn motion_detector(&self) -> &MotionDetector {
        &self.motion
    }
}
