use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use watchcam::analyzer::rank_matches;
use watchcam::{
    alerts, ActivityStore, DetectionPipeline, FaceDetector, FaceMatcher, Frame, FrameError,
    MatchResult, Region, StoreEvent, WatchcamConfig,
};

#[derive(Parser, Debug)]
#[command(name = "watchcam")]
#[command(about = "Low-cost camera watch with heuristic motion, object and face-region detection")]
#[command(version)]
#[command(long_about = "Runs the watchcam detection pipeline over still images. Frames are \
compared for motion, scored for contrast and segmented for skin-tone regions; detections are \
recorded in an in-memory activity log and printed as JSON.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "watchcam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the detection pipeline over a sequence of images, in order
    Replay {
        /// Image files, all with the same dimensions
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Number of activities to print (defaults to store.default_limit)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Find face regions in one image and optionally score them against a target box
    Faces {
        image: PathBuf,

        /// Target region as x,y,w,h
        #[arg(long, value_parser = parse_region)]
        target: Option<Region>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting watchcam v{}", env!("CARGO_PKG_VERSION"));

    let config = match WatchcamConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        println!("✓ Configuration is valid");
        return Ok(());
    }

    match args.command {
        Some(Command::Replay { images, limit }) => replay(&config, &images, limit),
        Some(Command::Faces { image, target }) => faces(&config, &image, target),
        None => {
            warn!("No command given; nothing to do");
            eprintln!("Run with --help to list commands");
            Ok(())
        }
    }
}

/// Feed images through the pipeline as consecutive frames of one stream
fn replay(config: &WatchcamConfig, images: &[PathBuf], limit: Option<usize>) -> Result<()> {
    let mut store = ActivityStore::new();
    let _log_subscription = store.subscribe(|event| {
        match event {
            StoreEvent::Added { activity, stats } => {
                info!("{} (total {})", activity.description(), stats.total)
            }
            StoreEvent::Cleared => info!("Activity log cleared"),
        }
        Ok(())
    });

    let mut pipeline = DetectionPipeline::new(config);
    let frame_interval = (config.replay.fps > 0)
        .then(|| Duration::from_millis(1000 / config.replay.fps as u64));
    let mut stream_dimensions = None;

    for (index, path) in images.iter().enumerate() {
        let frame = Frame::load(index as u64, path)
            .with_context(|| format!("Failed to load frame from {}", path.display()))?;

        let (width, height) = *stream_dimensions.get_or_insert(frame.dimensions());
        if frame.dimensions() != (width, height) {
            return Err(FrameError::DimensionMismatch {
                frame_id: frame.id,
                width,
                height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            })
            .with_context(|| format!("Inconsistent frame size in {}", path.display()));
        }

        let report = pipeline.process_frame(&frame, &mut store);
        info!(
            "Frame {}: motion {}%, object {:.0}%, {} face region(s), person {}",
            report.frame_id,
            report.motion.motion_level,
            report.objects.confidence,
            report.faces.regions.len(),
            report.person_present
        );

        if let Some(interval) = frame_interval {
            std::thread::sleep(interval);
        }
    }

    let limit = limit.unwrap_or(config.store.default_limit);
    let summary = json!({
        "frames": images.len(),
        "metrics": pipeline.metrics(),
        "stats": store.stats(),
        "log": store.buffer_stats(),
        "alerts": alerts::evaluate(&store),
        "activities": store.get(limit),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Face-region analysis of a single still image
fn faces(config: &WatchcamConfig, image: &Path, target: Option<Region>) -> Result<()> {
    let frame = Frame::load(0, image)
        .with_context(|| format!("Failed to load image {}", image.display()))?;

    let mut detector = FaceDetector::new();
    let result = detector.detect_faces(&frame);
    info!(
        "Found {} face region(s) in {} at {:.1}% confidence",
        result.regions.len(),
        image.display(),
        result.confidence
    );

    let matches = target.map(|target| {
        let mut matcher = match config.matcher.seed {
            Some(seed) => FaceMatcher::seeded(seed),
            None => FaceMatcher::from_entropy(),
        };
        let mut results: Vec<MatchResult> = result
            .regions
            .iter()
            .map(|region| MatchResult {
                detected_regions: vec![*region],
                match_confidence: matcher.match_regions(region, &target) as f64,
            })
            .collect();
        rank_matches(&mut results);

        results
            .into_iter()
            .map(|m| {
                json!({
                    "region": m.detected_regions[0],
                    "confidence": m.match_confidence,
                    "strength": m.strength().label(),
                })
            })
            .collect::<Vec<_>>()
    });

    let summary = json!({
        "image": image.display().to_string(),
        "width": frame.width(),
        "height": frame.height(),
        "faces": result,
        "matches": matches,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn parse_region(value: &str) -> std::result::Result<Region, String> {
    let parts: Vec<i32> = value
        .split(',')
        .map(|part| part.trim().parse::<i32>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid region '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, w, h] if *w > 0 && *h > 0 => {
            let pixel_count = w
                .checked_mul(*h)
                .and_then(|area| u32::try_from(area).ok())
                .ok_or_else(|| "region too large".to_string())?;
            Ok(Region::new(*x, *y, *w, *h, pixel_count))
        }
        [_, _, _, _] => Err("region width and height must be positive".to_string()),
        _ => Err(format!("expected x,y,w,h but got '{}'", value)),
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("watchcam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .with_writer(std::io::stderr)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Watchcam Configuration File");
    println!("# Every key is optional; environment variables such as");
    println!("# WATCHCAM__MOTION__SENSITIVITY=20 override the file.");
    println!("# [matcher] seed = <u64> fixes the match noise sequence.");
    println!();
    println!("{}", toml::to_string_pretty(&WatchcamConfig::default())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_region() {
        assert_eq!(parse_region("10,20,30,40"), Ok(Region::new(10, 20, 30, 40, 1200)));
        assert_eq!(parse_region(" 1, 2, 3, 4 "), Ok(Region::new(1, 2, 3, 4, 12)));
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,0,4").is_err());
        assert!(parse_region("a,b,c,d").is_err());
    }

    #[test]
    fn test_parse_region_rejects_oversized_area() {
        assert_eq!(
            parse_region("0,0,100000,100000"),
            Err("region too large".to_string())
        );
        assert_eq!(
            parse_region("0,0,46340,46340").map(|r| r.pixel_count),
            Ok(46340 * 46340)
        );
    }

    #[test]
    fn test_oversized_target_is_a_usage_error() {
        let err = Args::try_parse_from([
            "watchcam",
            "faces",
            "img.png",
            "--target",
            "0,0,100000,100000",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_args_parse_replay() {
        let args = Args::try_parse_from(["watchcam", "-v", "replay", "a.png", "b.png"]).unwrap();
        assert!(args.verbose);
        match args.command {
            Some(Command::Replay { images, limit }) => {
                assert_eq!(images.len(), 2);
                assert!(limit.is_none());
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_parse_faces_target() {
        let args =
            Args::try_parse_from(["watchcam", "faces", "img.png", "--target", "0,0,50,60"]).unwrap();
        match args.command {
            Some(Command::Faces { target, .. }) => {
                assert_eq!(target, Some(Region::new(0, 0, 50, 60, 3000)));
            }
            other => panic!("Unexpected command: {:?}", other),
        }
    }
}
