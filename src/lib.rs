pub mod alerts;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod ring_buffer;

pub use alerts::{Alert, AlertKind, AlertMonitor};
pub use analyzer::{
    DetectionPipeline, FaceConfidenceScorer, FaceDetector, FaceMatcher, FaceResult, FrameReport,
    MatchResult, MatchStrength, MotionDetector, MotionResult, ObjectContrastDetector,
    ObjectResult, PipelineMetrics, Region, RegionMerger, RegionSegmenter,
};
pub use config::WatchcamConfig;
pub use error::{FrameError, Result, WatchcamError};
pub use events::{
    Activity, ActivityKind, ActivityStats, ActivityStore, Severity, StoreEvent, Subscription,
};
pub use frame::Frame;
pub use ring_buffer::{RingBuffer, RingBufferStats};
