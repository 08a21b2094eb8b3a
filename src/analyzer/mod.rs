pub mod contrast;
pub mod face;
pub mod matcher;
pub mod merge;
pub mod motion;
mod orchestrator;
pub mod region;
pub mod segment;


pub use contrast::{ObjectContrastDetector, ObjectResult};
pub use face::{FaceConfidenceScorer, FaceDetector, FaceResult, HistoryEntry};
pub use matcher::{rank_matches, FaceMatcher, MatchResult, MatchStrength};
pub use merge::RegionMerger;
pub use motion::{MotionDetector, MotionResult};
pub use orchestrator::{DetectionPipeline, FrameReport, PipelineMetrics};
pub use region::Region;
pub use segment::{is_skin_tone, RegionSegmenter};
