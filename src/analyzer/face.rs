use crate::analyzer::merge::RegionMerger;
use crate::analyzer::region::Region;
use crate::analyzer::segment::RegionSegmenter;
use crate::frame::Frame;
use crate::ring_buffer::RingBuffer;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// Number of past detections kept for presence checks
pub const HISTORY_CAPACITY: usize = 30;
/// Consecutive non-empty detections required for "person present"
const PRESENCE_WINDOW: usize = 3;

const SIZE_WEIGHT: f64 = 10_000.0;
const DENSITY_WEIGHT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceResult {
    pub detected: bool,
    pub regions: Vec<Region>,
    /// 0..=100
    pub confidence: f64,
}

/// One past detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub regions: Vec<Region>,
    pub timestamp: DateTime<Utc>,
}

/// Scores merged regions and remembers the last 30 detections
#[derive(Debug, Clone)]
pub struct FaceConfidenceScorer {
    history: RingBuffer<HistoryEntry>,
}

impl FaceConfidenceScorer {
    pub fn new() -> Self {
        Self {
            history: RingBuffer::new(HISTORY_CAPACITY),
        }
    }

    /// Mean per-region confidence, 0 for no regions.
    ///
    /// Each region scores `min(100, size_ratio * 10000 + density * 50)` where
    /// `size_ratio` is its box area over the frame area and `density` is its
    /// pixel count over its box area.
    pub fn score(&self, regions: &[Region], frame_width: u32, frame_height: u32) -> f64 {
        let frame_area = frame_width as f64 * frame_height as f64;
        if regions.is_empty() || frame_area == 0.0 {
            return 0.0;
        }

        let total: f64 = regions
            .iter()
            .map(|region| {
                let area = region.area() as f64;
                if area <= 0.0 {
                    return 0.0;
                }
                let size_ratio = area / frame_area;
                let pixel_density = region.pixel_count as f64 / area;
                (size_ratio * SIZE_WEIGHT + pixel_density * DENSITY_WEIGHT).min(100.0)
            })
            .sum();

        (total / regions.len() as f64).min(100.0)
    }

    /// Push a detection into the history, dropping the oldest past capacity
    pub fn record(&mut self, regions: Vec<Region>, timestamp: DateTime<Utc>) {
        self.history.push(HistoryEntry { regions, timestamp });
    }

    /// True when the three most recent detections all found a region
    pub fn is_person_present(&self) -> bool {
        self.history.len() >= PRESENCE_WINDOW
            && self
                .history
                .recent(PRESENCE_WINDOW)
                .all(|entry| !entry.regions.is_empty())
    }

    /// Past detections, newest first
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for FaceConfidenceScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment, merge, score and record skin-tone regions for one stream
#[derive(Debug, Default, Clone)]
pub struct FaceDetector {
    segmenter: RegionSegmenter,
    merger: RegionMerger,
    scorer: FaceConfidenceScorer,
}

impl FaceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect_faces(&mut self, frame: &Frame) -> FaceResult {
        let candidates = self.segmenter.segment(frame);
        let regions = self.merger.merge(&candidates);
        let confidence = self
            .scorer
            .score(&regions, frame.width(), frame.height());

        debug!(
            "Frame {}: {} candidate regions merged into {}, confidence {:.1}",
            frame.id,
            candidates.len(),
            regions.len(),
            confidence
        );

        self.scorer.record(regions.clone(), Utc::now());

        FaceResult {
            detected: !regions.is_empty(),
            regions,
            confidence,
        }
    }

    pub fn is_person_present(&self) -> bool {
        self.scorer.is_person_present()
    }

    pub fn scorer(&self) -> &FaceConfidenceScorer {
        &self.scorer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_support::{paint_rect, solid_frame};

    fn region() -> Region {
        Region::new(0, 0, 10, 10, 100)
    }

    #[test]
    fn test_empty_regions_score_zero() {
        let scorer = FaceConfidenceScorer::new();
        assert_eq!(scorer.score(&[], 640, 480), 0.0);
    }

    #[test]
    fn test_region_confidence_formula() {
        let scorer = FaceConfidenceScorer::new();
        // size_ratio = 100 / 10000 = 0.01 -> 100, capped
        let capped = scorer.score(&[region()], 100, 100);
        assert_eq!(capped, 100.0);

        // size_ratio = 100 / 1_000_000 -> 1.0, density 0.5 -> 25.0
        let sparse = Region::new(0, 0, 10, 10, 50);
        let score = scorer.score(&[sparse], 1000, 1000);
        assert!((score - 26.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_mean_of_regions() {
        let scorer = FaceConfidenceScorer::new();
        let dense = Region::new(0, 0, 10, 10, 100); // 1 + 50
        let sparse = Region::new(50, 50, 10, 10, 50); // 1 + 25

        let score = scorer.score(&[dense, sparse], 1000, 1000);
        assert!((score - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_person_presence_needs_three_entries() {
        let mut scorer = FaceConfidenceScorer::new();
        assert!(!scorer.is_person_present());

        scorer.record(vec![region()], Utc::now());
        scorer.record(vec![region()], Utc::now());
        assert!(!scorer.is_person_present());

        scorer.record(vec![region()], Utc::now());
        assert!(scorer.is_person_present());
    }

    #[test]
    fn test_person_presence_requires_recent_regions() {
        let mut scorer = FaceConfidenceScorer::new();
        scorer.record(vec![region()], Utc::now());
        scorer.record(vec![region()], Utc::now());
        scorer.record(Vec::new(), Utc::now());
        scorer.record(vec![region()], Utc::now());
        assert!(!scorer.is_person_present());

        scorer.record(vec![region()], Utc::now());
        assert!(!scorer.is_person_present());

        // Empty entry is now the fourth newest
        scorer.record(vec![region()], Utc::now());
        assert!(scorer.is_person_present());
    }

    #[test]
    fn test_history_reads_newest_first() {
        let mut scorer = FaceConfidenceScorer::new();
        let start = Utc::now();
        let detections = [
            vec![Region::new(0, 0, 10, 10, 100)],
            Vec::new(),
            vec![Region::new(5, 5, 20, 20, 300), Region::new(90, 90, 12, 12, 120)],
        ];
        for (offset, regions) in detections.iter().enumerate() {
            scorer.record(regions.clone(), start + chrono::Duration::seconds(offset as i64));
        }

        let entries: Vec<&HistoryEntry> = scorer.history().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].regions, detections[2]);
        assert_eq!(entries[1].regions, detections[1]);
        assert_eq!(entries[2].regions, detections[0]);
        assert_eq!(entries[0].timestamp, start + chrono::Duration::seconds(2));
        assert_eq!(entries[2].timestamp, start);
    }

    #[test]
    fn test_history_evicts_oldest_past_capacity() {
        let mut scorer = FaceConfidenceScorer::new();
        for i in 0..=HISTORY_CAPACITY {
            scorer.record(vec![Region::new(i as i32, 0, 10, 10, 100)], Utc::now());
        }

        assert_eq!(scorer.history_len(), HISTORY_CAPACITY);
        let xs: Vec<i32> = scorer.history().map(|entry| entry.regions[0].x).collect();
        assert_eq!(xs.first(), Some(&(HISTORY_CAPACITY as i32)));
        // The first record (x = 0) is gone; x = 1 is now the oldest
        assert_eq!(xs.last(), Some(&1));
        assert!(!xs.contains(&0));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut scorer = FaceConfidenceScorer::new();
        for _ in 0..45 {
            scorer.record(Vec::new(), Utc::now());
        }
        assert_eq!(scorer.history_len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_detect_faces_on_block() {
        let mut detector = FaceDetector::new();
        let base = solid_frame(1, 640, 480, (0, 0, 0));
        let frame = paint_rect(&base, 200, 100, 200, 200, (180, 130, 90));

        let result = detector.detect_faces(&frame);

        assert!(result.detected);
        assert_eq!(result.regions, vec![Region::new(200, 100, 200, 200, 40_000)]);
        // size ratio 40000/307200 * 10000 is well above 100
        assert_eq!(result.confidence, 100.0);
        assert_eq!(detector.scorer().history_len(), 1);
    }

    #[test]
    fn test_detect_faces_merges_nearby_blobs() {
        let mut detector = FaceDetector::new();
        let base = solid_frame(1, 320, 240, (0, 0, 0));
        let frame = paint_rect(&base, 100, 100, 15, 15, (180, 130, 90));
        let frame = paint_rect(&frame, 130, 100, 15, 15, (180, 130, 90));

        let result = detector.detect_faces(&frame);

        assert_eq!(result.regions, vec![Region::new(100, 100, 45, 15, 450)]);
    }

    #[test]
    fn test_presence_after_consecutive_detections() {
        let mut detector = FaceDetector::new();
        let base = solid_frame(1, 64, 64, (0, 0, 0));
        let frame = paint_rect(&base, 10, 10, 20, 20, (180, 130, 90));

        detector.detect_faces(&frame);
        detector.detect_faces(&frame);
        assert!(!detector.is_person_present());
        detector.detect_faces(&frame);
        assert!(detector.is_person_present());

        detector.detect_faces(&base);
        assert!(!detector.is_person_present());
        assert!(!detector.detect_faces(&base).detected);
    }
}
