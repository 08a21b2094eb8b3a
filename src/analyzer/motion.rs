use crate::frame::Frame;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Default per-pixel colour change that counts as motion
pub const DEFAULT_SENSITIVITY: u8 = 15;
/// Lowest accepted sensitivity
pub const MIN_SENSITIVITY: u8 = 5;
/// Highest accepted sensitivity
pub const MAX_SENSITIVITY: u8 = 50;

/// Fraction of changed pixels above which a frame has motion
const AREA_THRESHOLD: f64 = 0.02;
/// Scale from changed-pixel fraction to the 0..=100 motion level
const LEVEL_SCALE: f64 = 5000.0;

/// Mask value for a changed pixel
pub const CHANGED: u8 = 255;

/// Outcome of comparing one frame with the previous one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionResult {
    pub has_motion: bool,
    /// 0..=100
    pub motion_level: u8,
    /// One byte per pixel, `CHANGED` where the colour moved past the threshold
    #[serde(skip)]
    pub changed_mask: Vec<u8>,
}

impl MotionResult {
    fn quiescent(pixel_count: usize) -> Self {
        Self {
            has_motion: false,
            motion_level: 0,
            changed_mask: vec![0; pixel_count],
        }
    }
}

/// Frame-differencing motion detector.
///
/// Holds a private copy of the last frame it analysed; the first call on a
/// stream (or after a resolution change) is always quiescent.
#[derive(Debug)]
pub struct MotionDetector {
    previous_frame: Option<Frame>,
    sensitivity: u8,
}

impl MotionDetector {
    /// Create a motion detector with the given sensitivity (clamped to 5..=50)
    pub fn new(sensitivity: u8) -> Self {
        let mut detector = Self {
            previous_frame: None,
            sensitivity: DEFAULT_SENSITIVITY,
        };
        detector.set_sensitivity(sensitivity);
        detector
    }

    /// Compare `frame` with the previously analysed frame, then retain it
    pub fn detect_motion(&mut self, frame: &Frame) -> MotionResult {
        let pixel_count = frame.pixel_count();

        let previous = match self.previous_frame.as_mut() {
            None => {
                info!(
                    "Storing first frame {} ({}x{}) as motion reference",
                    frame.id,
                    frame.width(),
                    frame.height()
                );
                self.previous_frame = Some(frame.clone());
                return MotionResult::quiescent(pixel_count);
            }
            Some(previous) if previous.dimensions() != frame.dimensions() => {
                warn!(
                    "Frame {} is {}x{} but reference is {}x{}, resetting motion reference",
                    frame.id,
                    frame.width(),
                    frame.height(),
                    previous.width(),
                    previous.height()
                );
                previous.copy_from(frame);
                return MotionResult::quiescent(pixel_count);
            }
            Some(previous) => previous,
        };

        let threshold = self.sensitivity as f64;
        let mut changed_mask = vec![0u8; pixel_count];
        let mut motion_pixels = 0usize;

        for (index, (current, before)) in frame.pixels().zip(previous.pixels()).enumerate() {
            let delta = current[0].abs_diff(before[0]) as u32
                + current[1].abs_diff(before[1]) as u32
                + current[2].abs_diff(before[2]) as u32;
            let diff = delta as f64 / 3.0;

            if diff > threshold {
                motion_pixels += 1;
                changed_mask[index] = CHANGED;
            }
        }

        previous.copy_from(frame);

        let motion_area = motion_pixels as f64 / pixel_count as f64;
        let has_motion = motion_area > AREA_THRESHOLD;
        let motion_level = (motion_area * LEVEL_SCALE).round().min(100.0) as u8;

        debug!(
            "Frame {}: {} of {} pixels changed (level {}, motion {})",
            frame.id, motion_pixels, pixel_count, motion_level, has_motion
        );

        MotionResult {
            has_motion,
            motion_level,
            changed_mask,
        }
    }

    /// Set the per-pixel change threshold, clamped to 5..=50
    pub fn set_sensitivity(&mut self, level: u8) {
        let clamped = level.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY);
        if clamped != level {
            debug!("Sensitivity {} clamped to {}", level, clamped);
        }
        self.sensitivity = clamped;
    }

    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Whether a reference frame is held for the next comparison
    pub fn has_reference(&self) -> bool {
        self.previous_frame.is_some()
    }

    /// Forget the stored reference frame
    pub fn reset(&mut self) {
        self.previous_frame = None;
    }
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::test_support::{paint_rect, solid_frame};

    #[test]
    fn test_first_frame_is_quiescent() {
        let mut detector = MotionDetector::default();
        let frame = solid_frame(1, 32, 32, (200, 10, 10));

        let result = detector.detect_motion(&frame);

        assert!(!result.has_motion);
        assert_eq!(result.motion_level, 0);
        assert!(detector.has_reference());
    }

    #[test]
    fn test_identical_frames_have_no_motion() {
        let mut detector = MotionDetector::default();
        let frame = solid_frame(1, 640, 480, (128, 128, 128));

        detector.detect_motion(&frame);
        let result = detector.detect_motion(&frame);

        assert!(!result.has_motion);
        assert_eq!(result.motion_level, 0);
        assert!(result.changed_mask.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_motion_level_matches_changed_fraction() {
        let mut detector = MotionDetector::default();
        let base = solid_frame(1, 100, 100, (0, 0, 0));
        // 300 of 10_000 pixels changed by 100 per channel
        let moved = paint_rect(&base, 0, 0, 30, 10, (100, 100, 100));

        detector.detect_motion(&base);
        let result = detector.detect_motion(&moved);

        let expected = ((300.0 / 10_000.0) * 5000.0f64).round().min(100.0) as u8;
        assert_eq!(result.motion_level, expected);
        assert!(result.has_motion);
        assert_eq!(
            result.changed_mask.iter().filter(|&&m| m == CHANGED).count(),
            300
        );
    }

    #[test]
    fn test_small_change_below_area_threshold() {
        let mut detector = MotionDetector::default();
        let base = solid_frame(1, 100, 100, (0, 0, 0));
        // 2% exactly is not above the area threshold
        let moved = paint_rect(&base, 0, 0, 20, 10, (255, 255, 255));

        detector.detect_motion(&base);
        let result = detector.detect_motion(&moved);

        assert!(!result.has_motion);
        assert_eq!(result.motion_level, 100);
    }

    #[test]
    fn test_change_at_threshold_is_ignored() {
        let mut detector = MotionDetector::default();
        let base = solid_frame(1, 10, 10, (100, 100, 100));
        let shifted = solid_frame(2, 10, 10, (115, 115, 115));

        detector.detect_motion(&base);
        let result = detector.detect_motion(&shifted);

        // diff == 15 is not strictly greater than the default threshold
        assert_eq!(result.motion_level, 0);
        assert!(!result.has_motion);
    }

    #[test]
    fn test_previous_frame_is_replaced() {
        let mut detector = MotionDetector::default();
        let black = solid_frame(1, 10, 10, (0, 0, 0));
        let white = solid_frame(2, 10, 10, (255, 255, 255));

        detector.detect_motion(&black);
        assert!(detector.detect_motion(&white).has_motion);
        // Reference is now the white frame
        assert!(!detector.detect_motion(&white).has_motion);
    }

    #[test]
    fn test_dimension_change_resets_reference() {
        let mut detector = MotionDetector::default();
        detector.detect_motion(&solid_frame(1, 10, 10, (0, 0, 0)));

        let result = detector.detect_motion(&solid_frame(2, 20, 20, (255, 255, 255)));
        assert!(!result.has_motion);
        assert_eq!(result.changed_mask.len(), 400);

        let result = detector.detect_motion(&solid_frame(3, 20, 20, (0, 0, 0)));
        assert!(result.has_motion);
    }

    #[test]
    fn test_sensitivity_clamping() {
        let mut detector = MotionDetector::new(1);
        assert_eq!(detector.sensitivity(), MIN_SENSITIVITY);

        detector.set_sensitivity(90);
        assert_eq!(detector.sensitivity(), MAX_SENSITIVITY);

        detector.set_sensitivity(30);
        assert_eq!(detector.sensitivity(), 30);
    }

    #[test]
    fn test_reset_forgets_reference() {
        let mut detector = MotionDetector::default();
        detector.detect_motion(&solid_frame(1, 10, 10, (0, 0, 0)));
        detector.reset();

        let result = detector.detect_motion(&solid_frame(2, 10, 10, (255, 255, 255)));
        assert!(!result.has_motion);
    }
}
