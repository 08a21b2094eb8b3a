use crate::frame::Frame;
use serde::Serialize;
use tracing::debug;

const CONTRAST_THRESHOLD: f64 = 30.0;
const BRIGHTNESS_THRESHOLD: f64 = 50.0;
/// Contrast at which confidence saturates
const CONTRAST_FULL_SCALE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectResult {
    pub detected: bool,
    /// 0..=100
    pub confidence: f64,
    /// Mean grey level
    pub brightness: f64,
    /// Population standard deviation of the grey level
    pub contrast: f64,
}

/// Stateless brightness/contrast heuristic for "something is in view"
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectContrastDetector;

impl ObjectContrastDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect_objects(&self, frame: &Frame) -> ObjectResult {
        let grey: Vec<f64> = frame
            .pixels()
            .map(|p| (p[0] as f64 + p[1] as f64 + p[2] as f64) / 3.0)
            .collect();

        if grey.is_empty() {
            return ObjectResult {
                detected: false,
                confidence: 0.0,
                brightness: 0.0,
                contrast: 0.0,
            };
        }

        let count = grey.len() as f64;
        let brightness = grey.iter().sum::<f64>() / count;
        let variance = grey
            .iter()
            .map(|g| (g - brightness).powi(2))
            .sum::<f64>()
            / count;
        let contrast = variance.sqrt();

        let detected = contrast > CONTRAST_THRESHOLD && brightness > BRIGHTNESS_THRESHOLD;
        let confidence = (contrast / CONTRAST_FULL_SCALE * 100.0).min(100.0);

        debug!(
            "Frame {}: brightness {:.2}, contrast {:.2}, object {}",
            frame.id, brightness, contrast, detected
        );

        ObjectResult {
            detected,
            confidence,
            brightness,
            contrast,
        }
    }
}
