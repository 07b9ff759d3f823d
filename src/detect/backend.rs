use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::RgbFrame;

/// Detector trait.
///
/// Detectors see each frame once and return a summary; they do not keep pixels.
pub trait Detector: Send {
    /// Detector identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &RgbFrame) -> Result<DetectionResult>;
}
