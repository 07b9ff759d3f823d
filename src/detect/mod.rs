mod backend;
mod color;
mod result;

pub use backend::Detector;
pub use color::{rgb_to_hsv, ColorDetector, ColorTarget, MIN_BLOB_SIDE};
pub use result::{BoundingBox, DetectionResult};
