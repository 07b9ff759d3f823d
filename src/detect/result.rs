/// Result of running detection on a frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionResult {
    /// Number of blobs large enough to count.
    pub count: usize,
    /// Bounding box of the largest blob, in pixels.
    pub largest: Option<BoundingBox>,
}

impl DetectionResult {
    /// Width of the largest blob, 0 when nothing was found.
    pub fn width(&self) -> u32 {
        self.largest.map_or(0, |bbox| bbox.w)
    }

    /// A target counts as reached once it fills more than `min_width` pixels across.
    pub fn is_target_reached(&self, min_width: u32) -> bool {
        self.count != 0 && self.width() > min_width
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
}
