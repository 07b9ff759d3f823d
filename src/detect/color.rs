//! Colour target detection.
//!
//! Pixels are converted to HSV with 8-bit scaling (H in 0..=180, S and V in
//! 0..=255), thresholded against the target's hue band, and grouped into
//! 4-connected blobs. Blobs smaller than `MIN_BLOB_SIDE` on either side are
//! treated as noise.

use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

use crate::detect::backend::Detector;
use crate::detect::result::{BoundingBox, DetectionResult};
use crate::frame::RgbFrame;

/// Minimum blob width and height, in pixels.
pub const MIN_BLOB_SIDE: u32 = 8;

const MIN_SATURATION: u8 = 60;
const MIN_VALUE: u8 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorTarget {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl ColorTarget {
    pub const ALL: [ColorTarget; 6] = [
        ColorTarget::Red,
        ColorTarget::Orange,
        ColorTarget::Yellow,
        ColorTarget::Green,
        ColorTarget::Blue,
        ColorTarget::Purple,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorTarget::Red => "red",
            ColorTarget::Orange => "orange",
            ColorTarget::Yellow => "yellow",
            ColorTarget::Green => "green",
            ColorTarget::Blue => "blue",
            ColorTarget::Purple => "purple",
        }
    }

    /// Inclusive hue bands on the 0..=180 scale. Red wraps around zero.
    fn hue_bands(self) -> &'static [(u8, u8)] {
        match self {
            ColorTarget::Red => &[(0, 4), (165, 180)],
            ColorTarget::Orange => &[(5, 18)],
            ColorTarget::Yellow => &[(22, 37)],
            ColorTarget::Green => &[(42, 85)],
            ColorTarget::Blue => &[(92, 110)],
            ColorTarget::Purple => &[(115, 165)],
        }
    }

    pub fn matches(self, rgb: [u8; 3]) -> bool {
        let [h, s, v] = rgb_to_hsv(rgb);
        s >= MIN_SATURATION
            && v >= MIN_VALUE
            && self
                .hue_bands()
                .iter()
                .any(|&(lo, hi)| (lo..=hi).contains(&h))
    }
}

impl fmt::Display for ColorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorTarget {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        ColorTarget::ALL
            .into_iter()
            .find(|target| target.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow!("unknown color '{}'", s))
    }
}

/// RGB to 8-bit HSV (H halved into 0..=180).
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let diff = max - min;

    let s = if max > 0.0 { diff / max * 255.0 } else { 0.0 };
    let mut h = if diff == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / diff
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / diff
    } else {
        240.0 + 60.0 * (rf - gf) / diff
    };
    if h < 0.0 {
        h += 360.0;
    }
    [
        (h / 2.0).round().clamp(0.0, 180.0) as u8,
        s.round().clamp(0.0, 255.0) as u8,
        max as u8,
    ]
}

pub struct ColorDetector {
    target: ColorTarget,
}

impl ColorDetector {
    pub fn new(target: ColorTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> ColorTarget {
        self.target
    }

    pub fn set_target(&mut self, target: ColorTarget) {
        self.target = target;
    }

    fn mask(&self, frame: &RgbFrame) -> Vec<bool> {
        let mut mask = Vec::with_capacity(frame.pixel_count());
        for y in 0..frame.height {
            for x in 0..frame.width {
                let hit = frame
                    .rgb_at(x, y)
                    .is_some_and(|rgb| self.target.matches(rgb));
                mask.push(hit);
            }
        }
        mask
    }
}

impl Detector for ColorDetector {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(&mut self, frame: &RgbFrame) -> Result<DetectionResult> {
        let mask = self.mask(frame);
        let blobs = label_blobs(&mask, frame.width, frame.height);
        let kept: Vec<BoundingBox> = blobs
            .into_iter()
            .filter(|bbox| bbox.w >= MIN_BLOB_SIDE && bbox.h >= MIN_BLOB_SIDE)
            .collect();
        let largest = kept.iter().copied().max_by_key(|bbox| bbox.area());
        Ok(DetectionResult {
            count: kept.len(),
            largest,
        })
    }
}

/// Bounding boxes of the 4-connected components of `mask`.
fn label_blobs(mask: &[bool], width: u32, height: u32) -> Vec<BoundingBox> {
    let w = width as usize;
    let h = height as usize;
    let mut seen = vec![false; mask.len()];
    let mut blobs = Vec::new();
    let mut stack = Vec::new();

    for start in 0..mask.len() {
        if !mask[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        stack.push(start);
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);

        while let Some(idx) = stack.pop() {
            let (x, y) = (idx % w, idx / w);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            let mut visit = |n: usize| {
                if mask[n] && !seen[n] {
                    seen[n] = true;
                    stack.push(n);
                }
            };
            if x > 0 {
                visit(idx - 1);
            }
            if x + 1 < w {
                visit(idx + 1);
            }
            if y > 0 {
                visit(idx - w);
            }
            if y + 1 < h {
                visit(idx + w);
            }
        }

        blobs.push(BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            w: (max_x - min_x + 1) as u32,
            h: (max_y - min_y + 1) as u32,
        });
    }
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ChannelOrder;

    fn scene_with_patch(
        width: u32,
        height: u32,
        patch: (u32, u32, u32, u32),
        color: [u8; 3],
    ) -> RgbFrame {
        let (px, py, pw, ph) = patch;
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let inside = x >= px && x < px + pw && y >= py && y < py + ph;
                data.extend_from_slice(if inside { &color } else { &[128, 128, 128] });
            }
        }
        RgbFrame::new(data, width, height, ChannelOrder::Rgb).unwrap()
    }

    #[test]
    fn hsv_matches_eight_bit_convention() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([128, 128, 128]), [0, 0, 128]);
    }

    #[test]
    fn colors_parse_case_insensitively() {
        assert_eq!("Blue".parse::<ColorTarget>().unwrap(), ColorTarget::Blue);
        assert!("teal".parse::<ColorTarget>().is_err());
    }

    #[test]
    fn gray_never_matches() {
        for target in ColorTarget::ALL {
            assert!(!target.matches([128, 128, 128]));
        }
    }

    #[test]
    fn finds_large_blue_patch() -> Result<()> {
        let frame = scene_with_patch(200, 60, (40, 10, 120, 30), [0, 100, 255]);
        let mut detector = ColorDetector::new(ColorTarget::Blue);
        let result = detector.detect(&frame)?;
        assert_eq!(result.count, 1);
        assert_eq!(
            result.largest,
            Some(BoundingBox {
                x: 40,
                y: 10,
                w: 120,
                h: 30
            })
        );
        assert!(result.is_target_reached(100));
        Ok(())
    }

    #[test]
    fn ignores_other_colors_and_specks() -> Result<()> {
        let frame = scene_with_patch(64, 64, (4, 4, 30, 30), [255, 0, 0]);
        let mut detector = ColorDetector::new(ColorTarget::Green);
        assert_eq!(detector.detect(&frame)?.count, 0);

        let speck = scene_with_patch(64, 64, (4, 4, 3, 3), [255, 0, 0]);
        detector.set_target(ColorTarget::Red);
        let result = detector.detect(&speck)?;
        assert_eq!(result.count, 0);
        assert!(!result.is_target_reached(0));
        Ok(())
    }

    #[test]
    fn small_target_is_not_reached() -> Result<()> {
        let frame = scene_with_patch(200, 60, (10, 10, 40, 20), [255, 0, 0]);
        let result = ColorDetector::new(ColorTarget::Red).detect(&frame)?;
        assert_eq!(result.count, 1);
        assert_eq!(result.width(), 40);
        assert!(!result.is_target_reached(100));
        Ok(())
    }
}
