//! In-memory camera frames.
//!
//! - `RgbFrame`: three-channel, row-major pixel buffer with an explicit channel order.
//! - `ChannelOrder`: which byte of each pixel holds red (RGB) or blue (BGR).
//! - `Flips`: vertical/horizontal flip flags read once at startup.
//!
//! Camera drivers and encoders disagree about channel order. Frames carry their
//! order so conversions happen exactly once, right before a consumer needs them.

use anyhow::{anyhow, Result};
use image::{imageops, imageops::FilterType, RgbImage};

/// Bytes per pixel for every frame in this crate.
pub const CHANNELS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    pub fn swapped(self) -> Self {
        match self {
            ChannelOrder::Rgb => ChannelOrder::Bgr,
            ChannelOrder::Bgr => ChannelOrder::Rgb,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChannelOrder::Rgb => "RGB",
            ChannelOrder::Bgr => "BGR",
        }
    }
}

/// Flip flags applied to every captured frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flips {
    pub vflip: bool,
    pub hflip: bool,
}

// ----------------------------------------------------------------------------
// RgbFrame
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub order: ChannelOrder,
}

impl RgbFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, order: ChannelOrder) -> Result<Self> {
        let expected = frame_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            order,
        })
    }

    /// Uniform frame in RGB order.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * CHANNELS);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }
        Self {
            data,
            width,
            height,
            order: ChannelOrder::Rgb,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Raw pixel at (x, y) in storage order.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * CHANNELS;
        let px = self.data.get(offset..offset + CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Pixel at (x, y) as (r, g, b) regardless of storage order.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let [a, b, c] = self.pixel(x, y)?;
        Some(match self.order {
            ChannelOrder::Rgb => [a, b, c],
            ChannelOrder::Bgr => [c, b, a],
        })
    }

    /// Swap channel 0 and channel 2 of every pixel. Applying it twice is a no-op.
    pub fn swap_red_blue(mut self) -> Self {
        for px in self.data.chunks_exact_mut(CHANNELS) {
            px.swap(0, 2);
        }
        self.order = self.order.swapped();
        self
    }

    /// Convert to `order`, moving bytes only when the orders differ.
    pub fn to_order(self, order: ChannelOrder) -> Self {
        if self.order == order {
            self
        } else {
            self.swap_red_blue()
        }
    }

    /// Reinterpret the bytes as `order` without touching them.
    ///
    /// This is what a consumer that assumes the wrong channel order sees.
    pub fn relabel(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }

    pub fn flip_vertical(mut self) -> Self {
        let row = self.width as usize * CHANNELS;
        let rows = self.height as usize;
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (head, tail) = self.data.split_at_mut(bottom * row);
            head[top * row..(top + 1) * row].swap_with_slice(&mut tail[..row]);
        }
        self
    }

    pub fn flip_horizontal(mut self) -> Self {
        let row = self.width as usize * CHANNELS;
        if row == 0 {
            return self;
        }
        for line in self.data.chunks_exact_mut(row) {
            let w = line.len() / CHANNELS;
            for left in 0..w / 2 {
                let right = w - 1 - left;
                for c in 0..CHANNELS {
                    line.swap(left * CHANNELS + c, right * CHANNELS + c);
                }
            }
        }
        self
    }

    pub fn apply_flips(self, flips: Flips) -> Self {
        let frame = if flips.vflip { self.flip_vertical() } else { self };
        if flips.hflip {
            frame.flip_horizontal()
        } else {
            frame
        }
    }

    /// Resize to `height` rows keeping the aspect ratio. Channel order is preserved.
    pub fn resize_to_height(self, height: u32) -> Result<Self> {
        if height == self.height {
            return Ok(self);
        }
        if self.height == 0 || height == 0 {
            return Err(anyhow!("cannot resize an empty frame"));
        }
        let width = ((self.width as u64 * height as u64) / self.height as u64).max(1) as u32;
        let order = self.order;
        // Stored bytes go through untouched; the label is restored afterwards.
        let img = RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;
        let resized = imageops::resize(&img, width, height, FilterType::Triangle);
        RgbFrame::new(resized.into_raw(), width, height, order)
    }

    /// Place `left` and `right` side by side, both scaled to the smaller height.
    ///
    /// The result takes the channel order of `left`; `right` is converted to it,
    /// so both halves keep their colours.
    pub fn hstack(left: RgbFrame, right: RgbFrame) -> Result<Self> {
        let height = left.height.min(right.height);
        let order = left.order;
        let left = left.resize_to_height(height)?;
        let right = right.to_order(order).resize_to_height(height)?;
        let width = left.width + right.width;
        let left_row = left.width as usize * CHANNELS;
        let right_row = right.width as usize * CHANNELS;
        let mut data = Vec::with_capacity(frame_len(width, height)?);
        for y in 0..height as usize {
            data.extend_from_slice(&left.data[y * left_row..(y + 1) * left_row]);
            data.extend_from_slice(&right.data[y * right_row..(y + 1) * right_row]);
        }
        RgbFrame::new(data, width, height, order)
    }

    /// True-color `image::RgbImage`.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let rgb = self.clone().to_order(ChannelOrder::Rgb);
        RgbImage::from_raw(rgb.width, rgb.height, rgb.data)
            .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))
    }
}

pub(crate) fn frame_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(CHANNELS))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
