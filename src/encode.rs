//! Still-image encoding for frames.
//!
//! Encoders always receive true RGB, so a frame stored as BGR is converted
//! first and a frame that was only relabeled shows its swapped colors.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

use crate::frame::RgbFrame;

pub fn encode_jpeg(frame: &RgbFrame, quality: u8) -> Result<Vec<u8>> {
    let img = frame.to_rgb_image()?;
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.encode_image(&img).context("encode jpeg")?;
    Ok(bytes)
}

pub fn encode_png(frame: &RgbFrame) -> Result<Vec<u8>> {
    let img = frame.to_rgb_image()?;
    let mut cursor = Cursor::new(Vec::new());
    img.write_to(&mut cursor, ImageFormat::Png)
        .context("encode png")?;
    Ok(cursor.into_inner())
}

pub fn save_png(path: &Path, frame: &RgbFrame) -> Result<()> {
    let bytes = encode_png(frame)?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

pub fn save_jpeg(path: &Path, frame: &RgbFrame, quality: u8) -> Result<()> {
    let bytes = encode_jpeg(frame, quality)?;
    std::fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

/// Save as PNG or JPEG depending on the file extension (JPEG otherwise).
pub fn save_image(path: &Path, frame: &RgbFrame, jpeg_quality: u8) -> Result<()> {
    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        save_png(path, frame)
    } else {
        save_jpeg(path, frame, jpeg_quality)
    }
}
