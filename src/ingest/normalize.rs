use anyhow::{anyhow, Context, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb24,
    Bgr24,
    Yuyv,
    Nv12,
    Mjpeg,
}

impl PixelFormat {
    pub fn fourcc(self) -> &'static [u8; 4] {
        match self {
            PixelFormat::Rgb24 => b"RGB3",
            PixelFormat::Bgr24 => b"BGR3",
            PixelFormat::Yuyv => b"YUYV",
            PixelFormat::Nv12 => b"NV12",
            PixelFormat::Mjpeg => b"MJPG",
        }
    }

    pub fn from_fourcc(code: &[u8; 4]) -> Option<Self> {
        match code {
            b"RGB3" => Some(PixelFormat::Rgb24),
            b"BGR3" => Some(PixelFormat::Bgr24),
            b"YUYV" => Some(PixelFormat::Yuyv),
            b"NV12" => Some(PixelFormat::Nv12),
            b"MJPG" => Some(PixelFormat::Mjpeg),
            _ => None,
        }
    }

    /// Exact payload size for uncompressed formats.
    pub fn frame_bytes(self, width: u32, height: u32) -> Option<usize> {
        let pixels = (width as usize).checked_mul(height as usize)?;
        match self {
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => pixels.checked_mul(3),
            PixelFormat::Yuyv => pixels.checked_mul(2),
            PixelFormat::Nv12 => pixels.checked_add(pixels / 2),
            PixelFormat::Mjpeg => None,
        }
    }
}

/// Convert a driver buffer into packed RGB24.
pub fn normalize_to_rgb(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Result<Vec<u8>> {
    if format == PixelFormat::Mjpeg {
        return decode_mjpeg(pixels, width, height);
    }
    let expected = format
        .frame_bytes(width, height)
        .ok_or_else(|| anyhow!("{:?} frame dimensions overflow", format))?;
    if pixels.len() != expected {
        return Err(anyhow!(
            "{:?} frame length mismatch: expected {}, got {}",
            format,
            expected,
            pixels.len()
        ));
    }
    match format {
        PixelFormat::Rgb24 => Ok(pixels.to_vec()),
        PixelFormat::Bgr24 => Ok(pixels
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect()),
        PixelFormat::Yuyv => Ok(yuyv_to_rgb(pixels)),
        PixelFormat::Nv12 => Ok(nv12_to_rgb(pixels, width, height)),
        PixelFormat::Mjpeg => unreachable!("handled above"),
    }
}

fn decode_mjpeg(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(pixels, image::ImageFormat::Jpeg)
        .context("decode MJPEG frame")?
        .to_rgb8();
    if img.width() != width || img.height() != height {
        return Err(anyhow!(
            "MJPEG frame is {}x{}, expected {}x{}",
            img.width(),
            img.height(),
            width,
            height
        ));
    }
    Ok(img.into_raw())
}

fn yuyv_to_rgb(pixels: &[u8]) -> Vec<u8> {
    // [Y0 U Y1 V] covers two pixels sharing U and V.
    let mut rgb = Vec::with_capacity(pixels.len() / 2 * 3);
    for quad in pixels.chunks_exact(4) {
        let u = quad[1] as f32 - 128.0;
        let v = quad[3] as f32 - 128.0;
        for y in [quad[0], quad[2]] {
            rgb.extend_from_slice(&yuv_to_rgb(y as f32, u, v));
        }
    }
    rgb
}

fn nv12_to_rgb(pixels: &[u8], width: u32, height: u32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let y_plane = w * h;

    let mut rgb = vec![0u8; y_plane * 3];
    for j in 0..h {
        for i in 0..w {
            let y = pixels[j * w + i] as f32;
            let uv_index = y_plane + (j / 2) * w + (i / 2) * 2;
            let u = pixels[uv_index] as f32 - 128.0;
            let v = pixels[uv_index + 1] as f32 - 128.0;

            let offset = (j * w + i) * 3;
            rgb[offset..offset + 3].copy_from_slice(&yuv_to_rgb(y, u, v));
        }
    }
    rgb
}

/// ITU-R BT.601 with chroma already centered on zero.
fn yuv_to_rgb(y: f32, u: f32, v: f32) -> [u8; 3] {
    let r = y + 1.402_f32 * v;
    let g = y - 0.344_136_f32 * u - 0.714_136_f32 * v;
    let b = y + 1.772_f32 * u;
    [clamp_to_u8(r), clamp_to_u8(g), clamp_to_u8(b)]
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nv12_conversion_produces_gray() -> Result<()> {
        let y_plane = vec![128u8; 4];
        let uv_plane = vec![128u8; 2];
        let nv12 = [y_plane, uv_plane].concat();

        let rgb = normalize_to_rgb(&nv12, 2, 2, PixelFormat::Nv12)?;
        assert_eq!(rgb, vec![128u8; 12]);

        Ok(())
    }

    #[test]
    fn yuyv_conversion_produces_gray() -> Result<()> {
        let yuyv = vec![200u8, 128, 200, 128];
        let rgb = normalize_to_rgb(&yuyv, 2, 1, PixelFormat::Yuyv)?;
        assert_eq!(rgb, vec![200u8; 6]);
        Ok(())
    }

    #[test]
    fn bgr_is_swapped_to_rgb() -> Result<()> {
        let rgb = normalize_to_rgb(&[1, 2, 3], 1, 1, PixelFormat::Bgr24)?;
        assert_eq!(rgb, vec![3, 2, 1]);
        Ok(())
    }

    #[test]
    fn rgb_pass_through_validates_length() -> Result<()> {
        let pixels = vec![1u8; 9];
        let rgb = normalize_to_rgb(&pixels, 1, 3, PixelFormat::Rgb24)?;
        assert_eq!(rgb, pixels);
        assert!(normalize_to_rgb(&pixels, 2, 3, PixelFormat::Rgb24).is_err());
        Ok(())
    }

    #[test]
    fn fourcc_round_trips() {
        for format in [PixelFormat::Rgb24, PixelFormat::Yuyv, PixelFormat::Mjpeg] {
            assert_eq!(PixelFormat::from_fourcc(format.fourcc()), Some(format));
        }
    }
}
