//! Frame acquisition.
//!
//! This module provides the camera sources frames come from:
//! - USB/CSI V4L2 devices (feature: ingest-v4l2)
//! - Synthetic scenes behind `stub://` device names (tests, demos)
//!
//! Every source hands out `RgbFrame`s in RGB order. Controls that a given
//! sensor may not have (autofocus, white balance, colour gains) return an
//! error; callers that treat them as optional go through `best_effort`.

mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::frame::{Flips, RgbFrame};

pub use normalize::{normalize_to_rgb, PixelFormat};
pub use synthetic::SyntheticSource;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Source;

/// Manual white-balance gains: red and blue multipliers relative to green.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColourGains {
    pub red: f32,
    pub blue: f32,
}

impl ColourGains {
    pub const fn new(red: f32, blue: f32) -> Self {
        Self { red, blue }
    }
}

impl std::fmt::Display for ColourGains {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.red, self.blue)
    }
}

/// A camera that produces RGB frames.
pub trait FrameSource {
    /// Device name this source was opened with.
    fn name(&self) -> &str;

    /// Backend label used in reports ("v4l2" or "synthetic").
    fn backend(&self) -> &'static str;

    /// Open the device and negotiate size and pixel format.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame, converted to RGB order.
    fn next_frame(&mut self) -> Result<RgbFrame>;

    fn set_auto_white_balance(&mut self, enabled: bool) -> Result<()>;

    fn set_colour_gains(&mut self, gains: ColourGains) -> Result<()>;

    fn set_continuous_autofocus(&mut self) -> Result<()>;

    /// Whether manual colour gains can be applied.
    fn supports_colour_gains(&self) -> bool;
}

/// Camera parameters read once at startup.
#[derive(Clone, Debug)]
pub struct CameraSettings {
    /// Device path (e.g., "/dev/video0") or `stub://<scene>`.
    pub device: String,
    pub width: u32,
    pub height: u32,
    /// Sleep after starting the sensor so exposure and AWB settle.
    pub warmup: Duration,
    /// Request continuous autofocus (ignored by fixed-focus sensors).
    pub autofocus: bool,
    pub flips: Flips,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 1280,
            height: 720,
            warmup: Duration::from_millis(300),
            autofocus: true,
            flips: Flips::default(),
        }
    }
}

/// Build the source for `settings.device` without connecting it.
pub fn create_source(settings: &CameraSettings) -> Result<Box<dyn FrameSource + Send>> {
    if settings.device.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(settings.clone())));
    }
    create_device_source(settings)
}

#[cfg(feature = "ingest-v4l2")]
fn create_device_source(settings: &CameraSettings) -> Result<Box<dyn FrameSource + Send>> {
    Ok(Box::new(V4l2Source::new(settings.clone())))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn create_device_source(settings: &CameraSettings) -> Result<Box<dyn FrameSource + Send>> {
    Err(anyhow!(
        "camera device {} requires the ingest-v4l2 feature (use stub://<scene> for a synthetic camera)",
        settings.device
    ))
}

/// Create, connect and warm up a camera.
pub fn open_camera(settings: &CameraSettings) -> Result<Box<dyn FrameSource + Send>> {
    let mut source = create_source(settings)?;
    source
        .connect()
        .map_err(|e| anyhow!("camera {} not available: {:#}", settings.device, e))?;
    if settings.autofocus {
        best_effort(source.set_continuous_autofocus(), "continuous autofocus");
    }
    if !settings.warmup.is_zero() {
        std::thread::sleep(settings.warmup);
    }
    log::info!(
        "camera {} ready ({} backend, {}x{})",
        source.name(),
        source.backend(),
        settings.width,
        settings.height
    );
    Ok(source)
}

/// Capture one frame and apply the configured flips.
pub fn capture(source: &mut dyn FrameSource, flips: Flips) -> Result<RgbFrame> {
    Ok(source.next_frame()?.apply_flips(flips))
}

/// Swallow the error of an optional camera control.
pub fn best_effort(result: Result<()>, what: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            log::debug!("{} not supported on this camera: {:#}", what, err);
            false
        }
    }
}
