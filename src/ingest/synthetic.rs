//! Synthetic camera for `stub://` devices.
//!
//! Scenes:
//! - `stub://gray`: uniform mid gray
//! - `stub://blue`: cold cast, blue well above red and green
//! - `stub://red`: warm cast, red well above green and blue
//! - anything else: a moving gradient
//!
//! With auto white balance off, red and blue are scaled by the current colour
//! gains so gain sweeps behave like a real sensor.

use anyhow::{anyhow, Result};

use super::{CameraSettings, ColourGains, FrameSource};
use crate::frame::{ChannelOrder, RgbFrame};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scene {
    Gray,
    Blue,
    Red,
    Gradient,
}

impl Scene {
    fn from_device(device: &str) -> Self {
        match device.trim_start_matches("stub://") {
            "gray" | "grey" => Scene::Gray,
            "blue" => Scene::Blue,
            "red" => Scene::Red,
            _ => Scene::Gradient,
        }
    }
}

pub struct SyntheticSource {
    settings: CameraSettings,
    scene: Scene,
    connected: bool,
    controls: bool,
    awb: bool,
    gains: ColourGains,
    frame_count: u64,
}

impl SyntheticSource {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            scene: Scene::from_device(&settings.device),
            settings,
            connected: false,
            controls: true,
            awb: true,
            gains: ColourGains::new(1.0, 1.0),
            frame_count: 0,
        }
    }

    /// Behave like a webcam without white-balance or focus controls.
    pub fn without_controls(mut self) -> Self {
        self.controls = false;
        self
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    pub fn auto_white_balance(&self) -> bool {
        self.awb
    }

    pub fn colour_gains(&self) -> ColourGains {
        self.gains
    }

    fn base_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        match self.scene {
            Scene::Gray => [128, 128, 128],
            Scene::Blue => [60, 70, 150],
            Scene::Red => [170, 90, 80],
            Scene::Gradient => {
                let w = self.settings.width.max(1) as u64;
                let h = self.settings.height.max(1) as u64;
                let r = (x as u64 * 255 / w) as u8;
                let g = (y as u64 * 255 / h) as u8;
                let b = ((self.frame_count * 4 + x as u64) % 256) as u8;
                [r, g, b]
            }
        }
    }

    fn render(&self) -> Vec<u8> {
        let (width, height) = (self.settings.width, self.settings.height);
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for y in 0..height {
            for x in 0..width {
                let [r, g, b] = self.base_pixel(x, y);
                if self.awb {
                    data.extend_from_slice(&[r, g, b]);
                } else {
                    data.extend_from_slice(&[
                        scale(r, self.gains.red),
                        g,
                        scale(b, self.gains.blue),
                    ]);
                }
            }
        }
        data
    }

    fn require_controls(&self, what: &str) -> Result<()> {
        if self.controls {
            Ok(())
        } else {
            Err(anyhow!("{} control not available on {}", what, self.settings.device))
        }
    }
}

fn scale(value: u8, gain: f32) -> u8 {
    (value as f32 * gain).round().clamp(0.0, 255.0) as u8
}

impl FrameSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.settings.device
    }

    fn backend(&self) -> &'static str {
        "synthetic"
    }

    fn connect(&mut self) -> Result<()> {
        if self.settings.width == 0 || self.settings.height == 0 {
            return Err(anyhow!("frame size must be non-zero"));
        }
        self.connected = true;
        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            self.settings.device,
            self.settings.width,
            self.settings.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RgbFrame> {
        if !self.connected {
            return Err(anyhow!("synthetic camera not connected"));
        }
        self.frame_count += 1;
        RgbFrame::new(
            self.render(),
            self.settings.width,
            self.settings.height,
            ChannelOrder::Rgb,
        )
    }

    fn set_auto_white_balance(&mut self, enabled: bool) -> Result<()> {
        self.require_controls("AwbEnable")?;
        self.awb = enabled;
        Ok(())
    }

    fn set_colour_gains(&mut self, gains: ColourGains) -> Result<()> {
        self.require_controls("ColourGains")?;
        self.gains = gains;
        Ok(())
    }

    fn set_continuous_autofocus(&mut self) -> Result<()> {
        self.require_controls("AfMode")
    }

    fn supports_colour_gains(&self) -> bool {
        self.controls
    }
}
