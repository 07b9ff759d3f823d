//! V4L2 camera source.
//!
//! This module provides `V4l2Source` for capturing from local V4L2 device
//! nodes (e.g., /dev/video0, or the libcamera V4L2 compatibility node on a Pi).
//!
//! The source is responsible for:
//! - Negotiating size and a pixel format it can convert (RGB3, YUYV, MJPG)
//! - Capturing frames into memory via mmap streaming
//! - Converting every frame to RGB24
//! - Mapping white-balance and focus requests onto V4L2 controls

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;
use v4l::control::{Control, Value};

use super::{normalize_to_rgb, CameraSettings, ColourGains, FrameSource, PixelFormat};
use crate::frame::{ChannelOrder, RgbFrame};

const CID_AUTO_WHITE_BALANCE: u32 = 0x0098_090c;
const CID_RED_BALANCE: u32 = 0x0098_090e;
const CID_BLUE_BALANCE: u32 = 0x0098_090f;
const CID_FOCUS_AUTO: u32 = 0x009a_090c;

/// Preferred capture formats, cheapest conversion first.
const FORMAT_PREFERENCE: [PixelFormat; 3] =
    [PixelFormat::Rgb24, PixelFormat::Yuyv, PixelFormat::Mjpeg];

/// Balance controls take integer gains; 1000 means unity.
const BALANCE_SCALE: f32 = 1000.0;

pub struct V4l2Source {
    settings: CameraSettings,
    state: Option<V4l2State>,
    /// Second handle for controls; the stream keeps the first one borrowed.
    controls: Option<v4l::Device>,
    format: PixelFormat,
    active_width: u32,
    active_height: u32,
    frame_count: u64,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            active_width: settings.width,
            active_height: settings.height,
            settings,
            state: None,
            controls: None,
            format: PixelFormat::Rgb24,
            frame_count: 0,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn negotiate_format(&mut self, device: &mut v4l::Device) -> Result<()> {
        use v4l::video::Capture;

        for candidate in FORMAT_PREFERENCE {
            let mut format = device.format().context("read v4l2 format")?;
            format.width = self.settings.width;
            format.height = self.settings.height;
            format.fourcc = v4l::FourCC::new(candidate.fourcc());
            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::debug!(
                        "V4l2Source: {} rejected {:?}: {}",
                        self.settings.device,
                        candidate,
                        err
                    );
                    continue;
                }
            };
            if let Some(actual) = PixelFormat::from_fourcc(&format.fourcc.repr) {
                self.format = actual;
                self.active_width = format.width;
                self.active_height = format.height;
                return Ok(());
            }
        }
        Err(anyhow!(
            "{} offers no supported pixel format (RGB3, YUYV, MJPG)",
            self.settings.device
        ))
    }

    fn set_control(&self, id: u32, value: Value) -> Result<()> {
        let device = self
            .controls
            .as_ref()
            .context("v4l2 device not connected")?;
        device
            .set_control(Control { id, value })
            .with_context(|| format!("set v4l2 control {:#010x}", id))
    }
}

impl FrameSource for V4l2Source {
    fn name(&self) -> &str {
        &self.settings.device
    }

    fn backend(&self) -> &'static str {
        "v4l2"
    }

    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;

        let mut device = v4l::Device::with_path(&self.settings.device)
            .with_context(|| format!("open v4l2 device {}", self.settings.device))?;
        self.negotiate_format(&mut device)?;
        self.controls = v4l::Device::with_path(&self.settings.device).ok();

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        if self.active_width != self.settings.width || self.active_height != self.settings.height
        {
            log::warn!(
                "V4l2Source: {} delivers {}x{} instead of {}x{}",
                self.settings.device,
                self.active_width,
                self.active_height,
                self.settings.width,
                self.settings.height
            );
        }
        log::info!(
            "V4l2Source: connected to {} ({}x{} {:?})",
            self.settings.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<RgbFrame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let buf = state
            .with_mut(|fields| fields.stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;
        if buf.is_empty() {
            return Err(anyhow!("{} returned an empty frame", self.settings.device));
        }

        let payload = match self.format.frame_bytes(self.active_width, self.active_height) {
            Some(len) if buf.len() > len => &buf[..len],
            _ => &buf[..],
        };
        let rgb = normalize_to_rgb(payload, self.active_width, self.active_height, self.format)?;
        self.frame_count += 1;
        RgbFrame::new(rgb, self.active_width, self.active_height, ChannelOrder::Rgb)
    }

    fn set_auto_white_balance(&mut self, enabled: bool) -> Result<()> {
        self.set_control(CID_AUTO_WHITE_BALANCE, Value::Boolean(enabled))
    }

    fn set_colour_gains(&mut self, gains: ColourGains) -> Result<()> {
        self.set_control(
            CID_RED_BALANCE,
            Value::Integer((gains.red * BALANCE_SCALE).round() as i64),
        )?;
        self.set_control(
            CID_BLUE_BALANCE,
            Value::Integer((gains.blue * BALANCE_SCALE).round() as i64),
        )
    }

    fn set_continuous_autofocus(&mut self) -> Result<()> {
        self.set_control(CID_FOCUS_AUTO, Value::Boolean(true))
    }

    fn supports_colour_gains(&self) -> bool {
        let Some(device) = self.controls.as_ref() else {
            return false;
        };
        let Ok(controls) = device.query_controls() else {
            return false;
        };
        let ids: Vec<u32> = controls.iter().map(|c| c.id).collect();
        ids.contains(&CID_RED_BALANCE) && ids.contains(&CID_BLUE_BALANCE)
    }
}
