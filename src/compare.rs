//! Interactive colour compare.
//!
//! Keys: `q` quit, `c` toggle side-by-side compare, `s` save frame,
//! and on cameras with white-balance controls `a` toggle auto/manual white
//! balance and `g` cycle manual gain presets.
//!
//! The compare view puts the frame as captured next to the same bytes read
//! with the other channel order, which is what a consumer assuming the wrong
//! order would show.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::encode::save_png;
use crate::frame::{ChannelOrder, RgbFrame};
use crate::ingest::{ColourGains, FrameSource};
use crate::stats::{hint, ChannelStats};

/// Gain presets cycled by `g`. `None` leaves the gains alone.
pub const GAIN_PRESETS: [Option<ColourGains>; 6] = [
    None,
    Some(ColourGains::new(1.0, 1.0)),
    Some(ColourGains::new(1.5, 1.0)),
    Some(ColourGains::new(1.0, 1.5)),
    Some(ColourGains::new(2.0, 1.2)),
    Some(ColourGains::new(1.2, 2.0)),
];

#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue(Option<String>),
    Quit,
}

/// Composite frame plus the numbers the old overlay used to print.
#[derive(Debug)]
pub struct CompareView {
    pub composite: RgbFrame,
    pub left_label: &'static str,
    pub left_means: [f64; 3],
    pub right_label: Option<&'static str>,
    pub right_means: Option<[f64; 3]>,
    pub hint: Option<&'static str>,
}

impl CompareView {
    /// One-line status, e.g. `RGB means: [120, 118, 96] | BGR view means: [...]`.
    pub fn status_line(&self) -> String {
        let mut line = format_means(self.left_label, self.left_means);
        if let (Some(label), Some(means)) = (self.right_label, self.right_means) {
            line.push_str(" | ");
            line.push_str(&format_means(label, means));
        }
        if let Some(hint) = self.hint {
            line.push_str(" | ");
            line.push_str(hint);
        }
        line
    }
}

fn format_means(label: &str, means: [f64; 3]) -> String {
    format!(
        "{} means: [{:.0}, {:.0}, {:.0}]",
        label, means[0], means[1], means[2]
    )
}

pub struct CompareSession {
    out_dir: PathBuf,
    gain_controls: bool,
    compare: bool,
    manual_mode: bool,
    gains_idx: usize,
    saved_count: usize,
}

impl CompareSession {
    pub fn new(out_dir: impl Into<PathBuf>, gain_controls: bool) -> Self {
        Self {
            out_dir: out_dir.into(),
            gain_controls,
            compare: true,
            manual_mode: false,
            gains_idx: 0,
            saved_count: 0,
        }
    }

    pub fn key_help(&self) -> &'static str {
        if self.gain_controls {
            "Keys: q=quit, c=toggle compare, g=cycle gains, a=toggle auto/manual AWB, s=save frame"
        } else {
            "Keys: q=quit, c=toggle compare, s=save frame"
        }
    }

    pub fn is_comparing(&self) -> bool {
        self.compare
    }

    pub fn is_manual(&self) -> bool {
        self.manual_mode
    }

    pub fn current_preset(&self) -> Option<ColourGains> {
        GAIN_PRESETS[self.gains_idx]
    }

    pub fn render(&self, frame: &RgbFrame) -> Result<CompareView> {
        let left_label = frame.order.label();
        let left_means = ChannelStats::from_frame(frame).means_rgb;
        let hint = hint(left_means);
        if !self.compare {
            return Ok(CompareView {
                composite: frame.clone(),
                left_label,
                left_means,
                right_label: None,
                right_means: None,
                hint,
            });
        }

        let misread = frame.clone().relabel(frame.order.swapped());
        let right_means = ChannelStats::from_frame(&misread).means_rgb;
        Ok(CompareView {
            composite: RgbFrame::hstack(frame.clone(), misread)?,
            left_label,
            left_means,
            right_label: Some(match frame.order.swapped() {
                ChannelOrder::Bgr => "BGR view",
                ChannelOrder::Rgb => "RGB view",
            }),
            right_means: Some(right_means),
            hint,
        })
    }

    /// Apply one key press. `frame` is the most recent capture, used by `s`.
    pub fn handle_key(
        &mut self,
        key: char,
        source: &mut dyn FrameSource,
        frame: Option<&RgbFrame>,
    ) -> Result<KeyOutcome> {
        let message = match key {
            'q' => return Ok(KeyOutcome::Quit),
            'c' => {
                self.compare = !self.compare;
                None
            }
            's' => match frame {
                Some(frame) => Some(self.save(frame)?),
                None => Some("no frame captured yet".to_string()),
            },
            'a' if self.gain_controls => Some(self.toggle_manual(source)),
            'g' if self.gain_controls => self.cycle_gains(source),
            _ => None,
        };
        Ok(KeyOutcome::Continue(message))
    }

    fn save(&mut self, frame: &RgbFrame) -> Result<String> {
        let name = format!("frame_{}.png", self.saved_count);
        let path = self.out_dir.join(&name);
        save_png(&path, frame)?;
        if self.compare {
            let view = self.render(frame)?;
            save_png(
                &self.out_dir.join(format!("compare_{}.png", self.saved_count)),
                &view.composite,
            )?;
        }
        self.saved_count += 1;
        Ok(format!("Saved {}", display_name(&path)))
    }

    fn toggle_manual(&mut self, source: &mut dyn FrameSource) -> String {
        self.manual_mode = !self.manual_mode;
        if self.manual_mode {
            let preset = self.current_preset();
            let applied = source.set_auto_white_balance(false).and_then(|()| match preset {
                Some(gains) => source.set_colour_gains(gains),
                None => Ok(()),
            });
            match applied {
                Ok(()) => format!("Manual WB ON. Gains={}", preset_label(preset)),
                Err(err) => format!("Failed to disable AWB / set gains: {:#}", err),
            }
        } else {
            match source.set_auto_white_balance(true) {
                Ok(()) => "Auto WB ON".to_string(),
                Err(err) => format!("Failed to enable AWB: {:#}", err),
            }
        }
    }

    fn cycle_gains(&mut self, source: &mut dyn FrameSource) -> Option<String> {
        self.gains_idx = (self.gains_idx + 1) % GAIN_PRESETS.len();
        if !self.manual_mode {
            return None;
        }
        Some(match self.current_preset() {
            None => {
                "Leaving manual mode requires 'a' to re-enable AWB; staying manual.".to_string()
            }
            Some(gains) => match source.set_colour_gains(gains) {
                Ok(()) => format!("Manual gains set to {}", gains),
                Err(err) => format!("Failed to set ColourGains: {:#}", err),
            },
        })
    }
}

fn preset_label(preset: Option<ColourGains>) -> String {
    preset.map_or_else(|| "None".to_string(), |gains| gains.to_string())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
