//! Headless camera colour diagnostic.
//!
//! Captures one frame with auto white balance, then (when the camera has
//! white-balance controls) one frame per manual colour-gain preset. Every
//! capture is saved as PNG next to `summary.json` and `summary.txt` in a
//! timestamped directory, so the results can be copied off a headless Pi.

mod report;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::encode::save_png;
use crate::frame::{Flips, RgbFrame};
use crate::ingest::{best_effort, capture, ColourGains, FrameSource};
use crate::stats::{verdict, ChannelStats};

pub use report::render_text;

pub const DEFAULT_OUT_BASE: &str = "diag_out";
pub const AUTO_FILE: &str = "auto_bgr.png";
pub const SUMMARY_JSON: &str = "summary.json";
pub const SUMMARY_TXT: &str = "summary.txt";

/// Manual gain presets (red, blue) captured with AWB off.
pub const GAIN_SWEEP: [ColourGains; 5] = [
    ColourGains::new(1.0, 1.0),
    ColourGains::new(1.5, 1.0),
    ColourGains::new(2.0, 1.2),
    ColourGains::new(1.0, 1.5),
    ColourGains::new(1.2, 2.0),
];

#[derive(Clone, Debug)]
pub struct DiagOptions {
    pub width: u32,
    pub height: u32,
    pub flips: Flips,
    pub sweep: bool,
    /// Settle time after changing white-balance controls.
    pub settle: Duration,
}

impl Default for DiagOptions {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            flips: Flips::default(),
            sweep: true,
            settle: Duration::from_millis(500),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    /// (red gain, blue gain)
    pub gains: (f32, f32),
    pub stats: ChannelStats,
    pub verdict: String,
    pub file: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagSummary {
    pub backend: String,
    pub width: u32,
    pub height: u32,
    pub vflip: bool,
    pub hflip: bool,
    pub auto_stats: ChannelStats,
    pub auto_verdict: String,
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_sweep: Option<Vec<SweepResult>>,
}

/// Create `<base>/<YYYYmmdd_HHMMSS>`.
pub fn timestamped_dir(base: &Path) -> Result<PathBuf> {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let dir = base.join(stamp);
    std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// File name for a manual sweep capture, e.g. `manual_g1p5_1p0.png`.
pub fn sweep_file_name(gains: ColourGains) -> String {
    let stem = format!("manual_g{:.1}_{:.1}", gains.red, gains.blue).replace('.', "p");
    format!("{stem}.png")
}

/// Run the diagnostic against an open camera and write all artifacts to `outdir`.
pub fn run(source: &mut dyn FrameSource, options: &DiagOptions, outdir: &Path) -> Result<DiagSummary> {
    best_effort(source.set_auto_white_balance(true), "AwbEnable");
    let frame = capture(source, options.flips)
        .map_err(|e| anyhow!("failed to capture an image: {:#}", e))?;

    let auto_path = outdir.join(AUTO_FILE);
    save_png(&auto_path, &frame)?;
    let auto_stats = ChannelStats::from_frame(&frame);
    let auto_verdict = verdict(&auto_stats);
    log::info!(
        "[AUTO] channel means RGB: [{:.1}, {:.1}, {:.1}] -> {}",
        auto_stats.means_rgb[0],
        auto_stats.means_rgb[1],
        auto_stats.means_rgb[2],
        auto_verdict
    );

    let mut summary = DiagSummary {
        backend: source.backend().to_string(),
        width: options.width,
        height: options.height,
        vflip: options.flips.vflip,
        hflip: options.flips.hflip,
        auto_stats,
        auto_verdict,
        files: vec![AUTO_FILE.to_string()],
        manual_sweep: None,
    };

    if options.sweep {
        if source.supports_colour_gains() {
            let results = sweep(source, options, outdir)?;
            summary
                .files
                .extend(results.iter().map(|item| item.file.clone()));
            summary.manual_sweep = Some(results);
            best_effort(source.set_auto_white_balance(true), "AwbEnable");
        } else {
            log::warn!(
                "{} has no colour gain controls; skipping manual sweep",
                source.name()
            );
        }
    }

    write_summary(&summary, outdir)?;
    Ok(summary)
}

fn sweep(
    source: &mut dyn FrameSource,
    options: &DiagOptions,
    outdir: &Path,
) -> Result<Vec<SweepResult>> {
    let mut results = Vec::with_capacity(GAIN_SWEEP.len());
    for gains in GAIN_SWEEP {
        let frame = match capture_with_gains(source, gains, options) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("failed to capture for gains {}: {:#}", gains, err);
                continue;
            }
        };

        let file = sweep_file_name(gains);
        save_png(&outdir.join(&file), &frame)?;
        let stats = ChannelStats::from_frame(&frame);
        let verdict = verdict(&stats);
        log::info!(
            "[MANUAL] gains={} means RGB: [{:.1}, {:.1}, {:.1}] -> {}",
            gains,
            stats.means_rgb[0],
            stats.means_rgb[1],
            stats.means_rgb[2],
            verdict
        );
        results.push(SweepResult {
            gains: (gains.red, gains.blue),
            stats,
            verdict,
            file,
        });
    }
    Ok(results)
}

fn capture_with_gains(
    source: &mut dyn FrameSource,
    gains: ColourGains,
    options: &DiagOptions,
) -> Result<RgbFrame> {
    source.set_auto_white_balance(false)?;
    source.set_colour_gains(gains)?;
    if !options.settle.is_zero() {
        std::thread::sleep(options.settle);
    }
    capture(source, options.flips)
}

fn write_summary(summary: &DiagSummary, outdir: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(outdir.join(SUMMARY_JSON), json)?;
    std::fs::write(outdir.join(SUMMARY_TXT), render_text(summary, outdir))?;
    Ok(())
}
