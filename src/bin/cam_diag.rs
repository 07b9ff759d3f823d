//! cam_diag - headless camera colour diagnostic
//!
//! Captures an auto-white-balance frame and, unless `--no-sweep`, a set of
//! manual colour-gain frames. Results land in `<out>/<timestamp>/` as PNGs
//! plus `summary.json` and `summary.txt`.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use picam_kit::diag::{self, DiagOptions, SUMMARY_JSON, SUMMARY_TXT};
use picam_kit::{open_camera, CameraSettings, Flips};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(name = "cam_diag", about = "Headless camera colour diagnostic")]
struct Args {
    /// Camera device (e.g., /dev/video0 or stub://blue)
    #[arg(long, default_value = "/dev/video0", env = "PICAM_DEVICE")]
    device: String,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long)]
    vflip: bool,

    #[arg(long)]
    hflip: bool,

    /// Capture the manual colour-gain sweep (default)
    #[arg(long, overrides_with = "no_sweep")]
    sweep: bool,

    /// Skip the manual colour-gain sweep
    #[arg(long = "no-sweep", overrides_with = "sweep")]
    no_sweep: bool,

    /// Base output directory; a timestamped directory is created inside
    #[arg(long, default_value = diag::DEFAULT_OUT_BASE, value_name = "DIR")]
    out: PathBuf,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::new(ui::UiMode::parse(&args.ui), is_tty, !stdout_is_tty, 3);

    let flips = Flips {
        vflip: args.vflip,
        hflip: args.hflip,
    };
    let options = DiagOptions {
        width: args.width,
        height: args.height,
        flips,
        sweep: args.sweep || !args.no_sweep,
        ..DiagOptions::default()
    };

    let outdir = diag::timestamped_dir(&args.out)?;
    println!("[INFO] Output directory: {}", outdir.display());

    let mut camera = {
        let _stage = ui.stage("Open camera");
        open_camera(&CameraSettings {
            device: args.device.clone(),
            width: args.width,
            height: args.height,
            warmup: Duration::from_millis(800),
            autofocus: false,
            flips,
        })?
    };

    let summary = {
        let _stage = ui.stage("Capture frames");
        diag::run(camera.as_mut(), &options, &outdir)?
    };

    {
        let _stage = ui.stage("Report");
        let [r, g, b] = summary.auto_stats.means_rgb;
        println!(
            "[AUTO] means RGB: [{:.1}, {:.1}, {:.1}] -> {}",
            r, g, b, summary.auto_verdict
        );
        if let Some(sweep) = &summary.manual_sweep {
            for item in sweep {
                let [r, g, b] = item.stats.means_rgb;
                println!(
                    "[MANUAL] gains=({:.1}, {:.1}) means RGB: [{:.1}, {:.1}, {:.1}] -> {}",
                    item.gains.0, item.gains.1, r, g, b, item.verdict
                );
            }
        }
    }

    println!();
    println!("Done. Review these files:");
    println!("  {}", outdir.join(SUMMARY_TXT).display());
    println!("  {}", outdir.join(SUMMARY_JSON).display());
    for file in &summary.files {
        println!("  {}", outdir.join(file).display());
    }
    Ok(())
}
