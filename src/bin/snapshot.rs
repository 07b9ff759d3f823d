//! snapshot - capture one frame to a file
//!
//! The format follows the extension: `.png` for PNG, anything else JPEG.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use picam_kit::encode::save_image;
use picam_kit::ingest::capture;
use picam_kit::{open_camera, CameraSettings, Flips};

#[derive(Parser, Debug)]
#[command(name = "snapshot", about = "Capture a single camera frame")]
struct Args {
    /// Output path (.jpg/.jpeg or .png)
    #[arg(value_name = "PATH", default_value = "snapshot.jpg")]
    output: PathBuf,

    #[arg(long, default_value = "/dev/video0", env = "PICAM_DEVICE")]
    device: String,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,

    #[arg(long)]
    vflip: bool,

    #[arg(long)]
    hflip: bool,

    /// Sensor warmup before capturing, in milliseconds
    #[arg(long, default_value_t = 800)]
    warmup_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let flips = Flips {
        vflip: args.vflip,
        hflip: args.hflip,
    };
    let mut camera = open_camera(&CameraSettings {
        device: args.device,
        width: args.width,
        height: args.height,
        warmup: Duration::from_millis(args.warmup_ms),
        flips,
        ..CameraSettings::default()
    })?;
    let frame = capture(camera.as_mut(), flips)?;
    save_image(&args.output, &frame, args.quality)?;
    println!(
        "saved {}x{} frame to {}",
        frame.width,
        frame.height,
        args.output.display()
    );
    Ok(())
}
