//! cam_compare - interactive RGB/BGR compare
//!
//! Single-key control from the terminal; the current view is written to
//! `<out>/live.png` so it can be watched from an image viewer or the browser.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use picam_kit::compare::{CompareSession, KeyOutcome};
use picam_kit::encode::save_png;
use picam_kit::ingest::capture;
use picam_kit::robot::hunt::newest_key;
use picam_kit::robot::{spawn_key_reader, Key, RawTerminal};
use picam_kit::{open_camera, CameraSettings, Flips};

#[derive(Parser, Debug)]
#[command(name = "cam_compare", about = "Compare RGB and BGR views of the camera")]
struct Args {
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

    /// Print channel means every N frames (0 disables)
    #[arg(long, default_value_t = 15)]
    every: u64,

    /// Directory for live.png and saved frames
    #[arg(long, default_value = ".", value_name = "DIR")]
    out: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let flips = Flips {
        vflip: args.vflip,
        hflip: args.hflip,
    };
    let mut camera = open_camera(&CameraSettings {
        device: args.device.clone(),
        width: args.width,
        height: args.height,
        warmup: Duration::from_millis(500),
        flips,
        ..CameraSettings::default()
    })?;
    std::fs::create_dir_all(&args.out)?;

    let mut session = CompareSession::new(&args.out, camera.supports_colour_gains());
    println!("[INFO] {}", session.key_help());

    let _raw = if std::io::stdin().is_terminal() {
        Some(RawTerminal::enable()?)
    } else {
        None
    };
    let (tx, keys) = mpsc::channel::<Key>();
    spawn_key_reader(std::io::stdin(), tx);

    let live = args.out.join("live.png");
    let mut frame_count = 0u64;
    loop {
        let frame = capture(camera.as_mut(), flips)?;
        frame_count += 1;
        let view = session.render(&frame)?;
        save_png(&live, &view.composite)?;
        if args.every > 0 && frame_count % args.every == 0 {
            println!("{}", view.status_line());
        }

        let (key, closed) = newest_key(&keys);
        let outcome = match key {
            Some(Key::Quit) => KeyOutcome::Quit,
            Some(Key::Char(c)) => session.handle_key(c, camera.as_mut(), Some(&frame))?,
            Some(Key::Space) | None => KeyOutcome::Continue(None),
        };
        match outcome {
            KeyOutcome::Quit => break,
            KeyOutcome::Continue(Some(message)) => println!("[camera] {}", message),
            KeyOutcome::Continue(None) => {}
        }
        if closed {
            break;
        }
        std::thread::sleep(Duration::from_millis(30));
    }
    println!("Quit");
    Ok(())
}
