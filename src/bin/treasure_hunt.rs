//! treasure_hunt - keyboard-driven crawler colour game
//!
//! The robot announces a colour; drive it with w/a/s/d until the camera sees
//! that colour up close. With `--web` the camera is also streamed through the
//! viewer so the hunt can be watched from a browser.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use picam_kit::robot::{
    spawn_key_reader, CommandCrawler, Crawler, DryRunCrawler, EspeakSpeaker, HuntConfig, Key,
    LogSpeaker, RawTerminal, Speaker, TreasureHunt, MANUAL,
};
use picam_kit::viewer::capture_shared;
use picam_kit::{open_camera, share_source, CameraSettings, Flips, ViewerConfig, ViewerServer};

#[derive(Parser, Debug)]
#[command(name = "treasure_hunt", about = "Find the announced colour with the crawler")]
struct Args {
    #[arg(long, default_value = "/dev/video0", env = "PICAM_DEVICE")]
    device: String,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Crawler speed (0-100)
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(0..=100))]
    speed: u8,

    /// Control loop interval in milliseconds
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,

    /// Blob width (pixels) that counts as finding the colour
    #[arg(long, default_value_t = 100)]
    min_width: u32,

    /// Program run as `<cmd> <action> <steps> <speed>`; omit for a dry run
    #[arg(long, value_name = "PATH")]
    crawler_cmd: Option<PathBuf>,

    /// Log phrases instead of speaking them
    #[arg(long)]
    no_tts: bool,

    /// Also serve the camera stream on this address (e.g., 0.0.0.0:8000)
    #[arg(long, value_name = "ADDR")]
    web: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let crawler: Box<dyn Crawler> = match &args.crawler_cmd {
        Some(cmd) => Box::new(CommandCrawler::new(cmd)),
        None => {
            log::warn!("no --crawler-cmd given; movements are only logged");
            Box::new(DryRunCrawler::new())
        }
    };
    let speaker: Box<dyn Speaker> = if args.no_tts {
        Box::new(LogSpeaker::new())
    } else {
        Box::new(EspeakSpeaker::new())
    };

    let camera_settings = CameraSettings {
        device: args.device.clone(),
        width: args.width,
        height: args.height,
        warmup: Duration::from_millis(800),
        flips: Flips::default(),
        ..CameraSettings::default()
    };
    let source = share_source(open_camera(&camera_settings)?);

    let viewer = match &args.web {
        Some(addr) => {
            let cfg = ViewerConfig {
                addr: addr.clone(),
                camera: camera_settings.clone(),
                ..ViewerConfig::default()
            };
            let handle = ViewerServer::new(cfg, source.clone()).spawn()?;
            log::info!("streaming on http://{}/", handle.addr);
            Some(handle)
        }
        None => None,
    };

    println!("{}", MANUAL);
    std::thread::sleep(Duration::from_secs(1));

    let raw = if std::io::stdin().is_terminal() {
        Some(RawTerminal::enable()?)
    } else {
        None
    };
    let (tx, keys) = mpsc::channel::<Key>();
    spawn_key_reader(std::io::stdin(), tx);

    let config = HuntConfig {
        speed: args.speed,
        poll: Duration::from_millis(args.poll_ms),
        min_width: args.min_width,
        ..HuntConfig::default()
    };
    let mut game = TreasureHunt::new(crawler, speaker, config);
    let flips = camera_settings.flips;
    let result = game.run(|| capture_shared(&source, flips), &keys);

    drop(raw);
    if let Some(handle) = viewer {
        handle.stop()?;
    }
    println!("Quit");
    result
}
