//! display_cam - browser viewer for the Pi camera
//!
//! This daemon:
//! 1. Loads `ViewerConfig` (PICAM_CONFIG file + PICAM_* overrides)
//! 2. Opens the camera and captures the still image if it is missing
//! 3. Serves the landing page, MJPEG stream and snapshots until Ctrl-C

use anyhow::{anyhow, Result};
use std::sync::mpsc;

use picam_kit::{
    open_camera, share_source,
    viewer::{ensure_static_image, ViewerServer},
    ViewerConfig,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = ViewerConfig::load()?;
    let source = share_source(open_camera(&cfg.camera)?);

    if let Err(err) = ensure_static_image(&cfg, &source) {
        log::warn!("could not create still image: {:#}", err);
    }

    let handle = ViewerServer::new(cfg.clone(), source).spawn()?;
    log::info!("display_cam serving http://{}/", handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

    let _ = rx.recv();
    log::info!("shutdown signal received, stopping viewer...");
    handle.stop()?;
    Ok(())
}
