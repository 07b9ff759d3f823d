use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::frame::Flips;
use crate::ingest::CameraSettings;

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DEVICE: &str = "/dev/video0";
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_WARMUP_MS: u64 = 300;
const DEFAULT_STREAM_QUALITY: u8 = 80;
const DEFAULT_SNAPSHOT_QUALITY: u8 = 90;
const DEFAULT_STATIC_DIR: &str = ".";
const DEFAULT_STATIC_IMAGE: &str = "static_lara.jpg";

#[derive(Debug, Deserialize, Default)]
struct ViewerConfigFile {
    addr: Option<String>,
    camera: Option<CameraConfigFile>,
    stream: Option<StreamConfigFile>,
    static_files: Option<StaticConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    warmup_ms: Option<u64>,
    autofocus: Option<bool>,
    vflip: Option<bool>,
    hflip: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamConfigFile {
    jpeg_quality: Option<u8>,
    snapshot_quality: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
struct StaticConfigFile {
    dir: Option<PathBuf>,
    image: Option<String>,
}

/// Settings for the `display_cam` web viewer.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub addr: String,
    pub camera: CameraSettings,
    pub jpeg_quality: u8,
    pub snapshot_quality: u8,
    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
    /// File name (inside `static_dir`) served at `/lara`.
    pub static_image: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self::from_file(ViewerConfigFile::default())
    }
}

impl ViewerConfig {
    /// Defaults, then the JSON file named by `PICAM_CONFIG`, then `PICAM_*` env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PICAM_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ViewerConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let stream = file.stream.unwrap_or_default();
        let static_files = file.static_files.unwrap_or_default();
        Self {
            addr: file.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            camera: CameraSettings {
                device: camera.device.unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_HEIGHT),
                warmup: Duration::from_millis(camera.warmup_ms.unwrap_or(DEFAULT_WARMUP_MS)),
                autofocus: camera.autofocus.unwrap_or(true),
                flips: Flips {
                    vflip: camera.vflip.unwrap_or(false),
                    hflip: camera.hflip.unwrap_or(false),
                },
            },
            jpeg_quality: stream.jpeg_quality.unwrap_or(DEFAULT_STREAM_QUALITY),
            snapshot_quality: stream.snapshot_quality.unwrap_or(DEFAULT_SNAPSHOT_QUALITY),
            static_dir: static_files
                .dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
            static_image: static_files
                .image
                .unwrap_or_else(|| DEFAULT_STATIC_IMAGE.to_string()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(addr) = non_empty_env("PICAM_ADDR") {
            self.addr = addr;
        }
        if let Some(device) = non_empty_env("PICAM_DEVICE") {
            self.camera.device = device;
        }
        if let Some(width) = non_empty_env("PICAM_WIDTH") {
            self.camera.width = width
                .parse()
                .map_err(|_| anyhow!("PICAM_WIDTH must be an integer number of pixels"))?;
        }
        if let Some(height) = non_empty_env("PICAM_HEIGHT") {
            self.camera.height = height
                .parse()
                .map_err(|_| anyhow!("PICAM_HEIGHT must be an integer number of pixels"))?;
        }
        if let Some(quality) = non_empty_env("PICAM_JPEG_QUALITY") {
            self.jpeg_quality = quality
                .parse()
                .map_err(|_| anyhow!("PICAM_JPEG_QUALITY must be an integer in 1..=100"))?;
        }
        if let Some(dir) = non_empty_env("PICAM_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera resolution must be non-zero"));
        }
        for (name, quality) in [
            ("jpeg_quality", self.jpeg_quality),
            ("snapshot_quality", self.snapshot_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(anyhow!("{} must be in 1..=100, got {}", name, quality));
            }
        }
        if !is_plain_file_name(&self.static_image) {
            return Err(anyhow!(
                "static image must be a plain file name, got '{}'",
                self.static_image
            ));
        }
        Ok(())
    }

    pub fn static_image_path(&self) -> PathBuf {
        self.static_dir.join(&self.static_image)
    }
}

/// True for names without path separators or parent references.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<ViewerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_display_cam() {
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.addr, "0.0.0.0:8000");
        assert_eq!(cfg.camera.width, 1280);
        assert_eq!(cfg.camera.height, 720);
        assert_eq!(cfg.camera.warmup, Duration::from_millis(300));
        assert_eq!(cfg.jpeg_quality, 80);
        assert_eq!(cfg.snapshot_quality, 90);
        assert_eq!(cfg.static_image_path(), PathBuf::from("./static_lara.jpg"));
    }

    #[test]
    fn plain_file_names() {
        assert!(is_plain_file_name("lara.jpg"));
        assert!(!is_plain_file_name("../etc/passwd"));
        assert!(!is_plain_file_name("a/b.jpg"));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn validate_rejects_zero_quality() {
        let mut cfg = ViewerConfig::default();
        cfg.jpeg_quality = 0;
        assert!(cfg.validate().is_err());
    }
}
