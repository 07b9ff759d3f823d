use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use picam_kit::config::ViewerConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "PICAM_CONFIG",
        "PICAM_ADDR",
        "PICAM_DEVICE",
        "PICAM_WIDTH",
        "PICAM_HEIGHT",
        "PICAM_JPEG_QUALITY",
        "PICAM_STATIC_DIR",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "addr": "127.0.0.1:9000",
        "camera": {
            "device": "stub://blue",
            "width": 640,
            "height": 480,
            "warmup_ms": 0,
            "vflip": true
        },
        "stream": {
            "jpeg_quality": 70,
            "snapshot_quality": 95
        },
        "static_files": {
            "dir": "/srv/cam",
            "image": "still.jpg"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("PICAM_CONFIG", file.path());
    std::env::set_var("PICAM_WIDTH", "800");
    std::env::set_var("PICAM_DEVICE", "stub://red");

    let cfg = ViewerConfig::load().expect("load config");

    assert_eq!(cfg.addr, "127.0.0.1:9000");
    assert_eq!(cfg.camera.device, "stub://red");
    assert_eq!(cfg.camera.width, 800);
    assert_eq!(cfg.camera.height, 480);
    assert_eq!(cfg.camera.warmup, Duration::ZERO);
    assert!(cfg.camera.flips.vflip);
    assert!(!cfg.camera.flips.hflip);
    assert_eq!(cfg.jpeg_quality, 70);
    assert_eq!(cfg.snapshot_quality, 95);
    assert_eq!(cfg.static_image_path(), PathBuf::from("/srv/cam/still.jpg"));

    clear_env();
}

#[test]
fn defaults_without_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = ViewerConfig::load().expect("load config");
    assert_eq!(cfg.addr, "0.0.0.0:8000");
    assert_eq!(cfg.camera.device, "/dev/video0");
    assert_eq!(cfg.camera.width, 1280);
    assert_eq!(cfg.camera.height, 720);
    assert_eq!(cfg.static_image, "static_lara.jpg");
}

#[test]
fn rejects_bad_env_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PICAM_WIDTH", "wide");
    assert!(ViewerConfig::load().is_err());
    clear_env();

    std::env::set_var("PICAM_JPEG_QUALITY", "0");
    assert!(ViewerConfig::load().is_err());
    clear_env();
}

#[test]
fn rejects_static_image_outside_dir() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{ "static_files": { "image": "../secret.jpg" } }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    std::env::set_var("PICAM_CONFIG", file.path());

    assert!(ViewerConfig::load().is_err());
    clear_env();
}

#[test]
fn missing_config_file_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("PICAM_CONFIG", "/nonexistent/picam.json");
    let err = ViewerConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
    clear_env();
}
