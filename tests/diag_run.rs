use anyhow::Result;
use std::time::Duration;

use picam_kit::diag::{self, DiagOptions, DiagSummary, AUTO_FILE, GAIN_SWEEP, SUMMARY_JSON};
use picam_kit::ingest::{CameraSettings, FrameSource, SyntheticSource};
use picam_kit::stats::{BLUE_CAST, RED_CAST};

fn camera(device: &str) -> CameraSettings {
    CameraSettings {
        device: device.to_string(),
        width: 16,
        height: 12,
        warmup: Duration::ZERO,
        ..CameraSettings::default()
    }
}

fn options(sweep: bool) -> DiagOptions {
    DiagOptions {
        width: 16,
        height: 12,
        sweep,
        settle: Duration::ZERO,
        ..DiagOptions::default()
    }
}

#[test]
fn writes_auto_frame_sweep_and_summaries() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut source = SyntheticSource::new(camera("stub://blue"));
    source.connect()?;

    let summary = diag::run(&mut source, &options(true), dir.path())?;

    assert_eq!(summary.backend, "synthetic");
    assert_eq!(summary.auto_verdict, BLUE_CAST);
    assert!(dir.path().join(AUTO_FILE).is_file());
    let sweep = summary.manual_sweep.as_ref().expect("sweep results");
    assert_eq!(sweep.len(), GAIN_SWEEP.len());
    for item in sweep {
        assert!(dir.path().join(&item.file).is_file(), "{}", item.file);
    }
    assert_eq!(summary.files.len(), 1 + GAIN_SWEEP.len());
    // AWB is restored after the sweep.
    assert!(source.auto_white_balance());

    let json = std::fs::read_to_string(dir.path().join(SUMMARY_JSON))?;
    let parsed: DiagSummary = serde_json::from_str(&json)?;
    assert_eq!(parsed.files, summary.files);
    assert_eq!(parsed.auto_verdict, summary.auto_verdict);
    assert_eq!(parsed.auto_stats.means_rgb, [60.0, 70.0, 150.0]);

    let text = std::fs::read_to_string(dir.path().join(diag::SUMMARY_TXT))?;
    assert!(text.contains("[MANUAL SWEEP] (AWB OFF)"));
    assert!(text.contains("manual_g1p5_1p0.png"));
    Ok(())
}

#[test]
fn red_gain_warms_the_blue_scene() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut source = SyntheticSource::new(camera("stub://blue"));
    source.connect()?;
    let summary = diag::run(&mut source, &options(true), dir.path())?;

    let sweep = summary.manual_sweep.expect("sweep results");
    let boosted = sweep
        .iter()
        .find(|item| item.gains == (2.0, 1.2))
        .expect("(2.0, 1.2) preset");
    assert!(boosted.stats.means_rgb[0] > summary.auto_stats.means_rgb[0]);
    Ok(())
}

#[test]
fn no_sweep_skips_manual_section() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut source = SyntheticSource::new(camera("stub://red"));
    source.connect()?;

    let summary = diag::run(&mut source, &options(false), dir.path())?;
    assert_eq!(summary.auto_verdict, RED_CAST);
    assert!(summary.manual_sweep.is_none());
    assert_eq!(summary.files, vec![AUTO_FILE.to_string()]);

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(SUMMARY_JSON))?)?;
    assert!(json.get("manual_sweep").is_none());
    assert_eq!(json["vflip"], serde_json::Value::Bool(false));
    assert_eq!(json["hflip"], serde_json::Value::Bool(false));
    Ok(())
}

#[test]
fn camera_without_gain_controls_skips_sweep() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut source = SyntheticSource::new(camera("stub://gray")).without_controls();
    source.connect()?;

    let summary = diag::run(&mut source, &options(true), dir.path())?;
    assert!(summary.manual_sweep.is_none());
    assert!(dir.path().join(AUTO_FILE).is_file());
    Ok(())
}

#[test]
fn capture_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    // Never connected, so capture fails.
    let mut source = SyntheticSource::new(camera("stub://gray"));
    let err = diag::run(&mut source, &options(true), dir.path()).unwrap_err();
    assert!(err.to_string().contains("failed to capture an image"));
}
