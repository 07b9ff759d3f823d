use anyhow::Result;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;
use tempfile::TempDir;

use picam_kit::encode::encode_png;
use picam_kit::ingest::{open_camera, CameraSettings};
use picam_kit::viewer::{ensure_static_image, ViewerHandle, STREAM_BOUNDARY};
use picam_kit::{share_source, RgbFrame, SharedSource, ViewerConfig, ViewerServer};

struct TestViewer {
    dir: TempDir,
    cfg: ViewerConfig,
    source: SharedSource,
    handle: Option<ViewerHandle>,
}

impl TestViewer {
    fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let camera = CameraSettings {
            device: "stub://gradient".to_string(),
            width: 32,
            height: 24,
            warmup: Duration::ZERO,
            ..CameraSettings::default()
        };
        let source = share_source(open_camera(&camera)?);
        let cfg = ViewerConfig {
            addr: "127.0.0.1:0".to_string(),
            camera,
            static_dir: dir.path().to_path_buf(),
            ..ViewerConfig::default()
        };
        let handle = ViewerServer::new(cfg.clone(), source.clone()).spawn()?;
        Ok(Self {
            dir,
            cfg,
            source,
            handle: Some(handle),
        })
    }

    fn addr(&self) -> SocketAddr {
        self.handle.as_ref().map(|h| h.addr).unwrap()
    }

    fn request(&self, method: &str, path: &str) -> Result<(String, Vec<u8>)> {
        let mut stream = TcpStream::connect(self.addr())?;
        stream.set_read_timeout(Some(Duration::from_secs(5)))?;
        write!(stream, "{method} {path} HTTP/1.1\r\nHost: localhost\r\n\r\n")?;
        let mut response = Vec::new();
        stream.read_to_end(&mut response)?;
        Ok(split_response(&response))
    }
}

impl Drop for TestViewer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.stop();
        }
    }
}

fn split_response(response: &[u8]) -> (String, Vec<u8>) {
    match response.windows(4).position(|w| w == b"\r\n\r\n") {
        Some(pos) => (
            String::from_utf8_lossy(&response[..pos]).to_string(),
            response[pos + 4..].to_vec(),
        ),
        None => (String::from_utf8_lossy(response).to_string(), Vec::new()),
    }
}

#[test]
fn health_check_answers_ok() -> Result<()> {
    let viewer = TestViewer::new()?;
    let (headers, body) = viewer.request("GET", "/healthz")?;
    assert!(headers.starts_with("HTTP/1.1 200"));
    assert_eq!(body, b"ok");
    Ok(())
}

#[test]
fn snapshot_returns_jpeg() -> Result<()> {
    let viewer = TestViewer::new()?;
    let (headers, body) = viewer.request("GET", "/snapshot")?;
    assert!(headers.starts_with("HTTP/1.1 200"));
    assert!(headers.contains("Content-Type: image/jpeg"));
    assert_eq!(&body[..2], &[0xFF, 0xD8]);
    Ok(())
}

#[test]
fn index_page_embeds_stream() -> Result<()> {
    let viewer = TestViewer::new()?;
    let (headers, body) = viewer.request("GET", "/")?;
    assert!(headers.contains("text/html"));
    let html = String::from_utf8(body)?;
    assert!(html.contains(r#"src="/stream""#));
    assert!(!html.contains(r#"src="/lara""#));
    Ok(())
}

#[test]
fn stream_sends_multipart_jpegs() -> Result<()> {
    let viewer = TestViewer::new()?;
    let mut stream = TcpStream::connect(viewer.addr())?;
    stream.set_read_timeout(Some(Duration::from_secs(5)))?;
    stream.write_all(b"GET /stream HTTP/1.1\r\nHost: localhost\r\n\r\n")?;

    let marker = format!("--{STREAM_BOUNDARY}\r\nContent-Type: image/jpeg\r\n\r\n");
    let mut received = Vec::new();
    let mut buf = [0u8; 4096];
    // Two boundaries means at least one complete part arrived.
    while received
        .windows(marker.len())
        .filter(|w| *w == marker.as_bytes())
        .count()
        < 2
    {
        let n = stream.read(&mut buf)?;
        assert!(n > 0, "stream closed early");
        received.extend_from_slice(&buf[..n]);
    }

    let (headers, body) = split_response(&received);
    assert!(headers.contains("multipart/x-mixed-replace; boundary=frame"));
    assert!(body.starts_with(marker.as_bytes()));
    assert_eq!(&body[marker.len()..marker.len() + 2], &[0xFF, 0xD8]);
    Ok(())
}

#[test]
fn unknown_paths_and_methods() -> Result<()> {
    let viewer = TestViewer::new()?;
    let (headers, _) = viewer.request("GET", "/nope")?;
    assert!(headers.starts_with("HTTP/1.1 404"));
    let (headers, _) = viewer.request("POST", "/snapshot")?;
    assert!(headers.starts_with("HTTP/1.1 405"));
    let (headers, _) = viewer.request("GET", "/static/../Cargo.toml")?;
    assert!(headers.starts_with("HTTP/1.1 404"));
    Ok(())
}

#[test]
fn static_files_are_served_with_content_type() -> Result<()> {
    let viewer = TestViewer::new()?;
    let png = encode_png(&RgbFrame::filled(4, 4, [10, 200, 30]))?;
    std::fs::write(viewer.dir.path().join("x.png"), &png)?;

    let (headers, body) = viewer.request("GET", "/static/x.png")?;
    assert!(headers.starts_with("HTTP/1.1 200"));
    assert!(headers.contains("Content-Type: image/png"));
    assert_eq!(body, png);

    let (headers, _) = viewer.request("GET", "/static/missing.png")?;
    assert!(headers.starts_with("HTTP/1.1 404"));
    Ok(())
}

#[test]
fn still_image_is_created_once_and_served() -> Result<()> {
    let viewer = TestViewer::new()?;
    let (headers, _) = viewer.request("GET", "/lara")?;
    assert!(headers.starts_with("HTTP/1.1 404"));

    assert!(ensure_static_image(&viewer.cfg, &viewer.source)?);
    assert!(!ensure_static_image(&viewer.cfg, &viewer.source)?);
    assert!(viewer.dir.path().join("static_lara.jpg").is_file());

    let (headers, body) = viewer.request("GET", "/lara")?;
    assert!(headers.starts_with("HTTP/1.1 200"));
    assert_eq!(&body[..2], &[0xFF, 0xD8]);

    let (_, body) = viewer.request("GET", "/")?;
    assert!(String::from_utf8(body)?.contains(r#"src="/lara""#));
    Ok(())
}
