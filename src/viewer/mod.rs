//! MJPEG web viewer.
//!
//! Routes (GET only):
//! - `/`: landing page
//! - `/stream`: `multipart/x-mixed-replace` MJPEG, one JPEG per captured frame
//! - `/snapshot`: one JPEG
//! - `/healthz`: liveness text
//! - `/lara`: the still image captured at startup
//! - `/static/<name>`: files from the static directory
//!
//! Each connection gets its own thread. All threads share one camera behind a
//! mutex and capture independently; a stream always sends the newest frame.

mod page;

use anyhow::{anyhow, Result};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::{is_plain_file_name, ViewerConfig};
use crate::encode::{encode_jpeg, save_jpeg};
use crate::frame::{Flips, RgbFrame};
use crate::ingest::{capture, FrameSource};

pub use page::render_index;

const MAX_REQUEST_BYTES: usize = 8192;
/// Multipart boundary for `/stream`.
pub const STREAM_BOUNDARY: &str = "frame";

/// Camera shared between request threads.
pub type SharedSource = Arc<Mutex<Box<dyn FrameSource + Send>>>;

pub fn share_source(source: Box<dyn FrameSource + Send>) -> SharedSource {
    Arc::new(Mutex::new(source))
}

#[derive(Debug)]
pub struct ViewerHandle {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ViewerHandle {
    /// Stop accepting connections and end open streams after their current frame.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("viewer server thread panicked"))?;
        }
        Ok(())
    }
}

pub struct ViewerServer {
    cfg: ViewerConfig,
    source: SharedSource,
}

struct ViewerContext {
    cfg: ViewerConfig,
    source: SharedSource,
    shutdown: Arc<AtomicBool>,
}

impl ViewerServer {
    pub fn new(cfg: ViewerConfig, source: SharedSource) -> Self {
        Self { cfg, source }
    }

    pub fn spawn(self) -> Result<ViewerHandle> {
        let configured_addr: SocketAddr = self.cfg.addr.parse()?;
        let listener = TcpListener::bind(configured_addr)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let ctx = Arc::new(ViewerContext {
            cfg: self.cfg,
            source: self.source,
            shutdown: shutdown.clone(),
        });
        let join = std::thread::spawn(move || {
            if let Err(err) = run_server(listener, ctx) {
                log::error!("viewer stopped: {}", err);
            }
        });

        Ok(ViewerHandle {
            addr,
            shutdown,
            join: Some(join),
        })
    }
}

fn run_server(listener: TcpListener, ctx: Arc<ViewerContext>) -> Result<()> {
    loop {
        if ctx.shutdown.load(Ordering::SeqCst) {
            break;
        }
        match listener.accept() {
            Ok((stream, peer)) => {
                let ctx = ctx.clone();
                std::thread::spawn(move || {
                    if let Err(err) = handle_connection(stream, &ctx) {
                        log::debug!("viewer request from {} ended: {:#}", peer, err);
                    }
                });
            }
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Index,
    Stream,
    Snapshot,
    Health,
    StillImage,
    Static(&'a str),
    NotFound,
}

fn route(path: &str) -> Route<'_> {
    match path {
        "/" | "/index.html" => Route::Index,
        "/stream" => Route::Stream,
        "/snapshot" => Route::Snapshot,
        "/healthz" => Route::Health,
        "/lara" => Route::StillImage,
        _ => match path.strip_prefix("/static/") {
            Some(name) if is_plain_file_name(name) => Route::Static(name),
            _ => Route::NotFound,
        },
    }
}

fn handle_connection(mut stream: TcpStream, ctx: &ViewerContext) -> Result<()> {
    stream.set_nonblocking(false)?;
    let request = read_request(&mut stream)?;
    if request.method != "GET" {
        return write_response(&mut stream, 405, "text/plain", b"method not allowed", &[]);
    }
    log::debug!("GET {}", request.path);

    match route(&request.path) {
        Route::Index => {
            let still = ctx.cfg.static_image_path().is_file();
            let html = render_index("localhost", still);
            write_response(
                &mut stream,
                200,
                "text/html; charset=utf-8",
                html.as_bytes(),
                &[],
            )
        }
        Route::Stream => stream_mjpeg(&mut stream, ctx),
        Route::Snapshot => {
            let snapshot = capture_shared(&ctx.source, ctx.cfg.camera.flips)
                .and_then(|frame| encode_jpeg(&frame, ctx.cfg.snapshot_quality));
            match snapshot {
                Ok(jpeg) => write_response(
                    &mut stream,
                    200,
                    "image/jpeg",
                    &jpeg,
                    &[("Content-Disposition", "inline; filename=\"snapshot.jpg\"")],
                ),
                Err(err) => {
                    log::warn!("snapshot failed: {:#}", err);
                    write_response(&mut stream, 500, "text/plain", b"camera unavailable", &[])
                }
            }
        }
        Route::Health => write_response(&mut stream, 200, "text/plain", b"ok", &[]),
        Route::StillImage => send_file(&mut stream, &ctx.cfg.static_image_path()),
        Route::Static(name) => send_file(&mut stream, &ctx.cfg.static_dir.join(name)),
        Route::NotFound => write_response(&mut stream, 404, "text/plain", b"not found", &[]),
    }
}

/// Capture from the shared camera, holding the lock only for the capture itself.
pub fn capture_shared(source: &SharedSource, flips: Flips) -> Result<RgbFrame> {
    let mut camera = source
        .lock()
        .map_err(|_| anyhow!("camera lock poisoned"))?;
    capture(camera.as_mut(), flips)
}

fn stream_mjpeg(stream: &mut TcpStream, ctx: &ViewerContext) -> Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: multipart/x-mixed-replace; boundary={}\r\nCache-Control: no-store\r\nConnection: close\r\n\r\n",
        STREAM_BOUNDARY
    );
    stream.write_all(header.as_bytes())?;

    let mut frames = 0u64;
    while !ctx.shutdown.load(Ordering::SeqCst) {
        let frame = capture_shared(&ctx.source, ctx.cfg.camera.flips)?;
        let jpeg = match encode_jpeg(&frame, ctx.cfg.jpeg_quality) {
            Ok(jpeg) => jpeg,
            Err(err) => {
                log::debug!("skipping frame: {:#}", err);
                continue;
            }
        };
        // A failed write means the client went away.
        stream.write_all(&mjpeg_part(&jpeg))?;
        frames += 1;
    }
    log::debug!("stream closed after {} frames", frames);
    Ok(())
}

/// One multipart section: boundary, part header, JPEG bytes, CRLF.
pub fn mjpeg_part(jpeg: &[u8]) -> Vec<u8> {
    let head = format!(
        "--{}\r\nContent-Type: image/jpeg\r\n\r\n",
        STREAM_BOUNDARY
    );
    let mut part = Vec::with_capacity(head.len() + jpeg.len() + 2);
    part.extend_from_slice(head.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(b"\r\n");
    part
}

fn send_file(stream: &mut TcpStream, path: &Path) -> Result<()> {
    match std::fs::read(path) {
        Ok(body) => write_response(stream, 200, content_type_for(path), &body, &[]),
        Err(err) => {
            log::debug!("static file {} unavailable: {}", path.display(), err);
            write_response(stream, 404, "text/plain", b"not found", &[])
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Capture one frame into the still image file unless it already exists.
///
/// Returns true when a new file was written.
pub fn ensure_static_image(cfg: &ViewerConfig, source: &SharedSource) -> Result<bool> {
    let path = cfg.static_image_path();
    if path.exists() {
        return Ok(false);
    }
    let frame = capture_shared(source, cfg.camera.flips)?;
    save_jpeg(&path, &frame, cfg.snapshot_quality)?;
    log::info!("saved still image to {}", path.display());
    Ok(true)
}

fn read_request(stream: &mut TcpStream) -> Result<HttpRequest> {
    stream.set_read_timeout(Some(Duration::from_secs(2)))?;
    let mut buf = [0u8; 1024];
    let mut data = Vec::new();
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        if data.len() > MAX_REQUEST_BYTES {
            return Err(anyhow!("request too large"));
        }
        if data.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }
    parse_request(&data)
}

fn parse_request(data: &[u8]) -> Result<HttpRequest> {
    let text = String::from_utf8_lossy(data);
    let request_line = text.split("\r\n").next().ok_or_else(|| anyhow!("empty request"))?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next().ok_or_else(|| anyhow!("missing method"))?;
    let raw_path = parts.next().ok_or_else(|| anyhow!("missing path"))?;
    let path = raw_path.split('?').next().unwrap_or(raw_path).to_string();
    Ok(HttpRequest {
        method: method.to_string(),
        path,
    })
}

fn write_response(
    stream: &mut TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
    extra_headers: &[(&str, &str)],
) -> Result<()> {
    let status_line = match status {
        200 => "HTTP/1.1 200 OK",
        404 => "HTTP/1.1 404 Not Found",
        405 => "HTTP/1.1 405 Method Not Allowed",
        _ => "HTTP/1.1 500 Internal Server Error",
    };
    let mut header = format!(
        "{status_line}\r\nContent-Type: {content_type}\r\nContent-Length: {len}\r\nCache-Control: no-store\r\nConnection: close\r\n",
        len = body.len()
    );
    for (name, value) in extra_headers {
        header.push_str(&format!("{name}: {value}\r\n"));
    }
    header.push_str("\r\n");
    stream.write_all(header.as_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

#[derive(Debug)]
struct HttpRequest {
    method: String,
    path: String,
}
