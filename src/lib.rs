//! picam-kit
//!
//! Tools for a Raspberry Pi camera: a browser viewer, colour diagnostics and a
//! keyboard-driven crawler game.
//!
//! # Module Structure
//!
//! - `frame`: RGB frames with an explicit channel order
//! - `ingest`: camera sources (V4L2 devices, synthetic `stub://` scenes)
//! - `encode`: JPEG/PNG encoding
//! - `stats`: per-channel statistics and colour-cast verdicts
//! - `detect`: colour target detection
//! - `config`: viewer configuration (file + environment)
//! - `viewer`: HTTP MJPEG server
//! - `diag`: headless diagnostic report
//! - `compare`: interactive RGB/BGR compare with white-balance controls
//! - `robot`: crawler control, speech, keyboard input, treasure hunt

pub mod compare;
pub mod config;
pub mod detect;
pub mod diag;
pub mod encode;
pub mod frame;
pub mod ingest;
pub mod robot;
pub mod stats;
pub mod viewer;

pub use config::ViewerConfig;
pub use detect::{BoundingBox, ColorDetector, ColorTarget, DetectionResult, Detector};
pub use frame::{ChannelOrder, Flips, RgbFrame};
pub use ingest::{open_camera, CameraSettings, ColourGains, FrameSource, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use ingest::V4l2Source;
pub use stats::ChannelStats;
pub use viewer::{share_source, SharedSource, ViewerHandle, ViewerServer};
