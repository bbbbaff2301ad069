//! High-level facade crate for the `irtrack-*` workspace.
//!
//! This crate provides:
//! - re-exports of the detector, calibration, geometry and protocol crates
//! - [`FrameCompositor`], which runs the per-frame pipeline
//! - [`Session`], the state of one tracking run driven by [`InputEvent`]s
//! - [`AppConfig`], JSON operator settings
//! - [`FrameSource`] for acquisition, with a recorded-frame replay source
//!
//! ## Quickstart
//!
//! ```no_run
//! use irtrack::{AppConfig, ImageSequenceSource, InputEvent, Session};
//! use irtrack::marker::MarkerDetectorParams;
//! use nalgebra::Point2;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = ImageSequenceSource::open_dir("frames", false)?;
//! let mut session = Session::new(AppConfig::default(), MarkerDetectorParams::default())?;
//!
//! for (x, y) in [(12.0, 9.0), (630.0, 14.0), (625.0, 470.0), (8.0, 466.0)] {
//!     session.handle(InputEvent::Click(Point2::new(x, y)));
//! }
//! while let Some(tick) = session.tick(&mut source)? {
//!     println!("{} point(s) in target", tick.report.in_bounds.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `irtrack::core`: frame views, homographies, target rectangle, logger.
//! - `irtrack::marker`: bright marker detection and overlay drawing.
//! - `irtrack::calib`: four-point calibration and coordinate mapping.
//! - `irtrack::protocol`: `x,y;x,y` codec, UDP sender and receiver.
//! - `irtrack::detect`: helpers taking `image::GrayImage`.

pub use irtrack_calib as calib;
pub use irtrack_core as core;
pub use irtrack_marker as marker;
pub use irtrack_protocol as protocol;

pub use irtrack_calib::{CoordinateMapper, HomographyCalibrator, PlanarTransform};
pub use irtrack_core::{GrayImageView, TargetRect};
pub use irtrack_marker::{MarkerDetector, MarkerDetectorParams};
pub use irtrack_protocol::{CoordinatePacket, PixelPoint};

mod compositor;
mod config;
pub mod detect;
mod session;
mod source;

pub use compositor::{FrameCompositor, FrameResult};
pub use config::{AppConfig, ConfigError, MAX_EXPOSURE};
pub use session::{FrameReport, InputEvent, Session, SessionControl, SessionError, Tick};
pub use source::{load_gray, FrameSource, ImageSequenceSource, OwnedFrame, SourceError};
