//! Four-point calibration of the tracked surface and mapping of detected
//! markers into its rectified coordinate space.
//!
//! The operator selects the surface corners in the raw sensor image in the
//! order top-left, top-right, bottom-right, bottom-left. Those corners map to
//! `(0,0)`, `(W-1,0)`, `(W-1,H-1)` and `(0,H-1)` of the [`TargetRect`].
//!
//! [`TargetRect`]: irtrack_core::TargetRect

mod calibrator;
mod error;
mod mapper;
mod transform;

pub use calibrator::{AddPointOutcome, CalibrationPhase, HomographyCalibrator, REQUIRED_POINTS};
pub use error::CalibrationError;
pub use mapper::{CoordinateMapper, MappedFrame};
pub use transform::PlanarTransform;
