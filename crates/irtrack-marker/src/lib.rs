//! Bright point marker detection for infrared frames.
//!
//! Pipeline per frame:
//! - grow bright pixels with a square dilation to merge nearby spots,
//! - binarize at a fixed intensity threshold,
//! - extract external contours only (holes never create extra markers),
//! - report each contour's area centroid, truncated to integer pixels.
//!
//! The [`overlay`] module holds the drawing helpers shared by all
//! visualization panels.

mod detector;
mod moments;
pub mod overlay;
mod params;

pub use detector::{MarkerDetection, MarkerDetector};
pub use moments::ContourMoments;
pub use params::MarkerDetectorParams;
