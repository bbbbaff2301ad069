//! Core types and utilities for infrared marker tracking.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete image library: frames arrive as borrowed
//! [`GrayImageView`]s and rectified images come back as [`GrayImage`]s.

mod homography;
mod image;
mod logger;
mod target;

pub use homography::{homography_from_4pt, warp_perspective_gray, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageError};
pub use target::{TargetRect, TargetRectError, MAX_TARGET_SIDE};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;

/// Frame as handed over by the acquisition side.
pub type Frame<'a> = GrayImageView<'a>;
