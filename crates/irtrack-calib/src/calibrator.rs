use irtrack_core::TargetRect;
use nalgebra::Point2;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::CalibrationError;
use crate::transform::PlanarTransform;

/// Number of reference points that complete a calibration.
pub const REQUIRED_POINTS: usize = 4;

/// Coarse calibration status, as shown to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CalibrationPhase {
    /// Fewer than four points have been selected.
    Collecting { selected: usize },
    /// Four points selected and a transform is available.
    Ready,
}

/// Effect of a single [`HomographyCalibrator::add_point`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddPointOutcome {
    /// The point was stored; `selected` points are held now.
    Collected { selected: usize },
    /// The point completed the set and the transform was computed.
    Ready,
    /// Calibration was already complete; nothing changed.
    Ignored,
}

/// Collects the four reference points (TL, TR, BR, BL) in raw sensor pixels
/// and derives the raw to target transform once the set is complete.
///
/// A transform exists exactly when four points are held. Points beyond the
/// fourth are ignored until [`reset`](Self::reset).
#[derive(Clone, Debug, Default)]
pub struct HomographyCalibrator {
    points: Vec<Point2<f32>>,
    transform: Option<PlanarTransform>,
    target: Option<TargetRect>,
}

impl HomographyCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reference point.
    ///
    /// On the fourth point the transform onto `rect` is solved. A corner set
    /// that cannot define one is rejected: the fourth point is dropped and
    /// the calibrator stays at three points.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, rect), fields(x = p.x, y = p.y))
    )]
    pub fn add_point(
        &mut self,
        p: Point2<f32>,
        rect: &TargetRect,
    ) -> Result<AddPointOutcome, CalibrationError> {
        if self.is_ready() {
            log::debug!("calibration complete, ignoring point ({}, {})", p.x, p.y);
            return Ok(AddPointOutcome::Ignored);
        }

        self.points.push(p);
        self.target = Some(*rect);
        log::info!(
            "calibration point {}/{REQUIRED_POINTS}: ({}, {})",
            self.points.len(),
            p.x,
            p.y
        );
        if self.points.len() < REQUIRED_POINTS {
            return Ok(AddPointOutcome::Collected {
                selected: self.points.len(),
            });
        }

        let corners = [self.points[0], self.points[1], self.points[2], self.points[3]];
        match PlanarTransform::from_corners(&corners, rect) {
            Ok(transform) => {
                self.transform = Some(transform);
                log::info!(
                    "calibration ready, target {}x{}",
                    rect.width(),
                    rect.height()
                );
                Ok(AddPointOutcome::Ready)
            }
            Err(err) => {
                self.points.pop();
                log::warn!("rejected calibration point ({}, {}): {err}", p.x, p.y);
                Err(err)
            }
        }
    }

    /// Drop all points and the transform.
    pub fn reset(&mut self) {
        if !self.points.is_empty() {
            log::info!("calibration reset");
        }
        self.points.clear();
        self.transform = None;
        self.target = None;
    }

    /// Reset when `rect` differs from the rectangle the current points were
    /// collected for. Returns `true` if a reset happened.
    pub fn retarget(&mut self, rect: &TargetRect) -> bool {
        match self.target {
            Some(current) if current != *rect => {
                log::info!(
                    "target changed {}x{} -> {}x{}",
                    current.width(),
                    current.height(),
                    rect.width(),
                    rect.height()
                );
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Selected points in click order.
    pub fn points(&self) -> &[Point2<f32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.transform.is_some()
    }

    pub fn transform(&self) -> Option<&PlanarTransform> {
        self.transform.as_ref()
    }

    pub fn phase(&self) -> CalibrationPhase {
        if self.is_ready() {
            CalibrationPhase::Ready
        } else {
            CalibrationPhase::Collecting {
                selected: self.points.len(),
            }
        }
    }
}
