use irtrack_core::{homography_from_4pt, Homography, TargetRect};
use nalgebra::Point2;
use serde::Serialize;

use crate::error::CalibrationError;

/// Relative tolerance for the corner turn test; a turn whose cross product is
/// below this fraction of the edge lengths counts as straight.
const COLLINEAR_EPS: f64 = 1e-6;

/// Raw sensor to rectified target mapping produced by a completed calibration.
///
/// Besides the forward homography this keeps its inverse for warping and the
/// sign of the homogeneous scale on the calibrated side of the horizon.
/// Points with the opposite sign project through the horizon and are never
/// reported.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlanarTransform {
    target_from_raw: Homography,
    raw_from_target: Homography,
    front_sign: f64,
}

impl PlanarTransform {
    /// Wrap `target_from_raw`, treating the side of the horizon that contains
    /// `reference` as the visible one.
    pub fn new(
        target_from_raw: Homography,
        reference: Point2<f32>,
    ) -> Result<Self, CalibrationError> {
        let raw_from_target = target_from_raw
            .inverse()
            .ok_or(CalibrationError::SingularTransform)?;
        let (_, w) = target_from_raw.apply_homogeneous(reference);
        if !w.is_finite() || w == 0.0 {
            return Err(CalibrationError::SingularTransform);
        }
        Ok(Self {
            target_from_raw,
            raw_from_target,
            front_sign: w.signum(),
        })
    }

    /// Solve the transform sending `corners` (TL, TR, BR, BL) onto the
    /// corners of `rect`.
    pub fn from_corners(
        corners: &[Point2<f32>; 4],
        rect: &TargetRect,
    ) -> Result<Self, CalibrationError> {
        check_quad(corners)?;
        let h = homography_from_4pt(corners, &rect.corners())
            .ok_or(CalibrationError::SingularTransform)?;

        let n = corners.len() as f32;
        let center = corners
            .iter()
            .fold(Point2::origin(), |acc: Point2<f32>, p| {
                Point2::new(acc.x + p.x / n, acc.y + p.y / n)
            });
        Self::new(h, center)
    }

    pub fn target_from_raw(&self) -> Homography {
        self.target_from_raw
    }

    pub fn raw_from_target(&self) -> Homography {
        self.raw_from_target
    }

    /// Map one raw point, or `None` when it lies on or behind the horizon.
    pub fn map_point(&self, p: Point2<f32>) -> Option<Point2<f32>> {
        let (q, w) = self.target_from_raw.apply_homogeneous(p);
        if w * self.front_sign <= 0.0 || !q.x.is_finite() || !q.y.is_finite() {
            return None;
        }
        Some(q)
    }
}

/// Reject repeated, collinear, self-crossing and concave corner sets.
///
/// Walking the quad in click order, every corner must turn the same way.
fn check_quad(corners: &[Point2<f32>; 4]) -> Result<(), CalibrationError> {
    let mut orientation = 0.0_f64;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let c = corners[(i + 2) % 4];
        let (e1x, e1y) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
        let (e2x, e2y) = ((c.x - b.x) as f64, (c.y - b.y) as f64);
        let cross = e1x * e2y - e1y * e2x;
        let scale = e1x.hypot(e1y) * e2x.hypot(e2y);
        if scale == 0.0 || cross.abs() <= COLLINEAR_EPS * scale {
            return Err(CalibrationError::CollinearCorners {
                corner: (i + 1) % 4,
            });
        }
        if orientation == 0.0 {
            orientation = cross.signum();
        } else if cross.signum() != orientation {
            return Err(CalibrationError::NotConvex);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rect() -> TargetRect {
        TargetRect::new(1024, 768).unwrap()
    }

    #[test]
    fn sensor_quad_maps_onto_target_corners() {
        let raw = [
            Point2::new(10.0, 10.0),
            Point2::new(630.0, 12.0),
            Point2::new(628.0, 470.0),
            Point2::new(8.0, 468.0),
        ];
        let t = PlanarTransform::from_corners(&raw, &rect()).unwrap();
        for (p, q) in raw.iter().zip(rect().corners()) {
            let m = t.map_point(*p).unwrap();
            assert_abs_diff_eq!(m.x, q.x, epsilon = 1e-2);
            assert_abs_diff_eq!(m.y, q.y, epsilon = 1e-2);
        }
    }

    #[test]
    fn repeated_and_collinear_corners_are_rejected() {
        let repeated = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        assert!(matches!(
            PlanarTransform::from_corners(&repeated, &rect()),
            Err(CalibrationError::CollinearCorners { .. })
        ));

        let collinear = [
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        assert_eq!(
            PlanarTransform::from_corners(&collinear, &rect()),
            Err(CalibrationError::CollinearCorners { corner: 1 })
        );
    }

    #[test]
    fn crossing_and_concave_quads_are_rejected() {
        // TL, TR, BL, BR: the edges cross in the middle
        let bow_tie = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(0.0, 100.0),
            Point2::new(100.0, 100.0),
        ];
        assert_eq!(
            PlanarTransform::from_corners(&bow_tie, &rect()),
            Err(CalibrationError::NotConvex)
        );

        let dart = [
            Point2::new(0.0, 0.0),
            Point2::new(100.0, 0.0),
            Point2::new(30.0, 30.0),
            Point2::new(0.0, 100.0),
        ];
        assert_eq!(
            PlanarTransform::from_corners(&dart, &rect()),
            Err(CalibrationError::NotConvex)
        );
    }

    #[test]
    fn points_behind_the_horizon_are_not_mapped() {
        // w = 1 - 0.01 x turns negative for x > 100
        let h = Homography::from_array([[1.0, 0.0, -500.0], [0.0, 1.0, -500.0], [-0.01, 0.0, 1.0]]);
        let t = PlanarTransform::new(h, Point2::new(0.0, 0.0)).unwrap();

        // (300,300) divides to (100,100), inside the target, but with w = -2
        assert_eq!(h.apply(Point2::new(300.0, 300.0)), Point2::new(100.0, 100.0));
        assert_eq!(t.map_point(Point2::new(300.0, 300.0)), None);
        assert_eq!(t.map_point(Point2::new(100.0, 0.0)), None);
        assert_eq!(
            t.map_point(Point2::new(50.0, 600.0)),
            Some(Point2::new(-900.0, 200.0))
        );
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let h = Homography::from_array([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert_eq!(
            PlanarTransform::new(h, Point2::new(1.0, 1.0)),
            Err(CalibrationError::SingularTransform)
        );
    }
}
