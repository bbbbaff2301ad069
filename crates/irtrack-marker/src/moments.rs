//! Spatial moments of a closed contour polygon.

use imageproc::point::Point;
use nalgebra::Point2;

/// Zeroth and first-order moments of a contour, integrated over the enclosed
/// polygon area (Green's theorem).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContourMoments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

impl ContourMoments {
    /// Moments of the polygon through `points`, closed back to the first point.
    ///
    /// The result does not depend on traversal direction. Fewer than three
    /// points, or collinear points, give `m00 == 0`.
    pub fn from_contour(points: &[Point<i32>]) -> Self {
        if points.len() < 3 {
            return Self::default();
        }

        let mut m00 = 0.0_f64;
        let mut m10 = 0.0_f64;
        let mut m01 = 0.0_f64;
        let n = points.len();
        for k in 0..n {
            let a = points[k];
            let b = points[(k + 1) % n];
            let (xa, ya) = (a.x as f64, a.y as f64);
            let (xb, yb) = (b.x as f64, b.y as f64);
            let cross = xa * yb - xb * ya;
            m00 += cross;
            m10 += (xa + xb) * cross;
            m01 += (ya + yb) * cross;
        }
        m00 *= 0.5;
        m10 /= 6.0;
        m01 /= 6.0;

        if m00 < 0.0 {
            m00 = -m00;
            m10 = -m10;
            m01 = -m01;
        }
        Self { m00, m10, m01 }
    }

    /// Centroid truncated toward zero, or `None` for a zero-area contour.
    pub fn centroid(&self) -> Option<Point2<i32>> {
        if self.m00 == 0.0 {
            return None;
        }
        let cx = self.m10 / self.m00;
        let cy = self.m01 / self.m00;
        Some(Point2::new(cx as i32, cy as i32))
    }
}
