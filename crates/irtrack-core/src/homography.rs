use crate::{sample_bilinear_u8, GrayImage, GrayImageView};
use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// Planar projective transform acting on homogeneous pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    /// Build from row-major coefficients.
    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_fn(|r, c| rows[r][c]))
    }

    /// Apply with homogeneous division. Points on the horizon map to non-finite values.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        self.apply_homogeneous(p).0
    }

    /// Apply and also return the homogeneous scale `w` before division.
    ///
    /// The sign of `w` tells on which side of the horizon line `p` lies.
    #[inline]
    pub fn apply_homogeneous(&self, p: Point2<f32>) -> (Point2<f32>, f64) {
        let hv = self.h * Vector3::new(f64::from(p.x), f64::from(p.y), 1.0);
        let w = hv.z;
        let mapped = Point2::new((hv.x / w) as f32, (hv.y / w) as f32);
        (mapped, w)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Projective map sending the unit square `(0,0) (1,0) (1,1) (0,1)` onto
/// `quad`, in that order.
///
/// `None` when two adjacent edges of the quad are parallel.
fn unit_square_to_quad(quad: &[Point2<f32>; 4]) -> Option<Matrix3<f64>> {
    let [p0, p1, p2, p3] = quad.map(|p| (f64::from(p.x), f64::from(p.y)));

    let (sx, sy) = (p0.0 - p1.0 + p2.0 - p3.0, p0.1 - p1.1 + p2.1 - p3.1);
    let (e1x, e1y) = (p1.0 - p2.0, p1.1 - p2.1);
    let (e3x, e3y) = (p3.0 - p2.0, p3.1 - p2.1);

    let den = e1x * e3y - e3x * e1y;
    if den.abs() < 1e-12 {
        return None;
    }
    // A parallelogram has sx == sy == 0 and yields an affine map.
    let g = (sx * e3y - e3x * sy) / den;
    let h = (e1x * sy - sx * e1y) / den;

    Some(Matrix3::new(
        p1.0 - p0.0 + g * p1.0,
        p3.0 - p0.0 + h * p3.0,
        p0.0,
        p1.1 - p0.1 + g * p1.1,
        p3.1 - p0.1 + h * p3.1,
        p0.1,
        g,
        h,
        1.0,
    ))
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Both quads go through the unit square: `H = S_dst * S_src^-1`. Corner
/// order must agree between `src` and `dst`. Returns `None` for degenerate
/// quads or a non-finite result.
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let square_from_src = unit_square_to_quad(src)?.try_inverse()?;
    let dst_from_square = unit_square_to_quad(dst)?;

    let h = dst_from_square * square_from_src;
    let scale = h[(2, 2)];
    if scale.abs() < 1e-12 || h.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Homography::new(h / scale))
}

/// Render an `out_w` x `out_h` image by pulling every output pixel through
/// `h_src_from_dst` and sampling `src` bilinearly. Samples outside `src`
/// are black. A size whose pixel count overflows `usize` yields an empty
/// image.
pub fn warp_perspective_gray(
    src: &GrayImageView<'_>,
    h_src_from_dst: Homography,
    out_w: usize,
    out_h: usize,
) -> GrayImage {
    let Some(len) = out_w.checked_mul(out_h) else {
        log::warn!("warp size {out_w}x{out_h} overflows, returning an empty image");
        return GrayImage {
            width: 0,
            height: 0,
            data: Vec::new(),
        };
    };
    let mut data = vec![0u8; len];
    if out_w > 0 {
        for (y, row) in data.chunks_exact_mut(out_w).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                let at = h_src_from_dst.apply(Point2::new(x as f32, y as f32));
                *px = sample_bilinear_u8(src, at.x, at.y);
            }
        }
    }

    GrayImage {
        width: out_w,
        height: out_h,
        data,
    }
}
