use image::RgbImage;
use irtrack_core::{warp_perspective_gray, GrayImageView, TargetRect};
use irtrack_marker::overlay::{annotate_point, gray_to_rgb};
use irtrack_marker::MarkerDetectorParams;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::transform::PlanarTransform;

/// Markers expressed in target coordinates, plus the rectified view.
#[derive(Clone, Debug)]
pub struct MappedFrame {
    /// Transformed markers inside the target, in detection order.
    pub in_bounds: Vec<Point2<f32>>,
    /// Frame warped onto the target rectangle with every kept marker drawn.
    pub visualization: RgbImage,
}

/// Projects raw sensor detections into the calibrated target rectangle.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    pub marker_radius: i32,
    pub draw_labels: bool,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::from_marker_params(&MarkerDetectorParams::default())
    }
}

impl CoordinateMapper {
    /// Mapper whose annotations match the detector's.
    pub fn from_marker_params(params: &MarkerDetectorParams) -> Self {
        Self {
            marker_radius: params.marker_radius,
            draw_labels: params.draw_labels,
        }
    }

    /// Transform `markers` and keep those with `0 <= x < W` and `0 <= y < H`.
    ///
    /// Points that fall behind the horizon of `transform` are dropped too.
    pub fn map_points(
        &self,
        markers: &[Point2<f32>],
        transform: &PlanarTransform,
        rect: &TargetRect,
    ) -> Vec<Point2<f32>> {
        markers
            .iter()
            .filter_map(|p| transform.map_point(*p))
            .filter(|q| rect.contains(*q))
            .collect()
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(markers = markers.len()))
    )]
    pub fn map(
        &self,
        frame: &GrayImageView<'_>,
        markers: &[Point2<f32>],
        transform: &PlanarTransform,
        rect: &TargetRect,
    ) -> MappedFrame {
        let in_bounds = self.map_points(markers, transform, rect);
        if in_bounds.len() < markers.len() {
            log::trace!(
                "{} of {} marker(s) outside the target",
                markers.len() - in_bounds.len(),
                markers.len()
            );
        }

        let warped = warp_perspective_gray(
            frame,
            transform.raw_from_target(),
            rect.width() as usize,
            rect.height() as usize,
        );
        let mut visualization = gray_to_rgb(&warped);
        for q in &in_bounds {
            annotate_point(
                &mut visualization,
                Point2::new(q.x as i32, q.y as i32),
                self.marker_radius,
                self.draw_labels,
            );
        }

        MappedFrame {
            in_bounds,
            visualization,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irtrack_core::{GrayImage, Homography};

    fn identity() -> PlanarTransform {
        PlanarTransform::new(
            Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]),
            Point2::new(0.0, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn bounds_are_half_open() {
        let rect = TargetRect::new(1024, 768).unwrap();
        let markers = [
            Point2::new(0.0, 0.0),
            Point2::new(1024.0, 0.0),
            Point2::new(0.0, 768.0),
            Point2::new(-1.0, 400.0),
            Point2::new(1023.5, 767.5),
        ];
        let kept = CoordinateMapper::default().map_points(&markers, &identity(), &rect);
        assert_eq!(kept, vec![Point2::new(0.0, 0.0), Point2::new(1023.5, 767.5)]);
    }

    #[test]
    fn detection_order_is_preserved() {
        let rect = TargetRect::new(100, 100).unwrap();
        let markers = [
            Point2::new(90.0, 10.0),
            Point2::new(500.0, 10.0),
            Point2::new(10.0, 90.0),
            Point2::new(50.0, 50.0),
        ];
        let kept = CoordinateMapper::default().map_points(&markers, &identity(), &rect);
        assert_eq!(
            kept,
            vec![
                Point2::new(90.0, 10.0),
                Point2::new(10.0, 90.0),
                Point2::new(50.0, 50.0)
            ]
        );
    }

    #[test]
    fn visualization_has_target_size_and_marks() {
        let frame = GrayImage {
            width: 64,
            height: 48,
            data: vec![40; 64 * 48],
        };
        let rect = TargetRect::new(32, 24).unwrap();
        let mapper = CoordinateMapper {
            marker_radius: 2,
            draw_labels: false,
        };
        let out = mapper.map(&frame.view(), &[Point2::new(10.0, 10.0)], &identity(), &rect);
        assert_eq!(out.visualization.dimensions(), (32, 24));
        assert_eq!(out.visualization.get_pixel(10, 10).0, [255, 0, 0]);
        assert_eq!(out.visualization.get_pixel(20, 20).0, [40, 40, 40]);
    }

    #[test]
    fn nothing_is_kept_without_markers() {
        let frame = GrayImage {
            width: 8,
            height: 8,
            data: vec![0; 64],
        };
        let rect = TargetRect::new(8, 8).unwrap();
        let out = CoordinateMapper::default().map(&frame.view(), &[], &identity(), &rect);
        assert!(out.in_bounds.is_empty());
    }
}
