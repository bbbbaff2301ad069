use image::imageops::{self, FilterType};
use image::RgbImage;
use irtrack_calib::{CoordinateMapper, HomographyCalibrator};
use irtrack_core::{GrayImageView, TargetRect};
use irtrack_marker::overlay::{
    draw_marker, draw_segment, draw_text_above, gray_view_to_rgb, BLUE, CYAN, YELLOW,
};
use irtrack_marker::{MarkerDetector, MarkerDetectorParams};
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

const SELECTED_POINT_RADIUS: i32 = 8;
const SELECTED_LABEL_PX: f32 = 20.0;

/// Everything one frame produces for display and publishing.
#[derive(Clone, Debug)]
pub struct FrameResult {
    /// Raw frame with the selected calibration points.
    pub overview: RgbImage,
    /// Rectified view resized to the frame, or the detection view while
    /// uncalibrated.
    pub detail: RgbImage,
    /// All detected markers in raw sensor coordinates.
    pub markers: Vec<Point2<f32>>,
    /// Markers inside the target, in target coordinates. Empty while
    /// uncalibrated.
    pub in_bounds: Vec<Point2<f32>>,
    pub calibrated: bool,
}

impl FrameResult {
    /// Overview and detail panels next to each other.
    pub fn side_by_side(&self) -> RgbImage {
        let (ow, oh) = self.overview.dimensions();
        let (dw, dh) = self.detail.dimensions();
        let mut out = RgbImage::new(ow + dw, oh.max(dh));
        imageops::replace(&mut out, &self.overview, 0, 0);
        imageops::replace(&mut out, &self.detail, ow as i64, 0);
        out
    }
}

/// Runs detection and, once calibrated, rectification on each frame.
#[derive(Clone, Debug, Default)]
pub struct FrameCompositor {
    detector: MarkerDetector,
    mapper: CoordinateMapper,
}

impl FrameCompositor {
    pub fn new(params: MarkerDetectorParams) -> Self {
        let mapper = CoordinateMapper::from_marker_params(&params);
        Self {
            detector: MarkerDetector::new(params),
            mapper,
        }
    }

    pub fn detector(&self) -> &MarkerDetector {
        &self.detector
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip_all,
            fields(width = frame.width, height = frame.height, ready = calibrator.is_ready())
        )
    )]
    pub fn compose(
        &self,
        frame: &GrayImageView<'_>,
        calibrator: &HomographyCalibrator,
        rect: &TargetRect,
    ) -> FrameResult {
        let mut overview = gray_view_to_rgb(frame);
        draw_selected_points(&mut overview, calibrator.points());

        let detection = self.detector.detect(frame);

        let Some(transform) = calibrator.transform() else {
            return FrameResult {
                overview,
                detail: detection.visualization,
                markers: detection.markers,
                in_bounds: Vec::new(),
                calibrated: false,
            };
        };

        let mapped = self.mapper.map(frame, &detection.markers, transform, rect);
        let (w, h) = (frame.width as u32, frame.height as u32);
        let detail = if mapped.visualization.dimensions() == (w, h) {
            mapped.visualization
        } else {
            imageops::resize(&mapped.visualization, w, h, FilterType::Triangle)
        };

        FrameResult {
            overview,
            detail,
            markers: detection.markers,
            in_bounds: mapped.in_bounds,
            calibrated: true,
        }
    }
}

/// Numbered discs for the selected corners, joined in click order and closed
/// once all four are present.
fn draw_selected_points(img: &mut RgbImage, points: &[Point2<f32>]) {
    for (i, p) in points.iter().enumerate() {
        let at = Point2::new(p.x as i32, p.y as i32);
        draw_marker(img, at, SELECTED_POINT_RADIUS, BLUE);
        let label = (i + 1).to_string();
        draw_text_above(img, (at.x + 10, at.y - 10), &label, SELECTED_LABEL_PX, CYAN);
    }
    for pair in points.windows(2) {
        draw_segment(img, pair[0], pair[1], YELLOW);
    }
    if let [first, _, _, last] = points {
        draw_segment(img, *last, *first, YELLOW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use irtrack_core::GrayImage;

    fn frame_with_spot(w: usize, h: usize, cx: usize, cy: usize) -> GrayImage {
        let mut data = vec![0u8; w * h];
        for y in cy - 1..=cy + 1 {
            for x in cx - 1..=cx + 1 {
                data[y * w + x] = 255;
            }
        }
        GrayImage {
            width: w,
            height: h,
            data,
        }
    }

    #[test]
    fn uncalibrated_frame_shows_detection() {
        let frame = frame_with_spot(80, 60, 40, 30);
        let rect = TargetRect::new(100, 100).unwrap();
        let out = FrameCompositor::default().compose(
            &frame.view(),
            &HomographyCalibrator::new(),
            &rect,
        );
        assert!(!out.calibrated);
        assert_eq!(out.markers, vec![Point2::new(40.0, 30.0)]);
        assert!(out.in_bounds.is_empty());
        assert_eq!(out.detail.dimensions(), (80, 60));
        assert_eq!(out.detail.get_pixel(40, 30).0, [255, 0, 0]);
    }

    #[test]
    fn calibrated_detail_is_resized_to_the_frame() {
        let frame = frame_with_spot(80, 60, 40, 30);
        let rect = TargetRect::new(200, 100).unwrap();
        let mut cal = HomographyCalibrator::new();
        for p in [(10.0, 10.0), (70.0, 10.0), (70.0, 50.0), (10.0, 50.0)] {
            cal.add_point(Point2::new(p.0, p.1), &rect).unwrap();
        }
        let out = FrameCompositor::default().compose(&frame.view(), &cal, &rect);
        assert!(out.calibrated);
        assert_eq!(out.detail.dimensions(), (80, 60));
        assert_eq!(out.in_bounds.len(), 1);
        let q = out.in_bounds[0];
        assert_abs_diff_eq!(q.x, 99.5, epsilon = 0.5);
        assert_abs_diff_eq!(q.y, 49.5, epsilon = 0.5);
    }

    #[test]
    fn overview_marks_selected_points() {
        let frame = GrayImage {
            width: 64,
            height: 64,
            data: vec![0; 64 * 64],
        };
        let rect = TargetRect::new(64, 64).unwrap();
        let mut cal = HomographyCalibrator::new();
        cal.add_point(Point2::new(20.0, 20.0), &rect).unwrap();
        cal.add_point(Point2::new(50.0, 20.0), &rect).unwrap();

        let out = FrameCompositor::default().compose(&frame.view(), &cal, &rect);
        assert_eq!(out.overview.get_pixel(20, 25).0, BLUE.0);
        // segment between the two discs
        assert_eq!(out.overview.get_pixel(35, 20).0, YELLOW.0);
    }

    #[test]
    fn side_by_side_concatenates_panels() {
        let frame = frame_with_spot(30, 20, 10, 10);
        let rect = TargetRect::new(30, 20).unwrap();
        let out = FrameCompositor::default().compose(
            &frame.view(),
            &HomographyCalibrator::new(),
            &rect,
        );
        let combined = out.side_by_side();
        assert_eq!(combined.dimensions(), (60, 20));
        assert_eq!(combined.get_pixel(40, 10).0, [255, 0, 0]);
    }
}
