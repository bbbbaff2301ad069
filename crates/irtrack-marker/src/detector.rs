use image::{imageops, GrayImage as LumaImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::point::Point;
use irtrack_core::GrayImageView;
use nalgebra::Point2;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::moments::ContourMoments;
use crate::overlay::{annotate_point, luma_to_rgb};
use crate::params::MarkerDetectorParams;

/// Output of one detector run.
#[derive(Clone, Debug)]
pub struct MarkerDetection {
    /// Centroids in raw sensor coordinates, in contour discovery order.
    pub markers: Vec<Point2<f32>>,
    /// Binarized frame in RGB with every accepted centroid annotated.
    pub visualization: RgbImage,
}

/// Bright point marker detector.
///
/// Stateless between frames: every call is a pure function of the frame and
/// the parameters.
#[derive(Clone, Debug, Default)]
pub struct MarkerDetector {
    params: MarkerDetectorParams,
}

impl MarkerDetector {
    pub fn new(params: MarkerDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MarkerDetectorParams {
        &self.params
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width, height = frame.height))
    )]
    pub fn detect(&self, frame: &GrayImageView<'_>) -> MarkerDetection {
        let binary = self.binarize(frame);

        let mut visualization = luma_to_rgb(&binary);
        let mut markers = Vec::new();
        let mut degenerate = 0usize;

        // The border follower never starts a contour in column 0, so blobs
        // touching the frame edge are traced on a copy with a 1 px margin.
        let padded = pad_with_background(&binary);
        for contour in find_contours::<i32>(&padded) {
            // outer borders without a parent are the external contours
            if !matches!(contour.border_type, BorderType::Outer) || contour.parent.is_some() {
                continue;
            }
            let points: Vec<Point<i32>> = contour
                .points
                .iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            let Some(c) = ContourMoments::from_contour(&points).centroid() else {
                degenerate += 1;
                continue;
            };
            markers.push(Point2::new(c.x as f32, c.y as f32));
            annotate_point(
                &mut visualization,
                c,
                self.params.marker_radius,
                self.params.draw_labels,
            );
        }

        if degenerate > 0 {
            log::debug!("skipped {degenerate} zero-area contour(s)");
        }
        log::trace!("detected {} marker(s)", markers.len());

        MarkerDetection {
            markers,
            visualization,
        }
    }

    /// Dilated and thresholded frame, 255 for foreground and 0 elsewhere.
    ///
    /// Thresholding commutes with a max filter, so thresholding first and
    /// then growing the foreground by the Chebyshev radius equals grayscale
    /// dilation with a square element followed by thresholding.
    pub fn binarize(&self, frame: &GrayImageView<'_>) -> LumaImage {
        let threshold = self.params.threshold;
        let mask = LumaImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
            let v = frame.get(x as usize, y as usize).unwrap_or(0);
            Luma([if v >= threshold { 255 } else { 0 }])
        });
        match self.params.dilate_iterations {
            0 => mask,
            k => dilate(&mask, Norm::LInf, k),
        }
    }
}

fn pad_with_background(mask: &LumaImage) -> LumaImage {
    let mut padded = LumaImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    padded
}
