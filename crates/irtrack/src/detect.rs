//! One-shot helpers taking `image` crate buffers.

use crate::core::{GrayImageView, ImageError};
use crate::marker::{MarkerDetection, MarkerDetector, MarkerDetectorParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Borrow an `image::GrayImage` as a core frame view.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Checked view over a raw row-major 8-bit buffer, e.g. straight from a
/// sensor driver.
pub fn frame_from_raw(width: usize, height: usize, data: &[u8]) -> Result<GrayImageView<'_>, ImageError> {
    GrayImageView::new(width, height, data)
}

/// Run the marker detector on a decoded image.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(img, params), fields(width = img.width(), height = img.height()))
)]
pub fn detect_markers(img: &::image::GrayImage, params: MarkerDetectorParams) -> MarkerDetection {
    MarkerDetector::new(params).detect(&gray_view(img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage as LumaImage, Luma};
    use nalgebra::Point2;

    #[test]
    fn detects_on_image_buffers() {
        let mut img = LumaImage::new(40, 40);
        for y in 9..=11 {
            for x in 19..=21 {
                img.put_pixel(x, y, Luma([230]));
            }
        }
        let det = detect_markers(&img, MarkerDetectorParams::default());
        assert_eq!(det.markers, vec![Point2::new(20.0, 10.0)]);
    }

    #[test]
    fn raw_buffers_are_checked() {
        assert!(frame_from_raw(4, 4, &[0; 16]).is_ok());
        assert_eq!(
            frame_from_raw(4, 4, &[0; 15]).unwrap_err(),
            ImageError::InvalidBuffer {
                expected: 16,
                got: 15
            }
        );
    }
}
