/// Errors returned when wrapping a raw grayscale buffer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid grayscale image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
}

/// Borrowed single-channel 8-bit frame.
///
/// This is the only form in which the pipeline sees sensor data: it reads the
/// buffer during one call and never keeps it.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

impl<'a> GrayImageView<'a> {
    /// Wrap a row-major buffer, checking that it holds exactly `width * height` bytes.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .ok_or(ImageError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }
}

/// Owned single-channel 8-bit image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Pixel at integer coordinates; outside the image, or past the end of a
/// short buffer, reads as zero.
#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    match (usize::try_from(x), usize::try_from(y)) {
        (Ok(x), Ok(y)) => src.get(x, y).unwrap_or(0),
        _ => 0,
    }
}

/// Bilinear sample; pixels outside the image read as zero.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    // Also rejects NaN and keeps the integer neighbours below overflow.
    if !(x > -1.0 && y > -1.0 && x < src.width as f32 && y < src.height as f32) {
        return 0.0;
    }
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_view_rejects_short_buffer() {
        let data = [0u8; 5];
        let err = GrayImageView::new(2, 3, &data).unwrap_err();
        assert_eq!(
            err,
            ImageError::InvalidBuffer {
                expected: 6,
                got: 5
            }
        );
    }

    #[test]
    fn checked_view_rejects_zero_dimension() {
        let err = GrayImageView::new(0, 3, &[]).unwrap_err();
        assert!(matches!(err, ImageError::InvalidDimensions { .. }));
    }

    #[test]
    fn bilinear_interpolates_between_neighbours() {
        let data = [0u8, 100, 0, 100];
        let view = GrayImageView::new(2, 2, &data).expect("view");
        assert_eq!(sample_bilinear(&view, 0.5, 0.0), 50.0);
        assert_eq!(sample_bilinear_u8(&view, 1.0, 1.0), 100);
    }

    #[test]
    fn samples_outside_read_as_black() {
        let data = [255u8; 4];
        let view = GrayImageView::new(2, 2, &data).expect("view");
        assert_eq!(sample_bilinear_u8(&view, -5.0, 0.0), 0);
        assert_eq!(sample_bilinear_u8(&view, f32::NAN, 0.0), 0);
    }

    #[test]
    fn unchecked_short_view_samples_as_black() {
        let data = [200u8; 3];
        let view = GrayImageView {
            width: 4,
            height: 4,
            data: &data,
        };
        assert_eq!(sample_bilinear_u8(&view, 1.0, 0.0), 200);
        assert_eq!(sample_bilinear_u8(&view, 2.0, 2.0), 0);
    }
}
