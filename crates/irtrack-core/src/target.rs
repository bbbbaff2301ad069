use nalgebra::Point2;
use serde::Serialize;

/// Largest accepted side of the target rectangle in pixels.
pub const MAX_TARGET_SIDE: u32 = 16_384;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRectError {
    #[error("target rectangle must have positive dimensions (width={width}, height={height})")]
    Empty { width: u32, height: u32 },
    #[error("target rectangle {width}x{height} exceeds {MAX_TARGET_SIDE} px per side")]
    TooLarge { width: u32, height: u32 },
}

/// Extent of the rectified coordinate space.
///
/// Valid coordinates are the half-open ranges `0 <= x < width` and
/// `0 <= y < height`, matching pixel-grid semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TargetRect {
    width: u32,
    height: u32,
}

impl TargetRect {
    pub fn new(width: u32, height: u32) -> Result<Self, TargetRectError> {
        if width == 0 || height == 0 {
            return Err(TargetRectError::Empty { width, height });
        }
        if width > MAX_TARGET_SIDE || height > MAX_TARGET_SIDE {
            return Err(TargetRectError::TooLarge { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Destination corners in calibration click order: TL, TR, BR, BL.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        let w = (self.width - 1) as f32;
        let h = (self.height - 1) as f32;
        [
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    /// Half-open bounds test. Non-finite coordinates are never contained.
    #[inline]
    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x < self.width as f32 && p.y < self.height as f32
    }
}
