//! Annotation helpers for the visualization panels.
//!
//! Labels are rendered with the bundled DejaVu Sans Mono font.

use std::sync::OnceLock;

use ab_glyph::{FontRef, PxScale};
use image::{GrayImage as LumaImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use irtrack_core::{GrayImage, GrayImageView};
use nalgebra::Point2;

pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const CYAN: Rgb<u8> = Rgb([0, 255, 255]);
pub const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

/// Pixel height of marker coordinate labels.
pub const LABEL_PX: f32 = 14.0;

static FONT_DATA: &[u8] = include_bytes!("../resources/DejaVuSansMono.ttf");

/// Bundled monospace label font, parsed once.
pub fn label_font() -> Option<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| match FontRef::try_from_slice(FONT_DATA) {
        Ok(font) => Some(font),
        Err(err) => {
            log::warn!("label font unusable, labels disabled: {err}");
            None
        }
    })
    .as_ref()
}

/// Draw `text` `px` pixels tall with its top-left corner at `origin`.
/// Glyphs falling outside the canvas are clipped.
pub fn draw_text(img: &mut RgbImage, origin: (i32, i32), text: &str, px: f32, color: Rgb<u8>) {
    if let Some(font) = label_font() {
        draw_text_mut(img, color, origin.0, origin.1, PxScale::from(px), font, text);
    }
}

/// Draw `text` so that its line box ends on row `anchor.1`.
pub fn draw_text_above(img: &mut RgbImage, anchor: (i32, i32), text: &str, px: f32, color: Rgb<u8>) {
    draw_text(img, (anchor.0, anchor.1 - px.ceil() as i32), text, px, color);
}

/// Filled disc at `center`.
pub fn draw_marker(img: &mut RgbImage, center: Point2<i32>, radius: i32, color: Rgb<u8>) {
    draw_filled_circle_mut(img, (center.x, center.y), radius, color);
}

/// `(x,y)` label placed up and to the right of `at`.
pub fn draw_coordinate_label(img: &mut RgbImage, at: Point2<i32>, color: Rgb<u8>) {
    let text = format!("({},{})", at.x, at.y);
    draw_text_above(img, (at.x + 10, at.y - 5), &text, LABEL_PX, color);
}

/// Marker disc plus its coordinate label.
pub fn annotate_point(img: &mut RgbImage, at: Point2<i32>, radius: i32, draw_label: bool) {
    draw_marker(img, at, radius, RED);
    if draw_label {
        draw_coordinate_label(img, at, GREEN);
    }
}

pub fn draw_segment(img: &mut RgbImage, a: Point2<f32>, b: Point2<f32>, color: Rgb<u8>) {
    draw_line_segment_mut(img, (a.x, a.y), (b.x, b.y), color);
}

/// Replicate a borrowed grayscale frame into three channels.
pub fn gray_view_to_rgb(view: &GrayImageView<'_>) -> RgbImage {
    RgbImage::from_fn(view.width as u32, view.height as u32, |x, y| {
        let v = view.get(x as usize, y as usize).unwrap_or(0);
        Rgb([v, v, v])
    })
}

pub fn gray_to_rgb(img: &GrayImage) -> RgbImage {
    gray_view_to_rgb(&img.view())
}

pub fn luma_to_rgb(img: &LumaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let Luma([v]) = *img.get_pixel(x, y);
        Rgb([v, v, v])
    })
}
