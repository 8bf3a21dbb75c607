use std::path::Path;

use image::{GrayImage, ImageFormat, Luma};

use crate::error::Result;
use crate::frame::Frame;

/// Render a frame as 8-bit grayscale with a linear min/max stretch.
///
/// Non-finite samples render black. A flat frame renders black.
pub fn render_preview(frame: &Frame) -> GrayImage {
    let data = frame.data.to_f64();
    let (lo, hi) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = hi - lo;

    let mut img = GrayImage::new(frame.width() as u32, frame.height() as u32);
    for ((row, col), &v) in data.indexed_iter() {
        let level = if span > 0.0 && v.is_finite() {
            ((v - lo) / span * 255.0).round() as u8
        } else {
            0
        };
        img.put_pixel(col as u32, row as u32, Luma([level]));
    }
    img
}

/// Save a quick-look PNG of `frame`.
pub fn save_preview(frame: &Frame, path: &Path) -> Result<()> {
    render_preview(frame).save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
