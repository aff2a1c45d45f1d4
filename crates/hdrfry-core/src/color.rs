//! Per-pixel color math shared by the effect stages.
//!
//! The four "enhancer" operations follow the classic blend model: build a
//! degenerate version of the image, then extrapolate away from it,
//! `out = degenerate + factor * (image - degenerate)`. A factor of 1.0
//! returns the image, 0.0 returns the degenerate image.

use crate::image_buf::ImageBuf;

/// Broadcast (Rec. 601) luma on the 0..255 scale.
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

#[inline]
pub fn channel_mean(p: &[f32]) -> f32 {
    (p[0] + p[1] + p[2]) / 3.0
}

/// Population standard deviation across the three channels of one pixel.
#[inline]
pub fn channel_std(p: &[f32]) -> f32 {
    let mean = channel_mean(p);
    let var = ((p[0] - mean).powi(2) + (p[1] - mean).powi(2) + (p[2] - mean).powi(2)) / 3.0;
    var.sqrt()
}

#[inline]
fn blend(degenerate: f32, value: f32, factor: f32) -> f32 {
    degenerate + factor * (value - degenerate)
}

/// Push colors away from (or toward) their own gray.
pub fn enhance_color(buf: &mut ImageBuf, factor: f32) {
    for pixel in buf.data.chunks_exact_mut(3) {
        let y = luma(pixel[0], pixel[1], pixel[2]);
        for c in pixel.iter_mut() {
            *c = blend(y, *c, factor);
        }
    }
}

/// Mean luma of the whole image rounded to the nearest integer level.
pub fn mean_luma(buf: &ImageBuf) -> f32 {
    if buf.pixel_count() == 0 {
        return 0.0;
    }
    let sum: f64 = buf
        .data
        .chunks_exact(3)
        .map(|p| luma(p[0], p[1], p[2]) as f64)
        .sum();
    (sum / buf.pixel_count() as f64 + 0.5).floor() as f32
}

/// Stretch (or flatten) values around the image's mean luma.
pub fn enhance_contrast(buf: &mut ImageBuf, factor: f32) {
    let mean = mean_luma(buf);
    for v in &mut buf.data {
        *v = blend(mean, *v, factor);
    }
}

/// Scale toward (or away from) black.
pub fn enhance_brightness(buf: &mut ImageBuf, factor: f32) {
    for v in &mut buf.data {
        *v *= factor;
    }
}

/// Extrapolate away from a 3x3 smoothed copy. Factors above 1.0 sharpen,
/// below 1.0 soften.
pub fn enhance_sharpness(buf: &mut ImageBuf, factor: f32) {
    let smoothed = crate::filters::smooth3x3(buf);
    for (v, s) in buf.data.iter_mut().zip(smoothed.data.iter()) {
        *v = blend(*s, *v, factor);
    }
}
