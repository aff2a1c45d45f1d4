use image::RgbImage;
use image::imageops::{self, FilterType};
use tracing::debug;

use crate::image_buf::ImageBuf;

/// Longest preview edge used when nothing else is configured.
pub const DEFAULT_MAX_EDGE: u32 = 600;

/// Dimensions that fit `(width, height)` inside `max_edge` on the longer
/// side, keeping the aspect ratio. Never returns a zero dimension.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let max_edge = max_edge.max(1);
    let longest = width.max(height);
    if longest <= max_edge {
        return (width, height);
    }
    let scale = max_edge as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_edge);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_edge);
    (w, h)
}

/// Downsample `img` with Lanczos3 so its longer side is at most `max_edge`.
///
/// Images already within bounds come back as an independent copy.
pub fn scale(img: &RgbImage, max_edge: u32) -> RgbImage {
    let (w, h) = fit_within(img.width(), img.height(), max_edge);
    if (w, h) == img.dimensions() {
        return img.clone();
    }
    debug!(
        from_w = img.width(),
        from_h = img.height(),
        to_w = w,
        to_h = h,
        "scaling preview"
    );
    imageops::resize(img, w, h, FilterType::Lanczos3)
}

/// Scale and convert to the pipeline's working format in one step.
pub fn working_copy(img: &RgbImage, max_edge: u32) -> ImageBuf {
    ImageBuf::from_rgb8(&scale(img, max_edge))
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn fit_keeps_aspect() {
        assert_eq!(fit_within(1200, 800, 600), (600, 400));
        assert_eq!(fit_within(800, 1200, 600), (400, 600));
        assert_eq!(fit_within(600, 600, 600), (600, 600));
        assert_eq!(fit_within(300, 200, 600), (300, 200));
    }

    #[test]
    fn fit_never_collapses() {
        assert_eq!(fit_within(10_000, 2, 600), (600, 1));
        assert_eq!(fit_within(50, 50, 0), (1, 1));
    }

    #[test]
    fn small_image_is_copied() {
        let img = RgbImage::from_pixel(40, 30, Rgb([1, 2, 3]));
        let mut copy = scale(&img, 600);
        assert_eq!(copy, img);
        copy.put_pixel(0, 0, Rgb([9, 9, 9]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn large_image_is_bounded() {
        let img = RgbImage::from_pixel(1500, 900, Rgb([120, 60, 30]));
        let small = scale(&img, 600);
        assert_eq!(small.dimensions(), (600, 360));
        // Lanczos on a flat image stays flat.
        let p = small.get_pixel(300, 180);
        assert!((p[0] as i32 - 120).abs() <= 1);
    }

    #[test]
    fn working_copy_matches_scaled_dims() {
        let img = RgbImage::from_pixel(1000, 100, Rgb([5, 5, 5]));
        let buf = working_copy(&img, 600);
        assert_eq!((buf.width, buf.height), (600, 60));
    }
}
