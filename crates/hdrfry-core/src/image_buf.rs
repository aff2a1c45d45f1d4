use image::RgbImage;

/// Working RGB image buffer for the effect pipeline.
///
/// Pixel data is stored as interleaved RGBRGBRGB... in `f32`, using the same
/// 0..255 scale as the 8-bit images it is converted from. Keeping the
/// intermediate values in floating point lets chained stages avoid rounding
/// at every step; the pipeline clamps to [0, 255] between stages.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageBuf {
    pub width: u32,
    pub height: u32,
    /// Flat pixel data: [R, G, B, R, G, B, ...].
    pub data: Vec<f32>,
}

impl ImageBuf {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize * 3],
        }
    }

    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize * 3;
        anyhow::ensure!(
            data.len() == expected,
            "expected {expected} floats for {width}x{height} RGB, got {}",
            data.len()
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// A `width` x `height` image filled with one color.
    pub fn filled(width: u32, height: u32, rgb: [f32; 3]) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 3);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_rgb8(img: &RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.as_raw().iter().map(|&v| v as f32).collect(),
        }
    }

    /// Convert back to 8-bit RGB, clamping and rounding to nearest.
    pub fn to_rgb8(&self) -> RgbImage {
        let bytes: Vec<u8> = self.data.iter().map(|&v| to_u8(v)).collect();
        // Length is guaranteed by construction.
        RgbImage::from_raw(self.width, self.height, bytes)
            .unwrap_or_else(|| RgbImage::new(self.width, self.height))
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Offset of pixel (x, y) into `data`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 3] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Row stride in floats.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * 3
    }

    /// Clamp every channel into the displayable [0, 255] range.
    /// Non-finite values collapse to 0.
    pub fn clamp_in_place(&mut self) {
        for v in &mut self.data {
            *v = if v.is_finite() { v.clamp(0.0, 255.0) } else { 0.0 };
        }
    }

    pub fn is_in_range(&self) -> bool {
        self.data
            .iter()
            .all(|v| v.is_finite() && (0.0..=255.0).contains(v))
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    if v.is_finite() {
        v.clamp(0.0, 255.0).round() as u8
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_buf_dimensions() {
        let buf = ImageBuf::new(100, 50);
        assert_eq!(buf.data.len(), 100 * 50 * 3);
        assert_eq!(buf.pixel_count(), 5000);
    }

    #[test]
    fn from_data_validates_length() {
        let ok = ImageBuf::from_data(2, 2, vec![0.0; 12]);
        assert!(ok.is_ok());

        let bad = ImageBuf::from_data(2, 2, vec![0.0; 10]);
        assert!(bad.is_err());
    }

    #[test]
    fn rgb8_conversion_is_lossless() {
        let img = RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8 * 80, y as u8 * 100, 7]));
        let buf = ImageBuf::from_rgb8(&img);
        assert_eq!(buf.width, 3);
        assert_eq!(buf.height, 2);
        assert_eq!(buf.to_rgb8(), img);
    }

    #[test]
    fn to_rgb8_rounds_and_clamps() {
        let buf = ImageBuf::from_data(2, 1, vec![-12.0, 300.0, 127.6, 0.4, f32::NAN, 254.5])
            .unwrap();
        let out = buf.to_rgb8();
        assert_eq!(out.as_raw(), &vec![0, 255, 128, 0, 0, 255]);
    }

    #[test]
    fn clamp_in_place_bounds_every_channel() {
        let mut buf =
            ImageBuf::from_data(2, 1, vec![-1.0, 256.0, 10.0, f32::INFINITY, 0.0, 255.0]).unwrap();
        buf.clamp_in_place();
        assert!(buf.is_in_range());
        assert_eq!(buf.data, vec![0.0, 255.0, 10.0, 0.0, 0.0, 255.0]);
    }

    #[test]
    fn pixel_indexing() {
        let mut buf = ImageBuf::new(4, 3);
        let i = buf.index(2, 1);
        buf.data[i] = 9.0;
        assert_eq!(buf.pixel(2, 1), [9.0, 0.0, 0.0]);
        assert_eq!(buf.stride(), 12);
    }

    #[test]
    fn from_data_zero_dimensions() {
        let buf = ImageBuf::from_data(0, 0, vec![]).unwrap();
        assert_eq!(buf.pixel_count(), 0);
        assert!(buf.is_empty());
    }
}
