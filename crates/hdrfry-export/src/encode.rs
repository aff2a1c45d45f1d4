use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageResult, RgbImage};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// Lossy, 4:4:4 chroma.
    Jpeg,
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
        }
    }

    /// Format implied by a file's extension, if it names one we write.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "png" => Ok(ExportFormat::Png),
            other => Err(format!("unsupported export format `{other}` (expected jpg or png)")),
        }
    }
}

/// Encode `img` into an in-memory file of the given format.
pub fn encode(img: &RgbImage, format: ExportFormat, jpeg_quality: u8) -> ImageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Jpeg => {
            // The image crate's encoder never subsamples chroma.
            let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality.clamp(1, 100));
            img.write_with_encoder(encoder)?;
        }
        ExportFormat::Png => {
            img.write_with_encoder(PngEncoder::new(&mut bytes))?;
        }
    }
    debug!(%format, size = bytes.len(), "encoded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JPG")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("a.jpeg")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("dir/a.png")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("a.webp")), None);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn png_is_lossless() {
        let img = RgbImage::from_fn(9, 7, |x, y| Rgb([x as u8 * 20, y as u8 * 30, 7]));
        let bytes = encode(&img, ExportFormat::Png, 98).unwrap();
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        assert_eq!(back, img);
    }

    #[test]
    fn jpeg_high_quality_is_close() {
        let img = RgbImage::from_pixel(16, 16, Rgb([180, 90, 40]));
        let bytes = encode(&img, ExportFormat::Jpeg, 98).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let back = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let p = back.get_pixel(8, 8);
        assert!((p[0] as i32 - 180).abs() <= 3);
        assert!((p[1] as i32 - 90).abs() <= 3);
        assert!((p[2] as i32 - 40).abs() <= 3);
    }

    /// Sampling factor bytes of each component in the first SOF segment.
    fn sof_sampling(bytes: &[u8]) -> Vec<u8> {
        let mut i = 2;
        while i + 4 <= bytes.len() {
            assert_eq!(bytes[i], 0xFF, "lost segment sync at {i}");
            let marker = bytes[i + 1];
            let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
            if (0xC0..=0xC2).contains(&marker) {
                let count = bytes[i + 9] as usize;
                return (0..count).map(|c| bytes[i + 11 + 3 * c]).collect();
            }
            i += 2 + len;
        }
        panic!("no SOF segment");
    }

    #[test]
    fn jpeg_chroma_is_not_subsampled() {
        let img = RgbImage::from_fn(24, 16, |x, y| Rgb([x as u8 * 10, y as u8 * 15, 200]));
        for quality in [10, 100] {
            let bytes = encode(&img, ExportFormat::Jpeg, quality).unwrap();
            assert_eq!(sof_sampling(&bytes), vec![0x11; 3], "quality={quality}");
        }
    }
}
