use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use image::RgbImage;
use rawler::imgop::develop::{Intermediate, RawDevelop};
use tracing::{debug, info};

pub const RAW_EXTENSIONS: &[&str] = &[
    "cr2", "cr3", "crw", "nef", "nrw", "arw", "srf", "sr2", "raf", "rw2", "orf", "pef", "dng",
    "3fr", "ari", "bay", "cap", "dcr", "erf", "fff", "iiq", "k25", "kdc", "mef", "mos", "mrw",
    "raw", "rwl", "srw", "x3f",
];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];

pub fn is_supported_extension(ext: &str) -> bool {
    let lower = ext.to_ascii_lowercase();
    RAW_EXTENSIONS.contains(&lower.as_str()) || IMAGE_EXTENSIONS.contains(&lower.as_str())
}

pub fn is_raw_extension(ext: &str) -> bool {
    RAW_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

/// Develop a camera RAW file to 8-bit sRGB.
pub fn decode_raw(path: &Path) -> Result<RgbImage> {
    let t0 = Instant::now();
    let raw = rawler::decode_file(path)
        .with_context(|| format!("cannot read RAW file {}", path.display()))?;

    let developed = RawDevelop::default()
        .develop_intermediate(&raw)
        .with_context(|| format!("cannot develop {}", path.display()))?;
    let Intermediate::ThreeColor(rgb) = developed else {
        bail!("{} did not develop to three-channel RGB", path.display());
    };

    let bytes: Vec<u8> = rgb
        .data
        .iter()
        .flat_map(|px| px.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
        .collect();
    let img = RgbImage::from_raw(rgb.width as u32, rgb.height as u32, bytes)
        .context("developed RAW has inconsistent dimensions")?;
    debug!(
        width = img.width(),
        height = img.height(),
        elapsed_ms = t0.elapsed().as_millis(),
        "RAW developed"
    );
    Ok(img)
}

/// Decode a raster file as 8-bit RGB, dropping any alpha.
pub fn load_image(path: &Path) -> Result<RgbImage> {
    let t0 = Instant::now();
    let img = image::open(path)
        .with_context(|| format!("cannot open image {}", path.display()))?
        .into_rgb8();
    debug!(
        width = img.width(),
        height = img.height(),
        elapsed_ms = t0.elapsed().as_millis(),
        "image decoded"
    );
    Ok(img)
}

/// Load a source image, picking the decoder from the file extension.
pub fn load_any(path: &Path) -> Result<RgbImage> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    if !is_supported_extension(ext) {
        bail!("unsupported file type: {}", path.display());
    }
    info!(path = %path.display(), raw = is_raw_extension(ext), "loading source");
    if is_raw_extension(ext) {
        decode_raw(path)
    } else {
        load_image(path)
    }
}
