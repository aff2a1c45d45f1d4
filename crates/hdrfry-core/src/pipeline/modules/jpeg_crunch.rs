use anyhow::{Context, Result};
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Encode to JPEG at `quality` and decode the result back.
///
/// Quality 100 or above returns the input unchanged.
pub fn jpeg_roundtrip(buf: ImageBuf, quality: u8) -> Result<ImageBuf> {
    if quality >= 100 || buf.is_empty() {
        return Ok(buf);
    }

    let rgb = buf.to_rgb8();
    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality.max(1));
    rgb.write_with_encoder(encoder).context("jpeg encode failed")?;

    let decoded = image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)
        .context("jpeg decode failed")?
        .to_rgb8();
    Ok(ImageBuf::from_rgb8(&decoded))
}

pub struct JpegCrunch;

impl ProcessingModule for JpegCrunch {
    fn name(&self) -> &str {
        "jpeg_crunch"
    }

    fn category(&self) -> Category {
        Category::Fry
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.jpeg_quality() >= 100
    }

    fn process_cpu(
        &self,
        input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        jpeg_roundtrip(input, params.jpeg_quality())
    }
}
