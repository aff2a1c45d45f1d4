use anyhow::Result;
use rand::RngCore;

use crate::filters::gaussian_blur;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

const BLOOM_SIGMA: f32 = 10.0;
const BLOOM_THRESHOLD: f32 = 180.0;
const BLOOM_RANGE: f32 = 75.0;

/// Additive glow around bright regions.
///
/// The image is blurred, and wherever the blurred brightest channel exceeds
/// the threshold the blurred color is added back on top of the original.
pub struct Bloom;

impl ProcessingModule for Bloom {
    fn name(&self) -> &str {
        "bloom"
    }

    fn category(&self) -> Category {
        Category::Hdr
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Bloom) == 0.0
    }

    fn process_cpu(
        &self,
        mut input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        if self.is_identity(params) {
            return Ok(input);
        }

        let amount = params.bloom_amount();
        let blurred = gaussian_blur(&input, BLOOM_SIGMA);
        for (pixel, glow) in input
            .data
            .chunks_exact_mut(3)
            .zip(blurred.data.chunks_exact(3))
        {
            let peak = glow[0].max(glow[1]).max(glow[2]);
            let mask = ((peak - BLOOM_THRESHOLD) / BLOOM_RANGE).clamp(0.0, 1.0);
            if mask == 0.0 {
                continue;
            }
            for (c, g) in pixel.iter_mut().zip(glow) {
                *c += g * mask * amount;
            }
        }
        Ok(input)
    }
}
