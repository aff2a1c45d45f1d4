use anyhow::Result;
use rand::RngCore;

use crate::color::luma;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

pub struct Highlights;

impl ProcessingModule for Highlights {
    fn name(&self) -> &str {
        "highlights"
    }

    fn category(&self) -> Category {
        Category::Hdr
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Highlights) == Knob::Highlights.spec().default
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

        // Only pixels brighter than mid-gray are scaled, ramping up to the
        // full amount at white.
        let amount = params.highlights_amount();
        for pixel in input.data.chunks_exact_mut(3) {
            let mask = ((luma(pixel[0], pixel[1], pixel[2]) - 128.0) / 127.0).clamp(0.0, 1.0);
            let gain = 1.0 + mask * (amount - 1.0);
            for c in pixel.iter_mut() {
                *c *= gain;
            }
        }
        Ok(input)
    }
}
