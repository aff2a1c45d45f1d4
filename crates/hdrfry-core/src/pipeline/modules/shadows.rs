use anyhow::Result;
use rand::RngCore;

use crate::color::luma;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Maximum shift applied at pure black per unit of amount.
const SHADOW_LIFT: f32 = 50.0;

pub struct Shadows;

impl ProcessingModule for Shadows {
    fn name(&self) -> &str {
        "shadows"
    }

    fn category(&self) -> Category {
        Category::Hdr
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Shadows) == Knob::Shadows.spec().default
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

        let lift = (params.shadows_amount() - 1.0) * SHADOW_LIFT;
        for pixel in input.data.chunks_exact_mut(3) {
            let mask = ((128.0 - luma(pixel[0], pixel[1], pixel[2])) / 128.0).clamp(0.0, 1.0);
            for c in pixel.iter_mut() {
                *c += mask * lift;
            }
        }
        Ok(input)
    }
}
