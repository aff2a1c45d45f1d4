use anyhow::Result;
use rand::RngCore;

use crate::color::{enhance_color, enhance_contrast, enhance_sharpness};
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Oversaturate, overcontrast and oversharpen, then push the palette
/// toward orange.
pub struct DeepFry;

impl ProcessingModule for DeepFry {
    fn name(&self) -> &str {
        "deep_fry"
    }

    fn category(&self) -> Category {
        Category::Fry
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::FryIntensity) == 0.0
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

        let i = params.fry_intensity();

        // Each enhancer sees the clamped output of the previous one.
        enhance_color(&mut input, 1.0 + 2.0 * i);
        input.clamp_in_place();
        enhance_contrast(&mut input, 1.0 + 1.5 * i);
        input.clamp_in_place();
        enhance_sharpness(&mut input, 1.0 + 3.0 * i);
        input.clamp_in_place();

        let gains = [1.0 + 0.3 * i, 1.0 + 0.15 * i, 1.0 - 0.2 * i];
        for pixel in input.data.chunks_exact_mut(3) {
            for (c, g) in pixel.iter_mut().zip(gains) {
                *c *= g;
            }
        }
        Ok(input)
    }
}
