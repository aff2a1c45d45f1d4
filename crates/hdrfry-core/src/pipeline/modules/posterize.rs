use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Quantize every channel down to a multiple of `256 / levels`.
pub fn posterize(buf: &mut ImageBuf, levels: u32) {
    let step = (256 / levels.clamp(1, 256)) as f32;
    for v in &mut buf.data {
        *v = (*v / step).floor() * step;
    }
}

pub struct Posterize;

impl ProcessingModule for Posterize {
    fn name(&self) -> &str {
        "posterize"
    }

    fn category(&self) -> Category {
        Category::Fry
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.posterize_levels() >= Knob::Posterize.spec().max as u32
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

        posterize(&mut input, params.posterize_levels());
        Ok(input)
    }
}
