use anyhow::Result;
use rand::RngCore;

use crate::color::enhance_sharpness;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

pub struct Sharpness;

impl ProcessingModule for Sharpness {
    fn name(&self) -> &str {
        "sharpness"
    }

    fn category(&self) -> Category {
        Category::Basic
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Sharpness) == Knob::Sharpness.spec().default
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

        enhance_sharpness(&mut input, params.sharpness_factor());
        Ok(input)
    }
}
