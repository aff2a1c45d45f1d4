use anyhow::Result;
use rand::RngCore;

use crate::color::enhance_color;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

pub struct Saturation;

impl ProcessingModule for Saturation {
    fn name(&self) -> &str {
        "saturation"
    }

    fn category(&self) -> Category {
        Category::Basic
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Saturation) == Knob::Saturation.spec().default
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

        enhance_color(&mut input, params.saturation_factor());
        Ok(input)
    }
}
