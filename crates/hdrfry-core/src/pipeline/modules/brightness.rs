use anyhow::Result;
use rand::RngCore;

use crate::color::enhance_brightness;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

pub struct Brightness;

impl ProcessingModule for Brightness {
    fn name(&self) -> &str {
        "brightness"
    }

    fn category(&self) -> Category {
        Category::Basic
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Brightness) == Knob::Brightness.spec().default
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

        enhance_brightness(&mut input, params.brightness_factor());
        Ok(input)
    }
}
