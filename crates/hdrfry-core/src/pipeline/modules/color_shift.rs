use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

const RED_PUSH: f32 = 30.0;
const BLUE_PULL: f32 = 20.0;

pub struct ColorShift;

impl ProcessingModule for ColorShift {
    fn name(&self) -> &str {
        "color_shift"
    }

    fn category(&self) -> Category {
        Category::Fry
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::ColorShift) == 0.0
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

        let a = params.color_shift_amount();
        for pixel in input.data.chunks_exact_mut(3) {
            pixel[0] += a * RED_PUSH;
            pixel[2] -= a * BLUE_PULL;
        }
        Ok(input)
    }
}
