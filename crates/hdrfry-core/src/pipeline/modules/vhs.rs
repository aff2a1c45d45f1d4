use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

const SMEAR_WEIGHT: f32 = 0.1;

/// Horizontal smear followed by a warm color cast.
pub struct Vhs;

impl Vhs {
    /// One pass: every pixel takes 10% of its left neighbour, wrapping at
    /// the row start.
    fn smear(buf: &mut ImageBuf) {
        let w = buf.width as usize;
        let stride = buf.stride();
        let mut prev = vec![0.0f32; stride];
        for row in buf.data.chunks_exact_mut(stride) {
            prev.copy_from_slice(row);
            for x in 0..w {
                let left = if x == 0 { w - 1 } else { x - 1 };
                for c in 0..3 {
                    row[x * 3 + c] =
                        prev[left * 3 + c] * SMEAR_WEIGHT + prev[x * 3 + c] * (1.0 - SMEAR_WEIGHT);
                }
            }
        }
    }
}

impl ProcessingModule for Vhs {
    fn name(&self) -> &str {
        "vhs"
    }

    fn category(&self) -> Category {
        Category::Distort
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Vhs) == 0.0
    }

    fn process_cpu(
        &self,
        mut input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        if self.is_identity(params) || input.is_empty() {
            return Ok(input);
        }

        let i = params.vhs_intensity();
        let passes = (i * 5.0).floor() as u32;
        for _ in 0..passes {
            Self::smear(&mut input);
        }

        for pixel in input.data.chunks_exact_mut(3) {
            pixel[0] = (pixel[0] * (1.0 + 0.1 * i)).clamp(0.0, 255.0);
            pixel[2] = (pixel[2] * (1.0 - 0.1 * i)).clamp(0.0, 255.0);
        }
        Ok(input)
    }
}
