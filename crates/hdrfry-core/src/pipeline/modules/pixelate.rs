use anyhow::Result;
use rand::RngCore;

use crate::filters::resize_nearest;
use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Nearest-neighbour downscale by the block size, then back up.
pub struct Pixelate;

impl ProcessingModule for Pixelate {
    fn name(&self) -> &str {
        "pixelate"
    }

    fn category(&self) -> Category {
        Category::Distort
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.pixelate_size() <= 1
    }

    fn process_cpu(
        &self,
        input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        if self.is_identity(params) {
            return Ok(input);
        }

        let size = params.pixelate_size();

        let (w, h) = (input.width, input.height);
        let small = resize_nearest(&input, w / size, h / size);
        Ok(resize_nearest(&small, w, h))
    }
}
