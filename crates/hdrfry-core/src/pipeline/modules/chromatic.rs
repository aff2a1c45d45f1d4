use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Red moves right and blue moves left by the same pixel offset; green
/// stays put.
///
/// Columns the shifted channel no longer covers keep the unshifted source
/// value rather than going black.
pub struct ChromaticAberration;

impl ProcessingModule for ChromaticAberration {
    fn name(&self) -> &str {
        "chromatic_aberration"
    }

    fn category(&self) -> Category {
        Category::Distort
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.chromatic_offset() == 0
    }

    fn process_cpu(
        &self,
        input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        let offset = params.chromatic_offset() as usize;
        let w = input.width as usize;
        if offset == 0 || offset >= w {
            return Ok(input);
        }

        let stride = input.stride();
        let mut out = input.clone();
        for (src, dst) in input
            .data
            .chunks_exact(stride)
            .zip(out.data.chunks_exact_mut(stride))
        {
            for x in offset..w {
                dst[x * 3] = src[(x - offset) * 3];
            }
            for x in 0..w - offset {
                dst[x * 3 + 2] = src[(x + offset) * 3 + 2];
            }
        }
        Ok(out)
    }
}
