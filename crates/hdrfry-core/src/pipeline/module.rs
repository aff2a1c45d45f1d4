use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};

/// A single effect stage in the processing pipeline.
pub trait ProcessingModule: Send + Sync {
    fn name(&self) -> &str;

    fn category(&self) -> Category;

    /// True when the stage's parameters leave the image unchanged. The
    /// pipeline never invokes an identity stage.
    fn is_identity(&self, params: &ParameterSet) -> bool;

    /// Apply the stage. Stochastic stages draw exclusively from `rng`.
    fn process_cpu(
        &self,
        input: ImageBuf,
        params: &ParameterSet,
        rng: &mut dyn RngCore,
    ) -> Result<ImageBuf>;
}
