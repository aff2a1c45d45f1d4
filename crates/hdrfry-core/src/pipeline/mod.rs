pub mod module;
pub mod modules;

use std::time::Instant;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::image_buf::ImageBuf;
use crate::params::ParameterSet;
use module::ProcessingModule;

/// Effect pipeline that chains stages in a fixed order.
///
/// ```text
/// Basic   saturation -> contrast -> brightness -> sharpness -> vibrance
/// HDR     highlights -> shadows -> bloom
/// Fry     deep_fry -> jpeg_crunch -> noise -> posterize -> color_shift
/// Distort chromatic -> scanlines -> pixelate -> vhs -> glitch
/// Extras  lens_flare -> bulge
/// ```
///
/// Stages whose parameters are at their identity value are not invoked.
/// Every invoked stage's output is clamped to [0, 255] before the next one
/// sees it. The pipeline holds no per-run state, so one instance can serve
/// preview and export runs concurrently.
pub struct Pipeline {
    modules: Vec<Box<dyn ProcessingModule>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            modules: vec![
                Box::new(modules::Saturation),
                Box::new(modules::Contrast),
                Box::new(modules::Brightness),
                Box::new(modules::Sharpness),
                Box::new(modules::Vibrance),
                Box::new(modules::Highlights),
                Box::new(modules::Shadows),
                Box::new(modules::Bloom),
                Box::new(modules::DeepFry),
                Box::new(modules::JpegCrunch),
                Box::new(modules::Noise),
                Box::new(modules::Posterize),
                Box::new(modules::ColorShift),
                Box::new(modules::ChromaticAberration),
                Box::new(modules::Scanlines),
                Box::new(modules::Pixelate),
                Box::new(modules::Vhs),
                Box::new(modules::Glitch),
                Box::new(modules::LensFlare),
                Box::new(modules::Bulge),
            ],
        }
    }

    /// Build a pipeline from an explicit stage list.
    pub fn with_modules(modules: Vec<Box<dyn ProcessingModule>>) -> Self {
        Self { modules }
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    /// Names of the stages that would run for `params`, in order.
    pub fn active_stages(&self, params: &ParameterSet) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|m| !m.is_identity(params))
            .map(|m| m.name())
            .collect()
    }

    /// Run every non-identity stage on `input`.
    ///
    /// `seed` drives all stochastic stages, so the same image, parameters
    /// and seed always produce the same output. Empty images pass through.
    pub fn process_cpu(&self, input: ImageBuf, params: &ParameterSet, seed: u64) -> Result<ImageBuf> {
        if input.is_empty() {
            return Ok(input);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let t0 = Instant::now();
        let mut current = input;
        for module in &self.modules {
            if module.is_identity(params) {
                continue;
            }
            let t = Instant::now();
            current = module
                .process_cpu(current, params, &mut rng)
                .with_context(|| format!("stage `{}` failed", module.name()))?;
            current.clamp_in_place();
            debug!(
                module = module.name(),
                category = module.category().label(),
                elapsed_ms = t.elapsed().as_millis(),
                "processed"
            );
        }
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            width = current.width,
            height = current.height,
            "pipeline complete"
        );
        Ok(current)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) fn test_rng() -> StdRng {
    StdRng::seed_from_u64(0x5EED)
}
