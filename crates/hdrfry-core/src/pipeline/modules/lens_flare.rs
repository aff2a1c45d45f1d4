use anyhow::Result;
use rand::RngCore;
use rand::seq::index;
use rayon::prelude::*;

use crate::color::channel_mean;
use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

const BRIGHT_THRESHOLD: f32 = 200.0;
const MAX_FLARES: usize = 5;
const FLARE_FALLOFF: f32 = 30.0;
const FLARE_PEAK: f32 = 100.0;

/// Warm radial glows centered on a few randomly chosen bright pixels.
pub struct LensFlare;

impl LensFlare {
    /// Pixel coordinates whose channel mean exceeds the threshold, in
    /// row-major order.
    fn bright_points(buf: &ImageBuf) -> Vec<(u32, u32)> {
        let w = buf.width.max(1);
        buf.data
            .chunks_exact(3)
            .enumerate()
            .filter(|(_, p)| channel_mean(p) > BRIGHT_THRESHOLD)
            .map(|(i, _)| (i as u32 % w, i as u32 / w))
            .collect()
    }

    fn add_glow(buf: &mut ImageBuf, cx: u32, cy: u32) {
        let w = buf.width as usize;
        let stride = buf.stride();
        buf.data
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(y, row)| {
                let dy = y as f32 - cy as f32;
                for x in 0..w {
                    let dx = x as f32 - cx as f32;
                    let flare = (-(dx * dx + dy * dy).sqrt() / FLARE_FALLOFF).exp() * FLARE_PEAK;
                    let i = x * 3;
                    row[i] = (row[i] + flare).clamp(0.0, 255.0);
                    row[i + 1] = (row[i + 1] + flare * 0.8).clamp(0.0, 255.0);
                }
            });
    }
}

impl ProcessingModule for LensFlare {
    fn name(&self) -> &str {
        "lens_flare"
    }

    fn category(&self) -> Category {
        Category::Extras
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        !params.lens_flare()
    }

    fn process_cpu(
        &self,
        mut input: ImageBuf,
        params: &ParameterSet,
        rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        if self.is_identity(params) || input.is_empty() {
            return Ok(input);
        }

        let points = Self::bright_points(&input);
        if points.is_empty() {
            return Ok(input);
        }

        let picks = index::sample(rng, points.len(), MAX_FLARES.min(points.len()));
        for i in picks.iter() {
            let (cx, cy) = points[i];
            Self::add_glow(&mut input, cx, cy);
        }
        Ok(input)
    }
}
