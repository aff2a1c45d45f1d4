use anyhow::Result;
use rand::RngCore;
use rayon::prelude::*;

use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Fisheye magnification of the central disc.
///
/// The disc is centered at `(w / 2, h / 2)` with radius `min(w, h) / 3`.
/// Inside it each pixel samples from closer to the center by a factor that
/// is 1.5 at the center and 1.0 at the rim; outside it nothing moves.
pub struct Bulge;

impl ProcessingModule for Bulge {
    fn name(&self) -> &str {
        "bulge"
    }

    fn category(&self) -> Category {
        Category::Extras
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        !params.bulge()
    }

    fn process_cpu(
        &self,
        input: ImageBuf,
        params: &ParameterSet,
        _rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        let (w, h) = (input.width, input.height);
        let radius = w.min(h) / 3;
        if self.is_identity(params) || radius == 0 {
            return Ok(input);
        }

        let cx = (w / 2) as f32;
        let cy = (h / 2) as f32;
        let r = radius as f32;
        let max_x = (w - 1) as i64;
        let max_y = (h - 1) as i64;

        let mut out = input.clone();
        out.data
            .par_chunks_mut(input.stride())
            .enumerate()
            .for_each(|(y, row)| {
                let dy = y as f32 - cy;
                for x in 0..w {
                    let dx = x as f32 - cx;
                    let dist = (dx * dx + dy * dy).sqrt();
                    if dist >= r {
                        continue;
                    }
                    let factor = 1.0 + 0.5 * (1.0 - dist / r);
                    // Truncate toward zero, then clamp into the image.
                    let sx = ((cx + dx / factor) as i64).clamp(0, max_x) as u32;
                    let sy = ((cy + dy / factor) as i64).clamp(0, max_y) as u32;
                    let o = x as usize * 3;
                    row[o..o + 3].copy_from_slice(&input.pixel(sx, sy));
                }
            });
        Ok(out)
    }
}
