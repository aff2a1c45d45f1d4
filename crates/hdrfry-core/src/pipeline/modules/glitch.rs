use anyhow::Result;
use rand::{Rng, RngCore};

use crate::filters::roll_rows;
use crate::image_buf::ImageBuf;
use crate::params::{Category, ParameterSet};
use crate::pipeline::module::ProcessingModule;

const MAX_BAND: u32 = 10;
const MAX_OFFSET: i64 = 20;

/// Randomly displaced horizontal bands.
///
/// Each iteration picks a band start, a band height and a horizontal
/// offset, and rolls the band sideways when it ends inside the image.
pub struct Glitch;

impl ProcessingModule for Glitch {
    fn name(&self) -> &str {
        "glitch"
    }

    fn category(&self) -> Category {
        Category::Distort
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.glitch_iterations() == 0
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

        let h = input.height;
        let start_range = h.saturating_sub(MAX_BAND).max(1);
        for _ in 0..params.glitch_iterations() {
            let y = rng.gen_range(0..start_range);
            let band = rng.gen_range(1..MAX_BAND);
            let offset = rng.gen_range(-MAX_OFFSET..MAX_OFFSET);
            if y + band < h {
                roll_rows(&mut input, y..y + band, offset);
            }
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Knob;
    use crate::pipeline::test_rng;

    fn striped(w: u32, h: u32) -> ImageBuf {
        let mut data = Vec::new();
        for y in 0..h {
            for x in 0..w {
                data.extend_from_slice(&[x as f32 * 3.0, y as f32 * 2.0, 50.0]);
            }
        }
        ImageBuf::from_data(w, h, data).unwrap()
    }

    fn sorted_row(buf: &ImageBuf, y: u32) -> Vec<u32> {
        let mut reds: Vec<u32> = (0..buf.width).map(|x| buf.pixel(x, y)[0] as u32).collect();
        reds.sort_unstable();
        reds
    }

    #[test]
    fn rows_are_permuted_not_changed() {
        let src = striped(64, 48);
        let params = ParameterSet::default().with(Knob::Glitch, 20.0);
        let out = Glitch.process_cpu(src.clone(), &params, &mut test_rng()).unwrap();
        assert_eq!((out.width, out.height), (64, 48));
        for y in 0..48 {
            // Rolling keeps each row's content and never moves rows vertically.
            assert_eq!(sorted_row(&out, y), sorted_row(&src, y));
            assert_eq!(out.pixel(0, y)[1], src.pixel(0, y)[1]);
        }
        assert_ne!(out, src);
    }

    #[test]
    fn zero_iterations_is_identity() {
        for iterations in [0.0, 0.4] {
            let params = ParameterSet::default().with(Knob::Glitch, iterations);
            assert!(Glitch.is_identity(&params), "iterations={iterations}");
            let src = striped(32, 24);
            let out = Glitch.process_cpu(src.clone(), &params, &mut test_rng()).unwrap();
            assert_eq!(out, src, "iterations={iterations}");
        }
        assert!(!Glitch.is_identity(&ParameterSet::default().with(Knob::Glitch, 0.6)));
    }

    #[test]
    fn short_images_do_not_panic() {
        let params = ParameterSet::default().with(Knob::Glitch, 20.0);
        for h in [1, 2, 9, 10, 11] {
            let out = Glitch
                .process_cpu(striped(8, h), &params, &mut test_rng())
                .unwrap();
            assert_eq!(out.height, h);
        }
    }

    #[test]
    fn bottom_row_is_never_displaced() {
        // A band must end strictly above the last row.
        let src = striped(32, 12);
        let params = ParameterSet::default().with(Knob::Glitch, 20.0);
        let out = Glitch.process_cpu(src.clone(), &params, &mut test_rng()).unwrap();
        for x in 0..32 {
            assert_eq!(out.pixel(x, 11), src.pixel(x, 11));
        }
    }
}
