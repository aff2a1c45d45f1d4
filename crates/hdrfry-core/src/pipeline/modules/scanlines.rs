use anyhow::Result;
use rand::RngCore;

use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Darkens every even row (0, 2, 4, ...).
pub struct Scanlines;

impl ProcessingModule for Scanlines {
    fn name(&self) -> &str {
        "scanlines"
    }

    fn category(&self) -> Category {
        Category::Distort
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Scanlines) == 0.0
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

        let gain = 1.0 - params.scanline_intensity() * 0.5;
        let stride = input.stride();
        for row in input.data.chunks_exact_mut(stride).step_by(2) {
            for v in row {
                *v *= gain;
            }
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_rng;

    #[test]
    fn even_rows_darkened_odd_rows_kept() {
        let buf = ImageBuf::filled(3, 5, [200.0, 100.0, 50.0]);
        let params = ParameterSet::default().with(Knob::Scanlines, 20.0);
        let out = Scanlines.process_cpu(buf, &params, &mut test_rng()).unwrap();
        for y in 0..5 {
            let expected = if y % 2 == 0 { [100.0, 50.0, 25.0] } else { [200.0, 100.0, 50.0] };
            for x in 0..3 {
                assert_eq!(out.pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn zero_intensity_is_identity() {
        let params = ParameterSet::default().with(Knob::Scanlines, 0.0);
        assert!(Scanlines.is_identity(&params));
        let buf = ImageBuf::filled(3, 4, [200.0, 100.0, 50.0]);
        let out = Scanlines.process_cpu(buf.clone(), &params, &mut test_rng()).unwrap();
        assert_eq!(out, buf);

        // Scanlines is continuous, so any positive value darkens.
        let params = ParameterSet::default().with(Knob::Scanlines, 0.4);
        assert!(!Scanlines.is_identity(&params));
        let out = Scanlines.process_cpu(buf.clone(), &params, &mut test_rng()).unwrap();
        assert!((out.pixel(0, 0)[0] - 198.0).abs() < 1e-3);
        assert_eq!(out.pixel(0, 1), [200.0, 100.0, 50.0]);
    }

    #[test]
    fn single_row_image() {
        let buf = ImageBuf::filled(4, 1, [80.0, 80.0, 80.0]);
        let params = ParameterSet::default().with(Knob::Scanlines, 10.0);
        let out = Scanlines.process_cpu(buf, &params, &mut test_rng()).unwrap();
        assert_eq!(out.pixel(3, 0), [60.0, 60.0, 60.0]);
    }
}
