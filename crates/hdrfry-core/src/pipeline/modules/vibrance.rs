use anyhow::Result;
use rand::RngCore;

use crate::color::{channel_mean, channel_std};
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Selective saturation: muted pixels get the full boost, already
/// saturated pixels get little or none.
pub struct Vibrance;

impl ProcessingModule for Vibrance {
    fn name(&self) -> &str {
        "vibrance"
    }

    fn category(&self) -> Category {
        Category::Basic
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Vibrance) <= Knob::Vibrance.spec().default
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

        let amount = params.vibrance_amount();
        for pixel in input.data.chunks_exact_mut(3) {
            let gray = channel_mean(pixel);
            let mask = 1.0 - (channel_std(pixel) / 128.0).clamp(0.0, 1.0);
            let gain = 1.0 + mask * (amount - 1.0);
            for c in pixel.iter_mut() {
                *c = gray + (*c - gray) * gain;
            }
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_rng;

    fn with_vibrance(v: f32) -> ParameterSet {
        ParameterSet::default().with(Knob::Vibrance, v)
    }

    #[test]
    fn identity_at_or_below_default() {
        assert!(Vibrance.is_identity(&ParameterSet::default()));
        assert!(Vibrance.is_identity(&with_vibrance(3.0)));
        assert!(!Vibrance.is_identity(&with_vibrance(11.0)));

        let buf = ImageBuf::filled(2, 2, [200.0, 100.0, 50.0]);
        let result = Vibrance
            .process_cpu(buf.clone(), &with_vibrance(4.0), &mut test_rng())
            .unwrap();
        assert_eq!(result, buf);
    }

    #[test]
    fn muted_pixels_gain_more_than_saturated() {
        let buf = ImageBuf::from_data(2, 1, vec![110.0, 100.0, 90.0, 255.0, 0.0, 0.0]).unwrap();
        let result = Vibrance
            .process_cpu(buf, &with_vibrance(20.0), &mut test_rng())
            .unwrap();

        let muted_spread = result.data[0] - result.data[2];
        assert!(muted_spread > 20.0 * 1.8, "muted spread {muted_spread}");

        // std of (255, 0, 0) is ~120, so the mask is small.
        let vivid_spread = result.data[3] - result.data[5];
        assert!(vivid_spread < 255.0 * 1.1);
    }

    #[test]
    fn gray_is_unchanged() {
        let buf = ImageBuf::filled(3, 3, [77.0, 77.0, 77.0]);
        let result = Vibrance
            .process_cpu(buf.clone(), &with_vibrance(30.0), &mut test_rng())
            .unwrap();
        assert_eq!(result, buf);
    }
}
