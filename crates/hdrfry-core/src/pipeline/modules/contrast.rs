use anyhow::Result;
use rand::RngCore;

use crate::color::enhance_contrast;
use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

pub struct Contrast;

impl ProcessingModule for Contrast {
    fn name(&self) -> &str {
        "contrast"
    }

    fn category(&self) -> Category {
        Category::Basic
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Contrast) == Knob::Contrast.spec().default
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

        enhance_contrast(&mut input, params.contrast_factor());
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_rng;

    fn two_tone() -> ImageBuf {
        ImageBuf::from_data(2, 1, vec![60.0, 60.0, 60.0, 180.0, 180.0, 180.0]).unwrap()
    }

    #[test]
    fn identity_noop() {
        let buf = two_tone();
        let result = Contrast
            .process_cpu(buf.clone(), &ParameterSet::default(), &mut test_rng())
            .unwrap();
        assert_eq!(result, buf);
    }

    #[test]
    fn zero_flattens_to_mean() {
        let params = ParameterSet::default().with(Knob::Contrast, 0.0);
        let result = Contrast
            .process_cpu(two_tone(), &params, &mut test_rng())
            .unwrap();
        for &v in &result.data {
            assert!((v - 120.0).abs() < 1e-3);
        }
    }

    #[test]
    fn boost_widens_range() {
        let params = ParameterSet::default().with(Knob::Contrast, 15.0);
        let result = Contrast
            .process_cpu(two_tone(), &params, &mut test_rng())
            .unwrap();
        assert!((result.data[0] - 30.0).abs() < 1e-3);
        assert!((result.data[3] - 210.0).abs() < 1e-3);
    }
}
