use std::f32::consts::TAU;

use anyhow::Result;
use rand::{Rng, RngCore};

use crate::image_buf::ImageBuf;
use crate::params::{Category, Knob, ParameterSet};
use crate::pipeline::module::ProcessingModule;

/// Standard normal sample via Box-Muller.
fn standard_normal(rng: &mut dyn RngCore) -> f32 {
    // 1 - u keeps the log argument in (0, 1].
    let u1: f32 = 1.0 - rng.r#gen::<f32>();
    let u2: f32 = rng.r#gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Independent zero-mean Gaussian grain on every channel of every pixel.
pub struct Noise;

impl ProcessingModule for Noise {
    fn name(&self) -> &str {
        "noise"
    }

    fn category(&self) -> Category {
        Category::Fry
    }

    fn is_identity(&self, params: &ParameterSet) -> bool {
        params.get(Knob::Noise) == 0.0
    }

    fn process_cpu(
        &self,
        mut input: ImageBuf,
        params: &ParameterSet,
        rng: &mut dyn RngCore,
    ) -> Result<ImageBuf> {
        if self.is_identity(params) {
            return Ok(input);
        }

        let sigma = params.noise_sigma();
        for v in &mut input.data {
            *v += standard_normal(rng) * sigma;
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::pipeline::test_rng;

    #[test]
    fn normal_samples_have_unit_spread() {
        let mut rng = test_rng();
        let n = 20_000;
        let samples: Vec<f32> = (0..n).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f32>() / n as f32;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n as f32;
        assert!(mean.abs() < 0.05, "mean {mean}");
        assert!((var.sqrt() - 1.0).abs() < 0.05, "std {}", var.sqrt());
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn grain_matches_requested_sigma() {
        let buf = ImageBuf::filled(64, 64, [128.0, 128.0, 128.0]);
        let params = ParameterSet::default().with(Knob::Noise, 20.0);
        let result = Noise.process_cpu(buf, &params, &mut test_rng()).unwrap();
        let n = result.data.len() as f32;
        let mean = result.data.iter().sum::<f32>() / n;
        let std = (result.data.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n).sqrt();
        assert!((mean - 128.0).abs() < 1.5, "mean {mean}");
        assert!((std - 20.0).abs() < 1.5, "std {std}");
    }

    #[test]
    fn seed_determines_grain() {
        let buf = ImageBuf::filled(8, 8, [50.0, 60.0, 70.0]);
        let params = ParameterSet::default().with(Knob::Noise, 10.0);
        let a = Noise
            .process_cpu(buf.clone(), &params, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let b = Noise
            .process_cpu(buf.clone(), &params, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let c = Noise
            .process_cpu(buf, &params, &mut StdRng::seed_from_u64(2))
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
