mod bloom;
mod brightness;
mod bulge;
mod chromatic;
mod color_shift;
mod contrast;
mod deep_fry;
mod glitch;
mod highlights;
mod jpeg_crunch;
mod lens_flare;
mod noise;
mod pixelate;
mod posterize;
mod saturation;
mod scanlines;
mod shadows;
mod sharpness;
mod vhs;
mod vibrance;

pub use bloom::Bloom;
pub use brightness::Brightness;
pub use bulge::Bulge;
pub use chromatic::ChromaticAberration;
pub use color_shift::ColorShift;
pub use contrast::Contrast;
pub use deep_fry::DeepFry;
pub use glitch::Glitch;
pub use highlights::Highlights;
pub use jpeg_crunch::{JpegCrunch, jpeg_roundtrip};
pub use lens_flare::LensFlare;
pub use noise::Noise;
pub use pixelate::Pixelate;
pub use posterize::{Posterize, posterize};
pub use saturation::Saturation;
pub use scanlines::Scanlines;
pub use shadows::Shadows;
pub use sharpness::Sharpness;
pub use vhs::Vhs;
pub use vibrance::Vibrance;
