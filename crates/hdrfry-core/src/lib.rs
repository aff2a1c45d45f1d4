pub mod color;
pub mod filters;
pub mod image_buf;
pub mod load;
pub mod params;
pub mod pipeline;
pub mod presets;
pub mod preview;

pub use image_buf::ImageBuf;
pub use params::{Category, Flag, Knob, KnobSpec, ParameterSet};
pub use pipeline::Pipeline;
pub use presets::{Preset, PresetLibrary};
