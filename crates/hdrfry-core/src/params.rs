use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Slider group a knob is shown under, and the pipeline phase its stage runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Basic,
    Hdr,
    Fry,
    Distort,
    Extras,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Basic => "BASIC",
            Category::Hdr => "HDR",
            Category::Fry => "DEEP FRY",
            Category::Distort => "DISTORT",
            Category::Extras => "EXTRAS",
        }
    }
}

/// Every numeric slider the editor exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Knob {
    Saturation,
    Contrast,
    Brightness,
    Sharpness,
    Vibrance,
    HdrGamma,
    Highlights,
    Shadows,
    Bloom,
    FryIntensity,
    JpegQuality,
    Noise,
    Posterize,
    ColorShift,
    Chromatic,
    Scanlines,
    Pixelate,
    Vhs,
    Glitch,
}

pub const KNOB_COUNT: usize = 19;

/// Declared range and default of a knob, in slider units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KnobSpec {
    pub knob: Knob,
    pub key: &'static str,
    pub label: &'static str,
    pub category: Category,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

const fn spec(
    knob: Knob,
    key: &'static str,
    label: &'static str,
    category: Category,
    min: f32,
    max: f32,
    default: f32,
) -> KnobSpec {
    KnobSpec {
        knob,
        key,
        label,
        category,
        min,
        max,
        default,
    }
}

/// The knob table, in declaration (and display) order.
pub const KNOBS: [KnobSpec; KNOB_COUNT] = [
    spec(Knob::Saturation, "saturation", "SATURATION", Category::Basic, 0.0, 50.0, 10.0),
    spec(Knob::Contrast, "contrast", "CONTRAST", Category::Basic, 0.0, 30.0, 10.0),
    spec(Knob::Brightness, "brightness", "BRIGHTNESS", Category::Basic, 5.0, 20.0, 10.0),
    spec(Knob::Sharpness, "sharpness", "SHARPNESS", Category::Basic, 0.0, 50.0, 10.0),
    spec(Knob::Vibrance, "vibrance", "VIBRANCE", Category::Basic, 0.0, 30.0, 10.0),
    spec(Knob::HdrGamma, "hdr_gamma", "HDR GAMMA", Category::Hdr, 0.0, 40.0, 0.0),
    spec(Knob::Highlights, "highlights", "HIGHLIGHTS", Category::Hdr, 0.0, 30.0, 10.0),
    spec(Knob::Shadows, "shadows", "SHADOWS", Category::Hdr, 0.0, 30.0, 10.0),
    spec(Knob::Bloom, "bloom", "BLOOM", Category::Hdr, 0.0, 20.0, 0.0),
    spec(Knob::FryIntensity, "fry_intensity", "FRY LEVEL", Category::Fry, 0.0, 30.0, 0.0),
    spec(Knob::JpegQuality, "jpeg_quality", "JPEG CRUNCH", Category::Fry, 1.0, 100.0, 100.0),
    spec(Knob::Noise, "noise", "NOISE/GRAIN", Category::Fry, 0.0, 50.0, 0.0),
    spec(Knob::Posterize, "posterize", "POSTERIZE", Category::Fry, 2.0, 32.0, 32.0),
    spec(Knob::ColorShift, "color_shift", "COLOR SHIFT", Category::Fry, 0.0, 30.0, 0.0),
    spec(Knob::Chromatic, "chromatic", "CHROMATIC ABR", Category::Distort, 0.0, 30.0, 0.0),
    spec(Knob::Scanlines, "scanlines", "SCANLINES", Category::Distort, 0.0, 20.0, 0.0),
    spec(Knob::Pixelate, "pixelate", "PIXELATE", Category::Distort, 1.0, 32.0, 1.0),
    spec(Knob::Vhs, "vhs", "VHS EFFECT", Category::Distort, 0.0, 20.0, 0.0),
    spec(Knob::Glitch, "glitch", "GLITCH", Category::Distort, 0.0, 20.0, 0.0),
];

impl Knob {
    pub const ALL: [Knob; KNOB_COUNT] = [
        Knob::Saturation,
        Knob::Contrast,
        Knob::Brightness,
        Knob::Sharpness,
        Knob::Vibrance,
        Knob::HdrGamma,
        Knob::Highlights,
        Knob::Shadows,
        Knob::Bloom,
        Knob::FryIntensity,
        Knob::JpegQuality,
        Knob::Noise,
        Knob::Posterize,
        Knob::ColorShift,
        Knob::Chromatic,
        Knob::Scanlines,
        Knob::Pixelate,
        Knob::Vhs,
        Knob::Glitch,
    ];

    pub fn spec(self) -> &'static KnobSpec {
        &KNOBS[self as usize]
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Knobs that count something (levels, pixels, iterations) and only
    /// take whole values.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Knob::JpegQuality | Knob::Posterize | Knob::Chromatic | Knob::Pixelate | Knob::Glitch
        )
    }

    /// Clamp `value` into this knob's declared range, rounding integral
    /// knobs to the nearest whole value. Non-finite input falls back to the
    /// default.
    pub fn clamp(self, value: f32) -> f32 {
        let spec = self.spec();
        if !value.is_finite() {
            return spec.default;
        }
        let value = value.clamp(spec.min, spec.max);
        if self.is_integral() { value.round() } else { value }
    }
}

impl fmt::Display for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown knob `{0}`")]
pub struct ParseKnobError(pub String);

impl FromStr for Knob {
    type Err = ParseKnobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        KNOBS
            .iter()
            .find(|spec| spec.key == wanted)
            .map(|spec| spec.knob)
            .ok_or_else(|| ParseKnobError(s.to_string()))
    }
}

/// The two on/off extras.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flag {
    LensFlare,
    Bulge,
}

impl FromStr for Flag {
    type Err = ParseKnobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lens_flare" | "flare" => Ok(Flag::LensFlare),
            "bulge" => Ok(Flag::Bulge),
            _ => Err(ParseKnobError(s.to_string())),
        }
    }
}

/// Snapshot of every slider value plus the two extras toggles.
///
/// Every knob is always inside its declared range: `set` is the only
/// mutator and it clamps. The type is `Copy`, so handing a snapshot to a
/// background render is a plain copy and later slider moves never leak
/// into a run in progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "ParameterFile", from = "ParameterFile")]
pub struct ParameterSet {
    values: [f32; KNOB_COUNT],
    lens_flare: bool,
    bulge: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        let mut values = [0.0; KNOB_COUNT];
        for spec in &KNOBS {
            values[spec.knob as usize] = spec.default;
        }
        Self {
            values,
            lens_flare: false,
            bulge: false,
        }
    }
}

impl ParameterSet {
    pub fn get(&self, knob: Knob) -> f32 {
        self.values[knob as usize]
    }

    /// Set a knob, silently clamping into its range. Returns the stored value.
    pub fn set(&mut self, knob: Knob, value: f32) -> f32 {
        let clamped = knob.clamp(value);
        self.values[knob as usize] = clamped;
        clamped
    }

    pub fn with(mut self, knob: Knob, value: f32) -> Self {
        self.set(knob, value);
        self
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::LensFlare => self.lens_flare,
            Flag::Bulge => self.bulge,
        }
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        match flag {
            Flag::LensFlare => self.lens_flare = on,
            Flag::Bulge => self.bulge = on,
        }
    }

    pub fn with_flag(mut self, flag: Flag, on: bool) -> Self {
        self.set_flag(flag, on);
        self
    }

    pub fn lens_flare(&self) -> bool {
        self.lens_flare
    }

    pub fn bulge(&self) -> bool {
        self.bulge
    }

    /// Knobs whose value differs from the default.
    pub fn changed(&self) -> Vec<(Knob, f32)> {
        Knob::ALL
            .iter()
            .filter(|k| self.get(**k) != k.spec().default)
            .map(|k| (*k, self.get(*k)))
            .collect()
    }

    // ── Effective stage values ──

    pub fn saturation_factor(&self) -> f32 {
        self.get(Knob::Saturation) / 10.0
    }

    pub fn contrast_factor(&self) -> f32 {
        self.get(Knob::Contrast) / 10.0
    }

    pub fn brightness_factor(&self) -> f32 {
        self.get(Knob::Brightness) / 10.0
    }

    pub fn sharpness_factor(&self) -> f32 {
        self.get(Knob::Sharpness) / 10.0
    }

    pub fn vibrance_amount(&self) -> f32 {
        self.get(Knob::Vibrance) / 10.0
    }

    /// Gamma written into the exported file's HDR tag. Zero means "no tag".
    pub fn hdr_gamma(&self) -> f32 {
        self.get(Knob::HdrGamma) / 10.0
    }

    pub fn highlights_amount(&self) -> f32 {
        self.get(Knob::Highlights) / 10.0
    }

    pub fn shadows_amount(&self) -> f32 {
        self.get(Knob::Shadows) / 10.0
    }

    pub fn bloom_amount(&self) -> f32 {
        self.get(Knob::Bloom) / 20.0
    }

    pub fn fry_intensity(&self) -> f32 {
        self.get(Knob::FryIntensity) / 10.0
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.get(Knob::JpegQuality).round() as u8
    }

    /// Standard deviation of the additive grain, in 0..255 units.
    pub fn noise_sigma(&self) -> f32 {
        (self.get(Knob::Noise) / 50.0) * 50.0
    }

    pub fn posterize_levels(&self) -> u32 {
        self.get(Knob::Posterize).round() as u32
    }

    pub fn color_shift_amount(&self) -> f32 {
        self.get(Knob::ColorShift) / 30.0
    }

    pub fn chromatic_offset(&self) -> u32 {
        self.get(Knob::Chromatic).round() as u32
    }

    pub fn scanline_intensity(&self) -> f32 {
        self.get(Knob::Scanlines) / 20.0
    }

    pub fn pixelate_size(&self) -> u32 {
        self.get(Knob::Pixelate).round() as u32
    }

    pub fn vhs_intensity(&self) -> f32 {
        self.get(Knob::Vhs) / 20.0
    }

    pub fn glitch_iterations(&self) -> u32 {
        self.get(Knob::Glitch).round() as u32
    }
}

/// On-disk form of a [`ParameterSet`]: knobs keyed by name, omitted knobs
/// take their defaults, out-of-range values are clamped on load.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ParameterFile {
    knobs: BTreeMap<Knob, f32>,
    lens_flare: bool,
    bulge: bool,
}

impl From<ParameterFile> for ParameterSet {
    fn from(file: ParameterFile) -> Self {
        let mut params = ParameterSet::default();
        for (knob, value) in file.knobs {
            params.set(knob, value);
        }
        params.lens_flare = file.lens_flare;
        params.bulge = file.bulge;
        params
    }
}

impl From<ParameterSet> for ParameterFile {
    fn from(params: ParameterSet) -> Self {
        Self {
            knobs: Knob::ALL.iter().map(|k| (*k, params.get(*k))).collect(),
            lens_flare: params.lens_flare,
            bulge: params.bulge,
        }
    }
}
