use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::{Flag, Knob, ParameterSet};

/// Named starting points for the slider set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Reset,
    HdrGlow,
    LightFry,
    Crispy,
    Nuclear,
    Cursed,
    Subtle,
    Medium,
    Blinding,
}

struct PresetDef {
    preset: Preset,
    name: &'static str,
    overrides: &'static [(Knob, f32)],
    lens_flare: bool,
    bulge: bool,
}

const PRESETS: [PresetDef; 9] = [
    PresetDef {
        preset: Preset::Reset,
        name: "RESET",
        overrides: &[],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::HdrGlow,
        name: "HDR GLOW",
        overrides: &[
            (Knob::Saturation, 18.0),
            (Knob::Contrast, 14.0),
            (Knob::HdrGamma, 25.0),
            (Knob::Highlights, 18.0),
            (Knob::Bloom, 8.0),
        ],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::LightFry,
        name: "LIGHT FRY",
        overrides: &[
            (Knob::Saturation, 25.0),
            (Knob::Contrast, 18.0),
            (Knob::Sharpness, 25.0),
            (Knob::FryIntensity, 10.0),
            (Knob::JpegQuality, 40.0),
        ],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::Crispy,
        name: "CRISPY",
        overrides: &[
            (Knob::Saturation, 35.0),
            (Knob::Contrast, 22.0),
            (Knob::Sharpness, 40.0),
            (Knob::FryIntensity, 20.0),
            (Knob::JpegQuality, 15.0),
            (Knob::Noise, 15.0),
        ],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::Nuclear,
        name: "NUCLEAR",
        overrides: &[
            (Knob::Saturation, 45.0),
            (Knob::Contrast, 28.0),
            (Knob::Sharpness, 50.0),
            (Knob::FryIntensity, 30.0),
            (Knob::JpegQuality, 5.0),
            (Knob::Noise, 25.0),
            (Knob::HdrGamma, 35.0),
        ],
        lens_flare: true,
        bulge: false,
    },
    PresetDef {
        preset: Preset::Cursed,
        name: "CURSED",
        overrides: &[
            (Knob::Saturation, 40.0),
            (Knob::Contrast, 25.0),
            (Knob::FryIntensity, 25.0),
            (Knob::JpegQuality, 8.0),
            (Knob::Noise, 30.0),
            (Knob::Posterize, 8.0),
            (Knob::Chromatic, 15.0),
            (Knob::Glitch, 10.0),
        ],
        lens_flare: false,
        bulge: true,
    },
    PresetDef {
        preset: Preset::Subtle,
        name: "SUBTLE",
        overrides: &[
            (Knob::HdrGamma, 10.0),
            (Knob::Highlights, 12.0),
            (Knob::Bloom, 3.0),
        ],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::Medium,
        name: "MEDIUM",
        overrides: &[
            (Knob::HdrGamma, 20.0),
            (Knob::Saturation, 13.0),
            (Knob::Highlights, 15.0),
            (Knob::Bloom, 6.0),
        ],
        lens_flare: false,
        bulge: false,
    },
    PresetDef {
        preset: Preset::Blinding,
        name: "BLINDING",
        overrides: &[
            (Knob::HdrGamma, 40.0),
            (Knob::Contrast, 13.0),
            (Knob::Highlights, 25.0),
            (Knob::Shadows, 14.0),
            (Knob::Bloom, 15.0),
        ],
        lens_flare: false,
        bulge: false,
    },
];

impl Preset {
    pub const ALL: [Preset; 9] = [
        Preset::Reset,
        Preset::HdrGlow,
        Preset::LightFry,
        Preset::Crispy,
        Preset::Nuclear,
        Preset::Cursed,
        Preset::Subtle,
        Preset::Medium,
        Preset::Blinding,
    ];

    fn def(self) -> &'static PresetDef {
        &PRESETS[self as usize]
    }

    /// Display name, as printed on the preset buttons.
    pub fn name(self) -> &'static str {
        self.def().name
    }

    pub fn overrides(self) -> &'static [(Knob, f32)] {
        self.def().overrides
    }

    /// The full parameter set this preset produces: defaults plus overrides.
    pub fn params(self) -> ParameterSet {
        let def = self.def();
        let mut params = ParameterSet::default();
        for &(knob, value) in def.overrides {
            params.set(knob, value);
        }
        params.set_flag(Flag::LensFlare, def.lens_flare);
        params.set_flag(Flag::Bulge, def.bulge);
        params
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown preset `{0}`")]
pub struct ParsePresetError(pub String);

/// Fold case and drop separators so "hdr-glow", "HDR GLOW" and "hdr_glow" agree.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for Preset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        PRESETS
            .iter()
            .find(|def| normalize(def.name) == wanted)
            .map(|def| def.preset)
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

/// The fixed preset catalogue.
pub struct PresetLibrary;

impl PresetLibrary {
    pub fn all() -> &'static [Preset] {
        &Preset::ALL
    }

    pub fn find(name: &str) -> Option<Preset> {
        name.parse().ok()
    }

    /// Replace `params` with the preset's values in one assignment: reset to
    /// defaults, then overrides. Nothing from the previous state survives.
    pub fn apply(preset: Preset, params: &mut ParameterSet) {
        *params = preset.params();
    }
}
