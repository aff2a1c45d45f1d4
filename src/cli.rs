use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use hdrfry_core::{Flag, Knob, ParameterSet, Preset, PresetLibrary};
use hdrfry_export::ExportFormat;

#[derive(Parser)]
#[command(name = "hdrfry")]
#[command(version, about = "HDR glow and deep-fry image effects", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/hdrfry/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply effects at full resolution and export the result
    Render {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file (default: meme_<input stem>.<ext> beside the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format: jpg or png (default: from the output extension)
        #[arg(long, value_name = "FORMAT")]
        format: Option<ExportFormat>,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Apply effects to the downscaled preview and save it
    Preview {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Longest preview edge in pixels (default: from config)
        #[arg(long, value_name = "PX")]
        max_edge: Option<u32>,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// Edit interactively with line commands on stdin
    Live {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write every finished preview frame to this file
        #[arg(long, value_name = "FILE")]
        preview_out: Option<PathBuf>,

        #[command(flatten)]
        effects: EffectArgs,
    },

    /// List every knob with its range and default
    Knobs,

    /// List presets and the values they set
    Presets,
}

/// Options shared by every command that runs the pipeline.
#[derive(Args, Clone, Debug, Default)]
pub struct EffectArgs {
    /// Start from a preset, e.g. "hdr-glow" or "nuclear"
    #[arg(short, long, value_name = "NAME", conflicts_with = "params")]
    pub preset: Option<Preset>,

    /// Start from a saved parameter file (JSON)
    #[arg(long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Override one knob; may be repeated
    #[arg(long = "set", value_name = "KNOB=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(Knob, f32)>,

    /// Turn on the lens flare extra
    #[arg(long)]
    pub lens_flare: bool,

    /// Turn on the bulge extra
    #[arg(long)]
    pub bulge: bool,

    /// Seed for noise, glitch and lens flare
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

impl EffectArgs {
    /// Preset or parameter file first, then individual knobs, then flags.
    pub fn resolve(&self) -> Result<ParameterSet> {
        let mut params = match &self.params {
            Some(path) => load_params(path)?,
            None => ParameterSet::default(),
        };
        if let Some(preset) = self.preset {
            PresetLibrary::apply(preset, &mut params);
        }
        for &(knob, value) in &self.set {
            params.set(knob, value);
        }
        if self.lens_flare {
            params.set_flag(Flag::LensFlare, true);
        }
        if self.bulge {
            params.set_flag(Flag::Bulge, true);
        }
        Ok(params)
    }
}

pub fn load_params(path: &Path) -> Result<ParameterSet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read parameters {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse parameters {}", path.display()))
}

fn parse_assignment(s: &str) -> Result<(Knob, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KNOB=VALUE, got `{s}`"))?;
    let knob: Knob = key.parse().map_err(|e| format!("{e}"))?;
    let value: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("`{}` is not a number", value.trim()))?;
    Ok((knob, value))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn assignment_parsing() {
        assert_eq!(parse_assignment("bloom=8").unwrap(), (Knob::Bloom, 8.0));
        assert_eq!(parse_assignment("fry-intensity= 12.5").unwrap(), (Knob::FryIntensity, 12.5));
        assert!(parse_assignment("bloom").is_err());
        assert!(parse_assignment("wobble=3").is_err());
        assert!(parse_assignment("bloom=lots").is_err());
    }

    #[test]
    fn preset_then_overrides_then_flags() {
        let cli = Cli::try_parse_from([
            "hdrfry", "render", "in.jpg", "--preset", "hdr glow", "--set", "bloom=99", "--bulge",
        ])
        .unwrap();
        let Command::Render { effects, .. } = cli.command else {
            panic!("expected render");
        };
        let params = effects.resolve().unwrap();
        assert_eq!(params.get(Knob::HdrGamma), 25.0);
        // Clamped to the bloom range.
        assert_eq!(params.get(Knob::Bloom), 20.0);
        assert!(params.bulge());
        assert!(!params.lens_flare());
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(Cli::try_parse_from(["hdrfry", "render", "in.jpg", "--preset", "extra crispy"]).is_err());
    }

    #[test]
    fn params_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        std::fs::write(&path, r#"{ "knobs": { "glitch": 4 }, "lens_flare": true }"#).unwrap();
        let effects = EffectArgs {
            params: Some(path),
            ..EffectArgs::default()
        };
        let params = effects.resolve().unwrap();
        assert_eq!(params.get(Knob::Glitch), 4.0);
        assert!(params.lens_flare());
        assert_eq!(params.get(Knob::Saturation), 10.0);
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::try_parse_from(["hdrfry", "render", "a.png", "--format", "PNG"]).unwrap();
        let Command::Render { format, .. } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(format, Some(ExportFormat::Png));
    }
}
