mod cli;
mod config;
mod live;
mod scheduler;
mod session;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hdrfry_core::params::KNOBS;
use hdrfry_core::{Category, ImageBuf, Pipeline, PresetLibrary, load, preview};
use hdrfry_export::{ExportFormat, ExportOptions, Exporter, default_output_path};

use cli::{Cli, Command, EffectArgs};
use config::AppConfig;
use session::Session;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            input,
            output,
            format,
            effects,
        } => render(&config, &input, output.as_deref(), format, &effects),
        Command::Preview {
            input,
            output,
            max_edge,
            effects,
        } => render_preview(&config, &input, &output, max_edge, &effects),
        Command::Live {
            input,
            preview_out,
            effects,
        } => {
            let params = effects.resolve()?;
            let source = load::load_any(&input)?;
            let session = Session::new(
                source,
                config.preview_max_edge,
                params,
                config.seed(effects.seed),
            );
            let exporter = Arc::new(exporter(&config, None));
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            runtime.block_on(live::run(session, exporter, &config, preview_out))
        }
        Command::Knobs => {
            print_knobs();
            Ok(())
        }
        Command::Presets => {
            print_presets();
            Ok(())
        }
    }
}

fn exporter(config: &AppConfig, format: Option<ExportFormat>) -> Exporter {
    let writer = hdrfry_metadata::detect(config.exiftool_path.as_deref());
    let options = ExportOptions {
        format,
        jpeg_quality: config.jpeg_quality,
    };
    Exporter::new(options, writer)
}

fn render(
    config: &AppConfig,
    input: &Path,
    output: Option<&Path>,
    format: Option<ExportFormat>,
    effects: &EffectArgs,
) -> Result<()> {
    let params = effects.resolve()?;
    let seed = config.seed(effects.seed);
    let source = load::load_any(input)?;

    let dest = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(input, format.unwrap_or(ExportFormat::Jpeg)),
    };
    let exporter = exporter(config, format);
    if params.hdr_gamma() > 0.0 && !exporter.metadata_available() {
        warn!("exiftool not found; HDRGamma will not be written");
    }

    info!(seed, stages = ?Pipeline::new().active_stages(&params), "rendering");
    let report = exporter
        .export(&source, &params, seed, &dest)
        .with_context(|| format!("export to {} failed", dest.display()))?;
    if report.metadata.is_warning() {
        warn!(outcome = ?report.metadata, "metadata not applied");
    }
    println!("{}", report.status_line());
    Ok(())
}

fn render_preview(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    max_edge: Option<u32>,
    effects: &EffectArgs,
) -> Result<()> {
    let params = effects.resolve()?;
    let seed = config.seed(effects.seed);
    let source = load::load_any(input)?;

    let working: ImageBuf = preview::working_copy(&source, max_edge.unwrap_or(config.preview_max_edge));
    let frame = Pipeline::new().process_cpu(working, &params, seed)?.to_rgb8();
    frame
        .save(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("preview: {} ({}x{})", output.display(), frame.width(), frame.height());
    Ok(())
}

fn print_knobs() {
    let mut current: Option<Category> = None;
    for spec in &KNOBS {
        if current != Some(spec.category) {
            println!("{}", spec.category.label());
            current = Some(spec.category);
        }
        println!(
            "  {:<14} {:>5} ..{:>5}  default {:>5}",
            spec.key, spec.min, spec.max, spec.default
        );
    }
    println!("{}", Category::Extras.label());
    println!("  lens_flare     on/off          default off");
    println!("  bulge          on/off          default off");
}

fn print_presets() {
    for &preset in PresetLibrary::all() {
        let params = preset.params();
        let mut parts: Vec<String> = preset
            .overrides()
            .iter()
            .map(|(knob, value)| format!("{knob}={value}"))
            .collect();
        if params.lens_flare() {
            parts.push("lens_flare".into());
        }
        if params.bulge() {
            parts.push("bulge".into());
        }
        let summary = if parts.is_empty() {
            "(defaults)".to_string()
        } else {
            parts.join(" ")
        };
        println!("{:<10} {summary}", preset.name());
    }
}
