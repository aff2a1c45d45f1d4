use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use hdrfry_core::{Flag, Knob, Preset};
use hdrfry_export::Exporter;

use crate::config::AppConfig;
use crate::scheduler::{PreviewScheduler, RenderOutcome};
use crate::session::Session;

/// One line typed into a live session.
#[derive(Clone, Debug, PartialEq)]
pub enum LiveCommand {
    Set(Knob, f32),
    Flag(Flag, bool),
    Preset(Preset),
    Export(PathBuf),
    Show,
    Quit,
}

impl FromStr for LiveCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let rest: Vec<&str> = words.collect();
        let cmd = match (verb, rest.as_slice()) {
            ("set", [knob, value]) => {
                let value = value
                    .parse::<f32>()
                    .with_context(|| format!("`{value}` is not a number"))?;
                LiveCommand::Set(knob.parse()?, value)
            }
            ("flag", [flag, state]) => {
                let on = match *state {
                    "on" | "true" | "1" => true,
                    "off" | "false" | "0" => false,
                    other => bail!("expected on or off, got `{other}`"),
                };
                LiveCommand::Flag(flag.parse()?, on)
            }
            ("preset", [_, ..]) => LiveCommand::Preset(rest.join(" ").parse()?),
            ("export", [path]) => LiveCommand::Export(PathBuf::from(path)),
            ("show", []) => LiveCommand::Show,
            ("quit" | "exit", []) => LiveCommand::Quit,
            _ => bail!(
                "unknown command `{}` (try: set, flag, preset, export, show, quit)",
                line.trim()
            ),
        };
        Ok(cmd)
    }
}

/// Drive `session` from stdin until `quit` or end of input.
pub async fn run(
    mut session: Session,
    exporter: Arc<Exporter>,
    config: &AppConfig,
    preview_out: Option<PathBuf>,
) -> Result<()> {
    let (results_tx, mut results) = mpsc::unbounded_channel();
    let scheduler = PreviewScheduler::spawn(session.working(), config.debounce(), results_tx);
    scheduler.request(session.next_request());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let cmd = match line.parse::<LiveCommand>() {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        println!("{err:#}");
                        continue;
                    }
                };
                match cmd {
                    LiveCommand::Set(knob, value) => {
                        let stored = session.set_knob(knob, value);
                        println!("{knob} = {stored}");
                        scheduler.request(session.next_request());
                    }
                    LiveCommand::Flag(flag, on) => {
                        session.set_flag(flag, on);
                        scheduler.request(session.next_request());
                    }
                    LiveCommand::Preset(preset) => {
                        session.apply_preset(preset);
                        println!("{}", session.status());
                        scheduler.request(session.next_request());
                    }
                    LiveCommand::Export(path) => {
                        export(&mut session, &exporter, path).await;
                        println!("{}", session.status());
                    }
                    LiveCommand::Show => show(&session),
                    LiveCommand::Quit => break,
                }
            }
            Some(outcome) = results.recv() => present(&mut session, outcome, preview_out.as_deref()),
        }
    }

    // The worker renders whatever was still pending before it stops.
    scheduler.shutdown().await;
    while let Some(outcome) = results.recv().await {
        present(&mut session, outcome, preview_out.as_deref());
    }
    info!("live session closed");
    Ok(())
}

/// Hand a finished render to the session and mirror a new frame to
/// `preview_out`.
fn present(session: &mut Session, outcome: RenderOutcome, preview_out: Option<&Path>) {
    if session.accept(outcome)
        && let (Some(path), Some(frame)) = (preview_out, session.frame())
        && let Err(err) = frame.save(path)
    {
        warn!(%err, path = %path.display(), "failed to write preview");
    }
    println!("{}", session.status());
}

/// Full-resolution export of the current snapshot, off the async threads.
async fn export(session: &mut Session, exporter: &Arc<Exporter>, dest: PathBuf) {
    let source = session.source();
    let params = *session.params();
    let seed = session.seed();
    let exporter = Arc::clone(exporter);

    let result = tokio::task::spawn_blocking(move || exporter.export(&source, &params, seed, &dest)).await;
    match result {
        Ok(result) => {
            if let Err(err) = &result {
                error!(%err, "export failed");
            }
            session.record_export(&result);
        }
        Err(err) => error!(%err, "export task panicked"),
    }
}

fn show(session: &Session) {
    let params = session.params();
    let changed = params.changed();
    if changed.is_empty() {
        println!("all knobs at defaults");
    }
    for (knob, value) in changed {
        println!("  {knob} = {value}");
    }
    println!(
        "  lens_flare = {}, bulge = {}",
        params.lens_flare(),
        params.bulge()
    );
    if let Some(frame) = session.frame() {
        println!(
            "  preview #{} {}x{}",
            session.frame_generation(),
            frame.width(),
            frame.height()
        );
    }
    if !session.status().is_empty() {
        println!("  {}", session.status());
    }
}
