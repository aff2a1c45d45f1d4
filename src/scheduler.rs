//! Debounced, latest-wins preview rendering.
//!
//! Requests go into a single `watch` slot, so a burst of slider moves
//! overwrites itself and only the newest snapshot is ever rendered. The
//! worker waits for a quiet period after the last request before rendering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbImage;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

use hdrfry_core::{ImageBuf, ParameterSet, Pipeline};

/// One preview render: a parameter snapshot tagged with its generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderRequest {
    pub generation: u64,
    pub params: ParameterSet,
    pub seed: u64,
}

#[derive(Debug)]
pub struct RenderOutcome {
    pub generation: u64,
    pub result: Result<RgbImage, String>,
    pub elapsed: Duration,
}

pub struct PreviewScheduler {
    slot: watch::Sender<Option<RenderRequest>>,
    worker: JoinHandle<()>,
}

impl PreviewScheduler {
    /// Start the worker. Finished renders are sent on `results`.
    pub fn spawn(
        working: Arc<ImageBuf>,
        quiet: Duration,
        results: mpsc::UnboundedSender<RenderOutcome>,
    ) -> Self {
        let (slot, rx) = watch::channel(None);
        let worker = tokio::spawn(run(rx, working, quiet, results));
        Self { slot, worker }
    }

    /// Replace whatever is pending with `request` and restart the quiet period.
    pub fn request(&self, request: RenderRequest) {
        self.slot.send_replace(Some(request));
    }

    /// Stop accepting requests. A pending request is still rendered.
    pub async fn shutdown(self) {
        drop(self.slot);
        if let Err(err) = self.worker.await {
            error!(%err, "preview worker panicked");
        }
    }
}

async fn run(
    mut rx: watch::Receiver<Option<RenderRequest>>,
    working: Arc<ImageBuf>,
    quiet: Duration,
    results: mpsc::UnboundedSender<RenderOutcome>,
) {
    let pipeline = Arc::new(Pipeline::new());
    let mut closed = false;

    while !closed {
        if rx.changed().await.is_err() {
            break;
        }

        // Debounce: every new request restarts the timer.
        loop {
            match tokio::time::timeout(quiet, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let Some(request) = *rx.borrow_and_update() else {
            continue;
        };
        debug!(generation = request.generation, "rendering preview");

        let pipeline = Arc::clone(&pipeline);
        let working = Arc::clone(&working);
        let t0 = Instant::now();
        let result = tokio::task::spawn_blocking(move || render(&pipeline, &working, &request))
            .await
            .unwrap_or_else(|err| Err(format!("render task failed: {err}")));

        let outcome = RenderOutcome {
            generation: request.generation,
            result,
            elapsed: t0.elapsed(),
        };
        if results.send(outcome).is_err() {
            break;
        }
    }
    debug!("preview worker stopped");
}

fn render(pipeline: &Pipeline, working: &ImageBuf, request: &RenderRequest) -> Result<RgbImage, String> {
    pipeline
        .process_cpu(working.clone(), &request.params, request.seed)
        .map(|buf| buf.to_rgb8())
        .map_err(|err| format!("{err:#}"))
}
