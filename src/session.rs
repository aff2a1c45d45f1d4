use std::sync::Arc;

use image::RgbImage;
use tracing::{info, warn};

use hdrfry_core::{Flag, ImageBuf, Knob, ParameterSet, Preset, PresetLibrary, preview};
use hdrfry_export::{ExportError, ExportReport};

use crate::scheduler::{RenderOutcome, RenderRequest};

const STATUS_ERROR_LEN: usize = 40;

/// The single open document: the original image, its preview working copy
/// and the live slider state.
pub struct Session {
    source: Arc<RgbImage>,
    working: Arc<ImageBuf>,
    params: ParameterSet,
    seed: u64,
    /// Generation of the most recent render request.
    requested: u64,
    frame: Option<RgbImage>,
    frame_generation: u64,
    status: String,
}

impl Session {
    pub fn new(source: RgbImage, preview_max_edge: u32, params: ParameterSet, seed: u64) -> Self {
        let working = preview::working_copy(&source, preview_max_edge);
        info!(
            width = source.width(),
            height = source.height(),
            preview_width = working.width,
            preview_height = working.height,
            "session opened"
        );
        Self {
            source: Arc::new(source),
            working: Arc::new(working),
            params,
            seed,
            requested: 0,
            frame: None,
            frame_generation: 0,
            status: String::new(),
        }
    }

    pub fn source(&self) -> Arc<RgbImage> {
        Arc::clone(&self.source)
    }

    pub fn working(&self) -> Arc<ImageBuf> {
        Arc::clone(&self.working)
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn set_knob(&mut self, knob: Knob, value: f32) -> f32 {
        self.params.set(knob, value)
    }

    pub fn set_flag(&mut self, flag: Flag, on: bool) {
        self.params.set_flag(flag, on);
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        PresetLibrary::apply(preset, &mut self.params);
        self.status = format!("preset: {preset}");
    }

    /// Snapshot the current parameters into a new, newest render request.
    pub fn next_request(&mut self) -> RenderRequest {
        self.requested += 1;
        RenderRequest {
            generation: self.requested,
            params: self.params,
            seed: self.seed,
        }
    }

    /// Take a finished render. Results older than the latest request are
    /// dropped; a failed render keeps the previous frame. Returns whether
    /// the displayed frame changed.
    pub fn accept(&mut self, outcome: RenderOutcome) -> bool {
        if outcome.generation < self.requested {
            return false;
        }
        match outcome.result {
            Ok(frame) => {
                self.frame = Some(frame);
                self.frame_generation = outcome.generation;
                self.status = format!("preview ready ({} ms)", outcome.elapsed.as_millis());
                true
            }
            Err(message) => {
                warn!(generation = outcome.generation, %message, "preview failed");
                self.status = error_status(&message);
                false
            }
        }
    }

    pub fn record_export(&mut self, result: &Result<ExportReport, ExportError>) {
        self.status = match result {
            Ok(report) => report.status_line(),
            Err(err) => error_status(&err.to_string()),
        };
    }

    pub fn frame(&self) -> Option<&RgbImage> {
        self.frame.as_ref()
    }

    pub fn frame_generation(&self) -> u64 {
        self.frame_generation
    }

    pub fn status(&self) -> &str {
        &self.status
    }
}

fn error_status(message: &str) -> String {
    let short: String = message.chars().take(STATUS_ERROR_LEN).collect();
    format!("error: {short}")
}
