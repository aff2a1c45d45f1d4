//! Best-effort HDR gamma tagging of exported files.
//!
//! Writing the tag needs an external tool. Callers hold a
//! `Box<dyn HdrTagWriter>` obtained from [`detect`], which is either a
//! working [`ExifTool`] or [`Unavailable`]; every failure comes back as a
//! [`MetadataError`] for the caller to report, never a panic.

pub mod exiftool;
pub mod maker_note;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

pub use exiftool::ExifTool;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata tool not available")]
    Unavailable,

    #[error("invalid HDR gamma {0}")]
    InvalidGamma(f32),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{step} timed out after {}s", timeout.as_secs())]
    Timeout { step: &'static str, timeout: Duration },

    #[error("{step} failed ({status}): {stderr}")]
    ToolFailed {
        step: &'static str,
        status: String,
        stderr: String,
    },
}

/// Something that can stamp an HDR gamma value into an image file.
pub trait HdrTagWriter: Send + Sync {
    fn is_available(&self) -> bool;

    /// Ensure the file has a maker-note block, then write `gamma` into it.
    fn try_write_hdr_tag(&self, path: &Path, gamma: f32) -> Result<(), MetadataError>;
}

/// Writer used when no tool was found. Always reports unavailability.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl HdrTagWriter for Unavailable {
    fn is_available(&self) -> bool {
        false
    }

    fn try_write_hdr_tag(&self, _path: &Path, _gamma: f32) -> Result<(), MetadataError> {
        Err(MetadataError::Unavailable)
    }
}

/// Find a usable metadata tool, preferring `explicit` over a `PATH` search.
pub fn detect(explicit: Option<&Path>) -> Box<dyn HdrTagWriter> {
    match ExifTool::locate(explicit) {
        Some(tool) => match tool.version() {
            Ok(version) => {
                info!(program = %tool.program().display(), %version, "exiftool found");
                Box::new(tool)
            }
            Err(err) => {
                warn!(%err, "exiftool present but not runnable, HDR tagging disabled");
                Box::new(Unavailable)
            }
        },
        None => {
            info!("exiftool not found, HDR tagging disabled");
            Box::new(Unavailable)
        }
    }
}
