use std::path::PathBuf;

use crate::ExportFormat;

/// What happened to the HDR gamma tag during an export.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataOutcome {
    /// PNG output, or HDR gamma is zero.
    NotRequested,
    Applied { gamma: f32 },
    Unavailable { gamma: f32 },
    Failed { gamma: f32, message: String },
}

impl MetadataOutcome {
    /// Outcomes the user should be told about.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            MetadataOutcome::Unavailable { .. } | MetadataOutcome::Failed { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct ExportReport {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub metadata: MetadataOutcome,
}

impl ExportReport {
    /// One-line summary for the status area.
    pub fn status_line(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        match &self.metadata {
            MetadataOutcome::NotRequested => format!("saved: {name}"),
            MetadataOutcome::Applied { gamma } => format!("saved with HDRGamma={gamma}"),
            MetadataOutcome::Unavailable { .. } => {
                format!("saved: {name} (HDRGamma skipped: exiftool not found)")
            }
            MetadataOutcome::Failed { message, .. } => {
                format!("saved: {name} (HDRGamma failed: {message})")
            }
        }
    }
}
