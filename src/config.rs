use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use hdrfry_core::preview::DEFAULT_MAX_EDGE;
use hdrfry_export::DEFAULT_JPEG_QUALITY;

/// Application settings, read from a JSON file. Every field is optional in
/// the file and falls back to its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Longest edge of the interactive preview, in pixels.
    pub preview_max_edge: u32,
    /// Quiet period before a parameter change triggers a preview render.
    pub debounce_ms: u64,
    pub jpeg_quality: u8,
    /// Explicit exiftool binary. When unset, `PATH` is searched.
    pub exiftool_path: Option<PathBuf>,
    /// Fixed seed for the stochastic stages.
    pub seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preview_max_edge: DEFAULT_MAX_EDGE,
            debounce_ms: 80,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            exiftool_path: None,
            seed: None,
        }
    }
}

impl AppConfig {
    /// `<config dir>/hdrfry/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hdrfry").join("config.json"))
    }

    /// Load `explicit` if given (it must exist), otherwise the default
    /// location if present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        self.preview_max_edge = self.preview_max_edge.max(1);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Seed for a run: the command line wins, then the config, then entropy.
    pub fn seed(&self, cli: Option<u64>) -> u64 {
        cli.or(self.seed).unwrap_or_else(rand::random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn defaults() {
        let c = AppConfig::default();
        assert_eq!(c.preview_max_edge, 600);
        assert_eq!(c.debounce(), Duration::from_millis(80));
        assert_eq!(c.jpeg_quality, 98);
        assert_eq!(c.exiftool_path, None);
        assert_eq!(c.seed, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "debounce_ms": 150, "seed": 7 }"#);
        let c = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(c.debounce_ms, 150);
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.preview_max_edge, 600);
    }

    #[test]
    fn out_of_range_values_are_pulled_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "preview_max_edge": 0, "jpeg_quality": 0 }"#);
        let c = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(c.preview_max_edge, 1);
        assert_eq!(c.jpeg_quality, 1);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, r#"{ "debounce": 10 }"#);
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse config"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::load(Some(&dir.path().join("nope.json"))).is_err());
    }

    #[test]
    fn seed_precedence() {
        let c = AppConfig {
            seed: Some(5),
            ..AppConfig::default()
        };
        assert_eq!(c.seed(Some(9)), 9);
        assert_eq!(c.seed(None), 5);
    }
}
