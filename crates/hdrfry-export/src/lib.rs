//! Full-resolution export: run the pipeline on the original image, encode,
//! replace the destination atomically, then try to tag HDR gamma.

mod encode;
mod report;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::RgbImage;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use hdrfry_core::{ImageBuf, ParameterSet, Pipeline};
use hdrfry_metadata::HdrTagWriter;

pub use encode::{ExportFormat, encode};
pub use report::{ExportReport, MetadataOutcome};

pub const DEFAULT_JPEG_QUALITY: u8 = 98;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot tell the output format of {}; use .jpg, .jpeg or .png", .0.display())]
    UnknownFormat(PathBuf),

    #[error("effect pipeline failed: {0:#}")]
    Pipeline(anyhow::Error),

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    /// Explicit format. When `None` it is taken from the destination's
    /// extension.
    pub format: Option<ExportFormat>,
    pub jpeg_quality: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// `meme_<stem>.<ext>` next to `input`.
pub fn default_output_path(input: &Path, format: ExportFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("meme_{stem}.{}", format.extension()))
}

pub struct Exporter {
    pipeline: Pipeline,
    options: ExportOptions,
    writer: Box<dyn HdrTagWriter>,
}

impl Exporter {
    pub fn new(options: ExportOptions, writer: Box<dyn HdrTagWriter>) -> Self {
        Self {
            pipeline: Pipeline::new(),
            options,
            writer,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn metadata_available(&self) -> bool {
        self.writer.is_available()
    }

    /// Render `source` with `params` and write it to `dest`.
    ///
    /// Any error leaves a pre-existing `dest` untouched. A metadata
    /// failure is not an error; it is reported in the returned
    /// [`ExportReport`].
    pub fn export(
        &self,
        source: &RgbImage,
        params: &ParameterSet,
        seed: u64,
        dest: &Path,
    ) -> Result<ExportReport, ExportError> {
        let format = self
            .options
            .format
            .or_else(|| ExportFormat::from_path(dest))
            .ok_or_else(|| ExportError::UnknownFormat(dest.to_path_buf()))?;

        let t0 = Instant::now();
        let rendered = self
            .pipeline
            .process_cpu(ImageBuf::from_rgb8(source), params, seed)
            .map_err(ExportError::Pipeline)?
            .to_rgb8();

        let bytes = encode(&rendered, format, self.options.jpeg_quality)?;
        write_atomic(dest, &bytes)?;
        info!(
            path = %dest.display(),
            ?format,
            width = rendered.width(),
            height = rendered.height(),
            bytes = bytes.len(),
            elapsed_ms = t0.elapsed().as_millis(),
            "exported"
        );

        let metadata = self.apply_metadata(dest, format, params);
        Ok(ExportReport {
            path: dest.to_path_buf(),
            format,
            width: rendered.width(),
            height: rendered.height(),
            metadata,
        })
    }

    fn apply_metadata(
        &self,
        dest: &Path,
        format: ExportFormat,
        params: &ParameterSet,
    ) -> MetadataOutcome {
        let gamma = params.hdr_gamma();
        if format != ExportFormat::Jpeg || gamma <= 0.0 {
            return MetadataOutcome::NotRequested;
        }
        if !self.writer.is_available() {
            warn!(gamma, "HDRGamma not written: metadata tool unavailable");
            return MetadataOutcome::Unavailable { gamma };
        }
        match self.writer.try_write_hdr_tag(dest, gamma) {
            Ok(()) => {
                info!(gamma, "HDRGamma written");
                MetadataOutcome::Applied { gamma }
            }
            Err(err) => {
                warn!(%err, gamma, "HDRGamma not written");
                MetadataOutcome::Failed {
                    gamma,
                    message: err.to_string(),
                }
            }
        }
    }
}

/// Write `bytes` to a temp file beside `dest`, then rename it over `dest`.
fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(io_error(format!("create temp file in {}", dir.display())))?;
    tmp.write_all(bytes)
        .map_err(io_error(format!("write {}", dest.display())))?;
    tmp.as_file()
        .sync_all()
        .map_err(io_error(format!("sync {}", dest.display())))?;
    tmp.persist(dest)
        .map_err(|e| io_error(format!("replace {}", dest.display()))(e.error))?;
    Ok(())
}

fn io_error(context: String) -> impl FnOnce(io::Error) -> ExportError {
    move |source| ExportError::Io { context, source }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use image::Rgb;

    use hdrfry_core::{Flag, Knob};
    use hdrfry_metadata::MetadataError;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        available: bool,
        fail: bool,
        calls: Arc<Mutex<Vec<(PathBuf, f32)>>>,
    }

    impl HdrTagWriter for Recorder {
        fn is_available(&self) -> bool {
            self.available
        }

        fn try_write_hdr_tag(&self, path: &Path, gamma: f32) -> Result<(), MetadataError> {
            self.calls.lock().unwrap().push((path.to_path_buf(), gamma));
            if self.fail {
                Err(MetadataError::ToolFailed {
                    step: "write HDRGamma",
                    status: "exit status: 1".into(),
                    stderr: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn exporter(available: bool, fail: bool) -> (Exporter, Arc<Mutex<Vec<(PathBuf, f32)>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let writer = Recorder {
            available,
            fail,
            calls: calls.clone(),
        };
        (Exporter::new(ExportOptions::default(), Box::new(writer)), calls)
    }

    fn source() -> RgbImage {
        RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 90]))
    }

    #[test]
    fn zero_gamma_never_calls_writer() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.jpg");
        let (exp, calls) = exporter(true, false);
        let params = ParameterSet::default().with(Knob::Saturation, 20.0);

        let report = exp.export(&source(), &params, 1, &dest).unwrap();
        assert_eq!(report.metadata, MetadataOutcome::NotRequested);
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(report.status_line(), "saved: out.jpg");
    }

    #[test]
    fn png_never_calls_writer() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.png");
        let (exp, calls) = exporter(true, false);
        let params = ParameterSet::default().with(Knob::HdrGamma, 25.0);

        let report = exp.export(&source(), &params, 1, &dest).unwrap();
        assert_eq!(report.format, ExportFormat::Png);
        assert_eq!(report.metadata, MetadataOutcome::NotRequested);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn jpeg_with_gamma_is_tagged() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("glow.jpg");
        let (exp, calls) = exporter(true, false);
        let params = ParameterSet::default().with(Knob::HdrGamma, 25.0);

        let report = exp.export(&source(), &params, 1, &dest).unwrap();
        assert_eq!(report.metadata, MetadataOutcome::Applied { gamma: 2.5 });
        assert_eq!(report.status_line(), "saved with HDRGamma=2.5");
        assert_eq!(calls.lock().unwrap().as_slice(), &[(dest.clone(), 2.5)]);
    }

    #[test]
    fn metadata_failure_keeps_the_export() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("fried.jpg");
        let (exp, _calls) = exporter(true, true);
        let params = hdrfry_core::Preset::Nuclear.params();

        let report = exp.export(&source(), &params, 1, &dest).unwrap();
        assert!(matches!(report.metadata, MetadataOutcome::Failed { .. }));
        assert!(report.metadata.is_warning());
        let decoded = image::open(&dest).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn unavailable_tool_is_not_invoked() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.jpeg");
        let (exp, calls) = exporter(false, false);
        let params = ParameterSet::default().with(Knob::HdrGamma, 10.0);

        let report = exp.export(&source(), &params, 1, &dest).unwrap();
        assert_eq!(report.metadata, MetadataOutcome::Unavailable { gamma: 1.0 });
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn export_is_full_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("big.png");
        let (exp, _) = exporter(false, false);
        let big = RgbImage::from_pixel(1300, 700, Rgb([30, 60, 90]));
        let params = ParameterSet::default().with_flag(Flag::Bulge, true);

        let report = exp.export(&big, &params, 0, &dest).unwrap();
        assert_eq!((report.width, report.height), (1300, 700));
        let decoded = image::open(&dest).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1300, 700));
    }

    #[test]
    fn png_export_matches_pipeline_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("exact.png");
        let (exp, _) = exporter(false, false);
        let params = ParameterSet::default().with(Knob::Posterize, 4.0);

        exp.export(&source(), &params, 3, &dest).unwrap();
        let expected = Pipeline::new()
            .process_cpu(ImageBuf::from_rgb8(&source()), &params, 3)
            .unwrap()
            .to_rgb8();
        assert_eq!(image::open(&dest).unwrap().to_rgb8(), expected);
    }

    #[test]
    fn unknown_extension_leaves_prior_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.gif");
        std::fs::write(&dest, b"previous").unwrap();
        let (exp, _) = exporter(true, false);

        let err = exp
            .export(&source(), &ParameterSet::default(), 0, &dest)
            .unwrap_err();
        assert!(matches!(err, ExportError::UnknownFormat(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    }

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.png");
        std::fs::write(&dest, b"previous").unwrap();
        let (exp, _) = exporter(false, false);

        exp.export(&source(), &ParameterSet::default(), 0, &dest).unwrap();
        assert!(image::open(&dest).is_ok());
        // Only the destination remains; the temp file was renamed over it.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be replaced by a file.
        let dest = dir.path().join("taken.png");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), b"x").unwrap();
        let (exp, _) = exporter(false, false);

        let err = exp
            .export(&source(), &ParameterSet::default(), 0, &dest)
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
        assert!(dest.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn default_name_follows_input_stem() {
        assert_eq!(
            default_output_path(Path::new("/photos/cat.heic.png"), ExportFormat::Jpeg),
            PathBuf::from("/photos/meme_cat.heic.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("dog.JPG"), ExportFormat::Png),
            PathBuf::from("meme_dog.png")
        );
    }
}
