use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::maker_note::{APPLE_MAKER_NOTE, EXIFTOOL_CONFIG, has_maker_note};
use crate::{HdrTagWriter, MetadataError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[cfg(windows)]
const PROGRAM_NAMES: &[&str] = &["exiftool.exe", "exiftool"];
#[cfg(not(windows))]
const PROGRAM_NAMES: &[&str] = &["exiftool"];

/// HDR tag writer backed by the `exiftool` command-line program.
#[derive(Clone, Debug)]
pub struct ExifTool {
    program: PathBuf,
    timeout: Duration,
}

impl ExifTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Bound on each individual tool invocation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Use `explicit` if given and it exists, otherwise search `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Option<Self> {
        match explicit {
            Some(path) => path.is_file().then(|| Self::new(path)),
            None => search_path(std::env::var_os("PATH").as_deref()).map(Self::new),
        }
    }

    /// The tool's self-reported version string.
    pub fn version(&self) -> Result<String, MetadataError> {
        let out = self.run("version probe", ["-ver"])?;
        Ok(out.trim().to_string())
    }

    /// Run the tool with `args`, killing it if it outlives the timeout.
    /// Returns captured stdout.
    fn run<I, S>(&self, step: &'static str, args: I) -> Result<String, MetadataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| MetadataError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a chatty tool never
        // blocks on a full pipe while we poll for exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(MetadataError::Timeout {
                        step,
                        timeout: self.timeout,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    return Err(MetadataError::Io {
                        context: format!("waiting for {step}"),
                        source,
                    });
                }
            }
        };

        let stdout = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
        let stderr = stderr.and_then(|h| h.join().ok()).unwrap_or_default();
        debug!(step, %status, elapsed_ms = started.elapsed().as_millis(), "exiftool finished");

        if !status.success() {
            return Err(MetadataError::ToolFailed {
                step,
                status: status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(stdout)
    }
}

impl HdrTagWriter for ExifTool {
    fn is_available(&self) -> bool {
        self.program.is_file()
    }

    fn try_write_hdr_tag(&self, path: &Path, gamma: f32) -> Result<(), MetadataError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(MetadataError::InvalidGamma(gamma));
        }

        // Config and template live only for the duration of this call.
        let scratch = tempfile::tempdir().map_err(|source| MetadataError::Io {
            context: "create scratch directory".into(),
            source,
        })?;
        let config = scratch.path().join("hdrfry.config");
        let template = scratch.path().join("makernote.bin");
        write_file(&config, EXIFTOOL_CONFIG.as_bytes())?;
        write_file(&template, &APPLE_MAKER_NOTE)?;

        if !has_maker_note(path)? {
            debug!(?path, "injecting maker note template");
            let mut inject = OsString::from("-MakerNotes<=");
            inject.push(template.as_os_str());
            self.run(
                "inject maker note",
                [
                    OsStr::new("-config"),
                    config.as_os_str(),
                    OsStr::new("-overwrite_original"),
                    inject.as_os_str(),
                    path.as_os_str(),
                ],
            )?;
        }

        let tag = format!("-Apple:HDRGamma={gamma}");
        self.run(
            "write HDRGamma",
            [
                OsStr::new("-config"),
                config.as_os_str(),
                OsStr::new("-overwrite_original"),
                OsStr::new(&tag),
                path.as_os_str(),
            ],
        )?;
        debug!(?path, gamma, "HDRGamma written");
        Ok(())
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), MetadataError> {
    std::fs::write(path, bytes).map_err(|source| MetadataError::Io {
        context: format!("write {}", path.display()),
        source,
    })
}

/// First `exiftool` executable found in the given `PATH` value.
fn search_path(path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(path_var)
        .flat_map(|dir| PROGRAM_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}
