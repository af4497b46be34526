//! File-backed logging. The terminal belongs to the records browser, so
//! nothing is written to stdout/stderr; events go to a size-capped log file
//! in the data directory.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// `hours:minutes:seconds:millis`
const TIME_FORMAT: &str = "%H:%M:%S:%3f";

static INIT_ONCE: Once = Once::new();

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// filter. Only the first call has any effect; it fails if some other global
/// subscriber is already in place.
pub fn init(config: &LogConfig) -> Result<()> {
    let writer = Arc::new(
        SizeCappedFile::open(&config.path, config.max_bytes)
            .with_context(|| format!("failed to open log file {}", config.path.display()))?,
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let mut installed = Ok(());
    INIT_ONCE.call_once(|| {
        installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
            .try_init()
            .map_err(|err| anyhow!("failed to install log subscriber: {err}"));
    });
    installed
}

/// Append-only log file that moves itself to `<name>.old` once it would grow
/// past `max_bytes`.
pub struct SizeCappedFile {
    path: PathBuf,
    max_bytes: u64,
    state: Mutex<FileState>,
}

struct FileState {
    file: File,
    written: u64,
}

impl SizeCappedFile {
    /// Open (or create) the log at `path`, counting bytes already in it
    /// towards the cap.
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = open_append(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            state: Mutex::new(FileState { file, written }),
        })
    }

    /// Where the previous generation is kept after a rollover.
    pub fn rotated_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".old");
        self.path.with_file_name(name)
    }

    fn rotate(&self, state: &mut FileState) -> io::Result<()> {
        state.file.flush()?;
        fs::rename(&self.path, self.rotated_path())?;
        state.file = open_append(&self.path)?;
        state.written = 0;
        Ok(())
    }
}

impl Write for &SizeCappedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        if state.written > 0 && state.written + buf.len() as u64 > self.max_bytes {
            self.rotate(&mut state)?;
        }
        let written = state.file.write(buf)?;
        state.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?
            .file
            .flush()
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
