//! Dated rotation of the on-disk log copy
//!
//! The active file is always `latest.log` inside the logs directory next to
//! the running executable. Whenever the calendar date moves on (or a stale
//! file is found at startup), the previous file is renamed to
//! `YYYY-MM-DD-N.log` using its last-modified date and the smallest free
//! sequence number, and a fresh `latest.log` is started.
//!
//! File logging is best effort: any file-system failure disables it until
//! the next date change and never reaches logging callers.

use std::env;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};

/// Name of the active log file
const LATEST_NAME: &str = "latest.log";

/// Today's calendar date in local time
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Logs directory next to the running executable, falling back to a
/// working-directory `logs` when the executable path is unavailable
pub(crate) fn default_logs_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_default()
        .join("logs")
}

/// The active log file and its rotation bookkeeping.
///
/// Owned by the worker thread; no internal synchronization.
pub(crate) struct RotatingLogFile {
    dir: PathBuf,
    latest: PathBuf,
    file: Option<File>,
    created: Option<NaiveDate>,
}

impl RotatingLogFile {
    pub(crate) fn new(dir: PathBuf) -> Self {
        let latest = dir.join(LATEST_NAME);
        Self {
            dir,
            latest,
            file: None,
            created: None,
        }
    }

    /// Archive any existing file and open a fresh `latest.log`.
    ///
    /// The attempted date is recorded even on failure, so a broken
    /// file-system is retried once per date change instead of per entry.
    pub(crate) fn open(&mut self, date: NaiveDate) {
        // Close the current handle first; an open file cannot be renamed
        // everywhere
        self.file = None;
        self.file = self.try_open().ok();
        self.created = Some(date);
    }

    /// Re-run the open sequence when the calendar date has moved past the
    /// recorded creation date
    pub(crate) fn rotate_if_stale(&mut self, date: NaiveDate) {
        if self.created != Some(date) {
            self.open(date);
        }
    }

    /// Currently open file handle, while file logging is healthy
    pub(crate) fn handle(&mut self) -> Option<&mut File> {
        self.file.as_mut()
    }

    fn try_open(&self) -> Result<File> {
        fs::create_dir_all(&self.dir).context("Failed to create logs directory")?;
        self.archive_existing()?;
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.latest)
            .context("Failed to open latest.log")
    }

    /// Rename an existing `latest.log` to its dated archive name
    fn archive_existing(&self) -> Result<()> {
        if !self.latest.exists() {
            return Ok(());
        }
        let date = fs::metadata(&self.latest)
            .and_then(|meta| meta.modified())
            .map(|mtime| DateTime::<Local>::from(mtime).date_naive())
            .unwrap_or_else(|_| today());
        let target = archive_path(&self.dir, date);
        fs::rename(&self.latest, &target).context("Failed to archive latest.log")
    }
}

/// First free `YYYY-MM-DD-N.log` path for the given date
fn archive_path(dir: &Path, date: NaiveDate) -> PathBuf {
    let mut seq = 1u32;
    loop {
        let candidate = dir.join(format!("{}-{}.log", date.format("%Y-%m-%d"), seq));
        if !candidate.exists() {
            return candidate;
        }
        seq += 1;
    }
}
