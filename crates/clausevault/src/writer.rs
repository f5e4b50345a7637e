//! # Retrying File Writer
//!
//! Settings documents and diagnostic logs are written to files that other
//! processes may briefly hold open: a second app instance, a backup agent, a
//! virus scanner. Those failures go away on their own, so a write is retried a
//! bounded number of times instead of failing on the first sharing violation.
//!
//! ## Contract
//!
//! - At most [`RetryPolicy::max_attempts`] attempts (default
//!   [`DEFAULT_MAX_ATTEMPTS`]). Retries are immediate unless the policy sets a
//!   delay.
//! - Only transient errors are retried (see [`is_transient`]). Anything else
//!   stops the sequence at once.
//! - A [`CancelToken`] is checked before every attempt.
//! - [`RetryingFileWriter::write`] reports the outcome. [`RetryingFileWriter::write_or_drop`]
//!   keeps the legacy fire-and-forget behavior: the final failure is logged
//!   and swallowed, and returning only means the write was attempted.
//!
//! ## Write Modes
//!
//! - [`WriteMode::Append`]: open with append, create if missing.
//! - [`WriteMode::Overwrite`]: write to a sibling temp file, then rename over
//!   the target, so readers never observe a half-written document.

use crate::error::{Result, VaultError};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Append,
    Overwrite,
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("gave up writing {} after {attempts} attempts: {source}", path.display())]
    Exhausted {
        path: PathBuf,
        attempts: u32,
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Fatal { path: PathBuf, source: io::Error },

    #[error("write to {} cancelled after {attempts} attempts", path.display())]
    Cancelled { path: PathBuf, attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between attempts. Zero retries immediately.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Shared flag that aborts an in-progress retry sequence.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Errors worth another attempt: locks and sharing violations that clear up
/// once the other holder lets go.
pub fn is_transient(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        ErrorKind::WouldBlock | ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::ResourceBusy
    ) {
        return true;
    }
    // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    cfg!(windows) && matches!(err.raw_os_error(), Some(32) | Some(33))
}

/// One raw write attempt.
pub trait FileSink {
    fn write(&self, path: &Path, content: &str, mode: WriteMode) -> io::Result<()>;
}

/// Writes to the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSink;

impl FileSink for FsSink {
    fn write(&self, path: &Path, content: &str, mode: WriteMode) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        match mode {
            WriteMode::Append => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                file.write_all(content.as_bytes())?;
                file.flush()
            }
            WriteMode::Overwrite => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let tmp_path = path.with_file_name(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
                if let Err(e) = fs::write(&tmp_path, content) {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(e);
                }
                fs::rename(&tmp_path, path).inspect_err(|_| {
                    let _ = fs::remove_file(&tmp_path);
                })
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryingFileWriter<S: FileSink = FsSink> {
    sink: S,
    policy: RetryPolicy,
    cancel: Option<CancelToken>,
}

impl RetryingFileWriter<FsSink> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sink(FsSink, policy)
    }
}

impl<S: FileSink> RetryingFileWriter<S> {
    pub fn with_sink(sink: S, policy: RetryPolicy) -> Self {
        Self {
            sink,
            policy,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Writes `content`, retrying transient failures.
    ///
    /// Returns the number of attempts it took.
    pub fn write(&self, path: &Path, content: &str, mode: WriteMode) -> std::result::Result<u32, WriteError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        loop {
            if self.cancelled() {
                return Err(WriteError::Cancelled {
                    path: path.to_path_buf(),
                    attempts,
                });
            }

            attempts += 1;
            match self.sink.write(path, content, mode) {
                Ok(()) => {
                    if attempts > 1 {
                        tracing::debug!("wrote {} after {} attempts", path.display(), attempts);
                    }
                    return Ok(attempts);
                }
                Err(source) if !is_transient(&source) => {
                    return Err(WriteError::Fatal {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                Err(source) if attempts >= max_attempts => {
                    return Err(WriteError::Exhausted {
                        path: path.to_path_buf(),
                        attempts,
                        source,
                    });
                }
                Err(source) => {
                    tracing::debug!(
                        "attempt {}/{} on {} failed: {}",
                        attempts,
                        max_attempts,
                        path.display(),
                        source
                    );
                    if !self.policy.delay.is_zero() {
                        std::thread::sleep(self.policy.delay);
                    }
                }
            }
        }
    }

    /// Fire-and-forget write: the final failure is logged, never returned.
    pub fn write_or_drop(&self, path: &Path, content: &str, mode: WriteMode) {
        if let Err(e) = self.write(path, content, mode) {
            tracing::warn!("dropping write: {}", e);
        }
    }
}

/// Creates `directory` and an empty `filename` inside it if missing.
///
/// Never truncates an existing file.
pub fn ensure_file(directory: &Path, filename: &str) -> Result<PathBuf> {
    fs::create_dir_all(directory).map_err(VaultError::Io)?;
    let path = directory.join(filename);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(VaultError::Io)?;
    Ok(path)
}
