//! Persisting container logs at the moment a failure is detected.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

use crate::runtime::{ContainerRuntime, RuntimeUnavailable};

const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, thiserror::Error)]
pub enum CaptureUnavailable {
    #[error("Unable to fetch logs: {0}")]
    Runtime(#[from] RuntimeUnavailable),
    #[error("Log capture did not finish within {0:?}")]
    Timeout(Duration),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Location of a persisted log capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogReference {
    pub path: PathBuf,
    pub captured_at: DateTime<Local>,
}

#[derive(Clone)]
pub struct LogCapture {
    runtime: Arc<dyn ContainerRuntime>,
    dir: PathBuf,
    max_lines: usize,
    timeout: Duration,
}

impl LogCapture {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        dir: impl Into<PathBuf>,
        max_lines: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            dir: dir.into(),
            max_lines,
            timeout,
        }
    }

    /// Fetches the log tail of `name` and writes it to a new file. The whole
    /// capture, disk writes included, is bounded by the capture timeout and
    /// never leaves a partial file behind.
    pub async fn capture(&self, name: &str) -> Result<LogReference, CaptureUnavailable> {
        let reference = tokio::time::timeout(self.timeout, self.fetch_and_write(name))
            .await
            .map_err(|_| CaptureUnavailable::Timeout(self.timeout))??;

        log::info!("Captured logs of {name} to {:?}", reference.path);
        Ok(reference)
    }

    async fn fetch_and_write(&self, name: &str) -> Result<LogReference, CaptureUnavailable> {
        let logs = self.runtime.tail_logs(name, self.max_lines).await?;

        let captured_at = Local::now();
        tokio::fs::create_dir_all(&self.dir).await?;
        let (path, mut file) = create_unique(&self.dir, name, &captured_at).await?;
        let partial = PartialFile::new(path);

        let header = format!(
            "Container: {name}\nCaptured at: {}\nLast {} lines (stdout and stderr)\n{}\n",
            captured_at.format("%Y-%m-%d %H:%M:%S %:z"),
            self.max_lines,
            "=".repeat(60),
        );
        file.write_all(header.as_bytes()).await?;
        file.write_all(logs.as_bytes()).await?;
        file.flush().await?;

        Ok(LogReference {
            path: partial.keep(),
            captured_at,
        })
    }
}

/// Removes a capture file on drop unless it was completed with
/// [`PartialFile::keep`]. Covers both write errors and a capture cancelled
/// by its timeout.
struct PartialFile {
    path: PathBuf,
    done: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, done: false }
    }

    fn keep(mut self) -> PathBuf {
        self.done = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Unable to remove partial capture {:?}: {e}", self.path);
        }
    }
}

/// Filesystem-safe version of a container name.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .collect()
}

fn file_name(name: &str, captured_at: &DateTime<Local>, attempt: u32) -> String {
    let stamp = captured_at.format(FILE_TIMESTAMP_FORMAT);
    match attempt {
        0 => format!("{}_{stamp}.log", sanitize(name)),
        n => format!("{}_{stamp}_{n}.log", sanitize(name)),
    }
}

/// Creates `{name}_{stamp}.log`, adding `_1`, `_2`, ... when a capture for the
/// same container already exists within the same second.
async fn create_unique(
    dir: &Path,
    name: &str,
    captured_at: &DateTime<Local>,
) -> std::io::Result<(PathBuf, tokio::fs::File)> {
    let mut attempt = 0;
    loop {
        let path = dir.join(file_name(name, captured_at, attempt));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}
