use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Datelike, Local, NaiveDate};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::debug;

/// Name of the file every partition directory contains. External tooling
/// locates partitions by this convention, so it must not change.
pub const PARTITION_FILE_NAME: &str = "file_events.log";

/// Timestamp prefix of every log line, `<timestamp> - <message>`.
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Append/read primitive over the date-partitioned log files. Partitioning is
/// by the local calendar date of the event's own timestamp, so all entries of
/// one day land in exactly one file.
///
/// Appends are atomic at line granularity: open, exclusive-lock, write one
/// line, unlock. Two monitors writing concurrently may interleave lines in
/// either order but never corrupt one.
pub struct EventLog {
    base_dir: PathBuf,
}

impl EventLog {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// `<base>/logs/<year>/<MM>/<DD>/file_events.log`, months and days
    /// zero-padded to two digits.
    pub fn partition_path(&self, date: NaiveDate) -> PathBuf {
        self.base_dir
            .join("logs")
            .join(date.year().to_string())
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
            .join(PARTITION_FILE_NAME)
    }

    /// Appends one `<timestamp> - <message>` line to the partition `at` falls
    /// into. I/O failures surface to the caller; the monitors log and keep
    /// running on them.
    pub async fn append(&self, message: &str, at: DateTime<Local>) -> Result<()> {
        let path = self.partition_path(at.date_naive());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::options()
            .append(true)
            .create(true)
            .open(&path)
            .await?;
        file.lock_exclusive()?;
        let result = Self::append_line(&mut file, message, at).await;
        file.unlock_async().await?;
        result
    }

    async fn append_line(file: &mut File, message: &str, at: DateTime<Local>) -> Result<()> {
        let line = format!("{} - {message}\n", at.format(LINE_TIMESTAMP_FORMAT));
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// All lines of the given date's partition, most recent first. A date
    /// that was never written to gets an empty partition file created and an
    /// empty result, so reading can't fail just because nothing happened yet.
    pub async fn read_partition(&self, date: NaiveDate) -> Result<Vec<String>> {
        let path = self.partition_path(date);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        File::options()
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        read_lines_reversed(&path).await
    }

    /// Reads a `file_events.log` sitting in an arbitrary directory, e.g. a
    /// copied or exported partition. `None` when the directory holds no such
    /// file; that is a viewer-renderable outcome, not an error.
    pub async fn read_arbitrary_dir(&self, dir: &Path) -> Result<Option<Vec<String>>> {
        let path = dir.join(PARTITION_FILE_NAME);
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(read_lines_reversed(&path).await?))
    }
}

async fn read_lines_reversed(path: &Path) -> Result<Vec<String>> {
    debug!("Reading {path:?}");
    let file = File::open(path).await?;
    file.lock_shared()?;
    let buffer = BufReader::new(file);
    let mut lines = buffer.lines();
    let mut entries = vec![];
    while let Ok(Some(v)) = lines.next_line().await {
        entries.push(v);
    }

    lines.into_inner().into_inner().unlock_async().await?;

    entries.reverse();
    Ok(entries)
}
