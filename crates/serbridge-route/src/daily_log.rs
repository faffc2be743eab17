use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only line log with one file per calendar day:
/// `<dir>/<YYYY-MM-DD>.txt`.
///
/// No handle is kept between writes; every append opens, writes and closes
/// the day's file, creating the directory if needed.
#[derive(Debug, Clone)]
pub struct DailyLog {
    dir: PathBuf,
}

impl DailyLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding lines written on `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.txt", date.format("%Y-%m-%d")))
    }

    /// Append `line` to the file for `date`.
    pub async fn append_on(&self, date: NaiveDate, line: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(date);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(path)
    }
}
