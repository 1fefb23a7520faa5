//! Per-session message log.
//!
//! Each session writes to one file under `messages/`, named by the session
//! start time at minute resolution. Records are JSON Lines: one
//! `{time, content, from}` object per line, appended and never rewritten.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

/// Default directory for session log files.
pub const MESSAGES_DIR: &str = "messages";

const SESSION_FILE_FORMAT: &str = "%Y-%m-%d_%H:%M";
const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Serialize)]
struct StoredRecord<'a> {
    time: String,
    content: &'a str,
    from: &'a str,
}

/// Append-only store for one chat session.
pub struct MessageStore {
    path: PathBuf,
}

impl MessageStore {
    /// Create a store whose file is named by the session start time.
    /// Nothing is written until the first [`append`](Self::append).
    pub fn new(dir: impl AsRef<Path>, session_start: DateTime<Local>) -> Self {
        let file_name = format!("{}.json", session_start.format(SESSION_FILE_FORMAT));
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record attributed to `user`. Creates the directory on
    /// first use; the directory check is idempotent.
    pub fn append(&self, user: &str, content: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let record = StoredRecord {
            time: Local::now().format(RECORD_TIME_FORMAT).to_string(),
            content,
            from: user,
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}
