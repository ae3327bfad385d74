//! Manifest pipeline: asynchronous writer for verified-file records and the
//! reader that turns a manifest back into an expected-file set.
//!
//! A manifest is newline-delimited JSON, one entry per line, written in
//! probe-completion order. Writing is decoupled from the probe hot path by a
//! bounded queue: workers `try_send` records and a single drain task owns the
//! sink. A full queue drops the record with a warning, so manifest
//! completeness is best-effort under sustained overload; the buffer absorbs
//! bursts.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use tokio::sync::mpsc;

use crate::model::{FileEntry, FileStatus};

/// Queue capacity between probe workers and the drain task.
pub const QUEUE_CAPACITY: usize = 200;

/// One manifest record. Field names stay PascalCase on the wire so manifests
/// from earlier deployments of this tool keep parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestEntry {
    pub path: String,
    /// Byte length; 0 means unknown.
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl From<&FileStatus> for ManifestEntry {
    fn from(fs: &FileStatus) -> Self {
        ManifestEntry {
            path: fs.path.clone(),
            size: fs.size.unwrap_or(0),
            checksum: fs.checksum.clone(),
            last_modified: fs.last_modified.clone(),
        }
    }
}

impl ManifestEntry {
    fn into_file_entry(self) -> FileEntry {
        FileEntry {
            path: self.path,
            checksum_expected: self.checksum,
            size: (self.size != 0).then_some(self.size),
            last_modified: self.last_modified,
            ..Default::default()
        }
    }
}

/// Error from [`read_manifest`]: ingestion is all-or-nothing, so a malformed
/// line aborts with its number and content.
#[derive(Debug, thiserror::Error)]
pub enum ManifestReadError {
    #[error("line {line}: {source}: '{content}'")]
    Parse {
        line: usize,
        content: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("reading manifest")]
    Io(#[from] std::io::Error),
}

/// Parses one JSON entry per line, in order. Partial results are discarded
/// on the first malformed line.
pub fn read_manifest<R: BufRead>(reader: R) -> Result<Vec<FileEntry>, ManifestReadError> {
    let mut files = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let entry: ManifestEntry =
            serde_json::from_str(&line).map_err(|source| ManifestReadError::Parse {
                line: idx + 1,
                content: line.clone(),
                source,
            })?;
        files.push(entry.into_file_entry());
    }
    Ok(files)
}

/// Asynchronous manifest writer: a bounded queue plus one background drain
/// task that serializes each record to the sink.
pub struct Manifest {
    tx: mpsc::Sender<FileStatus>,
    task: tokio::task::JoinHandle<()>,
}

impl Manifest {
    /// Opens the record queue and starts the drain task over `writer`.
    pub fn create<W: Write + Send + 'static>(writer: W) -> Manifest {
        Manifest::with_capacity(writer, QUEUE_CAPACITY)
    }

    pub fn with_capacity<W: Write + Send + 'static>(writer: W, capacity: usize) -> Manifest {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(drain(rx, writer));
        Manifest { tx, task }
    }

    /// The sender side workers attach to (`WorkerPool::set_output`).
    pub fn sender(&self) -> mpsc::Sender<FileStatus> {
        self.tx.clone()
    }

    /// Stops the drain task and flushes the sink. Returns once the task has
    /// actually terminated: dropping the last sender ends its receive loop,
    /// so records already queued are still written.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::error!("manifest writer task failed: {}", e);
        }
    }
}

async fn drain<W: Write>(mut rx: mpsc::Receiver<FileStatus>, mut writer: W) {
    while let Some(fs) = rx.recv().await {
        let entry = ManifestEntry::from(&fs);
        match serde_json::to_vec(&entry) {
            Ok(mut line) => {
                line.push(b'\n');
                if let Err(e) = writer.write_all(&line) {
                    tracing::warn!(path = %fs.path, "manifest write failed: {}", e);
                }
            }
            Err(e) => tracing::warn!(path = %fs.path, "manifest serialize failed: {}", e),
        }
    }
    if let Err(e) = writer.flush() {
        tracing::warn!("manifest flush failed: {}", e);
    }
}
