//! Entity model: expected files, per-probe outcomes, and the vhost under check.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// One expected artifact to verify against the target cache node.
///
/// Created during file-list ingestion and mutated exactly once, by the single
/// worker that dequeues it; `path` is non-empty by construction (ingestion
/// skips blank lines).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileEntry {
    /// Request path on the target, e.g. `/images/logo.png`.
    pub path: String,
    /// Expected content hash (lowercase hex). `None` means "do not verify".
    pub checksum_expected: Option<String>,
    /// Expected byte length, if known.
    pub size: Option<u64>,
    /// Expected modification time as sent by the origin (HTTP date string).
    pub last_modified: Option<String>,
    /// When the probe ran; set by the owning worker. Lifecycle bookkeeping on
    /// the entry itself — reporting flows solely through [`FileStatus`].
    pub last_checked: Option<SystemTime>,
    /// Whether the probe found the file present on the target; set by the
    /// owning worker, same lifecycle role as `last_checked`.
    pub cached: bool,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        FileEntry {
            path: path.into(),
            ..Default::default()
        }
    }
}

/// Outcome classification for one probed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMark {
    /// Present, and size/checksum matched where expected.
    Ok,
    /// Target answered 404/410: the file is not cached.
    Missing,
    /// Present but the observed length differs from the expected size.
    SizeMismatch,
    /// Present but the content hash differs from the expected checksum.
    ChecksumMismatch,
    /// Transport failure or unexpected HTTP status; presence unknown.
    RequestError,
}

impl StatusMark {
    /// Single-character mark for terse operator output.
    pub fn mark(self) -> char {
        match self {
            StatusMark::Ok => ' ',
            StatusMark::Missing => 'M',
            StatusMark::SizeMismatch => 'S',
            StatusMark::ChecksumMismatch => 'C',
            StatusMark::RequestError => 'E',
        }
    }

    pub fn is_ok(self) -> bool {
        self == StatusMark::Ok
    }

    /// True if the target served the file at all (even if size/content was wrong).
    pub fn is_present(self) -> bool {
        matches!(
            self,
            StatusMark::Ok | StatusMark::SizeMismatch | StatusMark::ChecksumMismatch
        )
    }
}

impl std::fmt::Display for StatusMark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatusMark::Ok => "ok",
            StatusMark::Missing => "missing",
            StatusMark::SizeMismatch => "size mismatch",
            StatusMark::ChecksumMismatch => "checksum mismatch",
            StatusMark::RequestError => "request error",
        };
        f.write_str(s)
    }
}

/// Immutable outcome record for one probed file.
///
/// Decoupled from [`FileEntry`] so it can be serialized and streamed
/// independently: the status board keeps one per path, and the manifest
/// writer persists the `Ok` ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    /// Observed content hash; omitted when checksumming was off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Observed byte length.
    #[serde(default)]
    pub size: Option<u64>,
    /// `Last-Modified` header from the probe response, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    pub status: StatusMark,
}

/// The unit of work for one run: where the expected-file list comes from,
/// which logical site to probe as, and the files themselves.
///
/// `files` is fully populated before any worker starts and is never mutated
/// concurrently with probing.
#[derive(Debug, Clone, Default)]
pub struct VHost {
    pub file_list_location: String,
    /// `Host:` header override for probes (the physical target can answer
    /// for multiple logical sites). Empty means "use the target address".
    pub hostname: String,
    pub files: Vec<FileEntry>,
}

impl VHost {
    pub fn new(file_list_location: impl Into<String>, hostname: impl Into<String>) -> Self {
        VHost {
            file_list_location: file_list_location.into(),
            hostname: hostname.into(),
            files: Vec::new(),
        }
    }
}
