//! Classify a probe result against the expected file entry.

use crate::checksum::HashKind;
use crate::model::{FileEntry, FileStatus, StatusMark};

use super::{ProbeError, ProbeResponse};

/// Produces the outcome record for one probed file.
///
/// `verify` selects the hash strategy when checksumming is enabled; the
/// digest is computed for every present file (so manifest-creation runs
/// record checksums) and compared only when the entry carries an expected
/// one. A size mismatch takes precedence over checksum verification: the
/// body is already known to be wrong.
pub fn classify(
    entry: &FileEntry,
    result: &Result<ProbeResponse, ProbeError>,
    verify: Option<HashKind>,
) -> FileStatus {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            tracing::debug!(path = %entry.path, error = %e, "probe transport failure");
            return FileStatus {
                path: entry.path.clone(),
                checksum: None,
                size: None,
                last_modified: None,
                status: StatusMark::RequestError,
            };
        }
    };

    let observed_size = resp.observed_size();
    let mut checksum = None;

    let status = match resp.status_code {
        404 | 410 => StatusMark::Missing,
        code if !(200..300).contains(&code) => {
            tracing::debug!(path = %entry.path, code, "unexpected probe status");
            StatusMark::RequestError
        }
        _ => {
            if entry.size.is_some_and(|expected| expected != observed_size) {
                StatusMark::SizeMismatch
            } else if let Some(kind) = verify {
                let digest = kind.digest(&resp.body);
                let mismatch = entry
                    .checksum_expected
                    .as_deref()
                    .is_some_and(|expected| expected != digest);
                checksum = Some(digest);
                if mismatch {
                    StatusMark::ChecksumMismatch
                } else {
                    StatusMark::Ok
                }
            } else {
                StatusMark::Ok
            }
        }
    };

    FileStatus {
        path: entry.path.clone(),
        checksum,
        size: Some(observed_size),
        last_modified: resp.last_modified.clone(),
        status,
    }
}
