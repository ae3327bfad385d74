//! Integration tests: full check runs against a local HTTP server.
//!
//! Starts a minimal static server, runs the probe engine with a small worker
//! pool, and asserts the final report classifies each file correctly.

mod common;

use std::collections::HashMap;

use cachestatus_core::check::{run_check, CheckConfig};
use cachestatus_core::checksum::HashKind;
use cachestatus_core::filelist;
use cachestatus_core::model::{FileEntry, StatusMark, VHost};
use tempfile::tempdir;

fn vhost_with(files: Vec<FileEntry>) -> VHost {
    let mut vhost = VHost::new("test", "static.example.com");
    vhost.files = files;
    vhost
}

#[tokio::test(flavor = "multi_thread")]
async fn mixed_outcomes_are_classified_and_collected() {
    let mut served = HashMap::new();
    served.insert("/present".to_string(), b"present body\n".to_vec());
    served.insert("/corrupt".to_string(), b"unexpected body\n".to_vec());
    let server = common::cache_server::start(served);

    let mut present = FileEntry::new("/present");
    present.size = Some(13);
    present.checksum_expected = Some(HashKind::Sha256.digest(b"present body\n"));
    let absent = FileEntry::new("/absent");
    let mut corrupt = FileEntry::new("/corrupt");
    corrupt.checksum_expected = Some(HashKind::Sha256.digest(b"expected body\n"));

    let mut cfg = CheckConfig::new(&server, 2);
    cfg.options.checksum = true;

    let board = run_check(vhost_with(vec![present, absent, corrupt]), &cfg)
        .await
        .unwrap();
    let report = board.snapshot();

    assert_eq!(report.total, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.status["/present"].status, StatusMark::Ok);
    assert_eq!(report.status["/absent"].status, StatusMark::Missing);
    assert_eq!(report.status["/corrupt"].status, StatusMark::ChecksumMismatch);
    assert_eq!(report.bad_files.len(), 2);
    assert!(report.bad_files.contains(&"/absent".to_string()));
    assert!(report.bad_files.contains(&"/corrupt".to_string()));
    assert!(!board.is_clean());
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_file_list_succeeds_trivially() {
    let server = common::cache_server::start(HashMap::new());
    let cfg = CheckConfig::new(&server, 4);
    let board = run_check(vhost_with(Vec::new()), &cfg).await.unwrap();
    assert_eq!(board.processed(), 0);
    assert!(board.is_clean());
    assert!(board.snapshot().bad_files.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn expected_size_mismatch_is_flagged() {
    let mut served = HashMap::new();
    served.insert("/trunc".to_string(), b"1234".to_vec());
    let server = common::cache_server::start(served);

    let mut entry = FileEntry::new("/trunc");
    entry.size = Some(10);

    let cfg = CheckConfig::new(&server, 1);
    let board = run_check(vhost_with(vec![entry]), &cfg).await.unwrap();
    let report = board.snapshot();
    assert_eq!(report.status["/trunc"].status, StatusMark::SizeMismatch);
    assert_eq!(report.bad_files, vec!["/trunc".to_string()]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_target_yields_request_errors_not_abort() {
    // Bind then drop a listener so the port is known to refuse connections.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let server = format!("127.0.0.1:{}", port);

    let cfg = CheckConfig::new(&server, 2);
    let board = run_check(
        vhost_with(vec![FileEntry::new("/a"), FileEntry::new("/b")]),
        &cfg,
    )
    .await
    .unwrap();
    let report = board.snapshot();
    assert_eq!(report.processed, 2);
    assert_eq!(report.status["/a"].status, StatusMark::RequestError);
    assert_eq!(report.status["/b"].status, StatusMark::RequestError);
}

#[tokio::test(flavor = "multi_thread")]
async fn manifest_creation_then_reuse_as_file_list() {
    let mut served = HashMap::new();
    served.insert("/a".to_string(), b"alpha\n".to_vec());
    served.insert("/b".to_string(), b"beta\n".to_vec());
    let server = common::cache_server::start(served);

    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("site.json");

    let mut cfg = CheckConfig::new(&server, 2);
    cfg.options.checksum = true;
    cfg.manifest_path = Some(manifest_path.clone());

    let board = run_check(
        vhost_with(vec![FileEntry::new("/a"), FileEntry::new("/b")]),
        &cfg,
    )
    .await
    .unwrap();
    assert!(board.is_clean());

    // The written manifest is a valid expected-file source for a later run.
    let mut vhost = VHost::new(manifest_path.to_str().unwrap(), "");
    filelist::load_file_list(&mut vhost).unwrap();
    assert_eq!(vhost.files.len(), 2);
    let a = vhost.files.iter().find(|f| f.path == "/a").unwrap();
    assert_eq!(a.size, Some(6));
    assert_eq!(
        a.checksum_expected.as_deref(),
        Some(HashKind::Sha256.digest(b"alpha\n").as_str())
    );
    assert_eq!(
        a.last_modified.as_deref(),
        Some(common::cache_server::LAST_MODIFIED)
    );

    // And it verifies clean against the same server.
    let mut cfg2 = CheckConfig::new(&server, 2);
    cfg2.options.checksum = true;
    let board2 = run_check(vhost, &cfg2).await.unwrap();
    assert!(board2.is_clean());
    assert_eq!(board2.processed(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn crc32_checksum_run_verifies_clean() {
    let mut served = HashMap::new();
    served.insert("/a".to_string(), b"123456789".to_vec());
    let server = common::cache_server::start(served);

    let mut entry = FileEntry::new("/a");
    entry.checksum_expected = Some("cbf43926".to_string());

    let mut cfg = CheckConfig::new(&server, 1);
    cfg.options.checksum = true;
    cfg.options.hash = HashKind::Crc32;

    let board = run_check(vhost_with(vec![entry]), &cfg).await.unwrap();
    assert!(board.is_clean());
    let report = board.snapshot();
    assert_eq!(report.status["/a"].checksum.as_deref(), Some("cbf43926"));
}
