//! Expected-file list ingestion.
//!
//! The list source is a local path, a `file://` URL, or an `http(s)://` URL.
//! Locations ending in `.json` are JSON-lines manifests; everything else is
//! a plain list, one path per line with an optional
//! `"<checksum>  .<path>"` prefix (the `sha256sum` output format for
//! `./relative` paths — the separator consumes the dot).
//!
//! Ingestion failures are fatal to the run: they happen before any worker
//! starts. Blocking I/O throughout; call from `spawn_blocking` in async code.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::time::Duration;
use url::Url;

use crate::manifest::read_manifest;
use crate::model::{FileEntry, VHost};

/// Opens a file-list location for reading.
pub fn open_location(location: &str) -> Result<Box<dyn BufRead + Send>> {
    if location.starts_with('/') {
        let file = File::open(location).with_context(|| format!("open '{}'", location))?;
        return Ok(Box::new(BufReader::new(file)));
    }

    let parsed =
        Url::parse(location).with_context(|| format!("could not parse url '{}'", location))?;
    match parsed.scheme() {
        "file" => {
            let file = File::open(parsed.path())
                .with_context(|| format!("open '{}'", parsed.path()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        "http" | "https" => Ok(Box::new(Cursor::new(http_get(location)?))),
        other => bail!("unsupported file list scheme '{}'", other),
    }
}

/// Fetches a file list over HTTP; any non-200 response is a hard error.
fn http_get(url: &str) -> Result<Vec<u8>> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url).context("invalid URL")?;
    easy.follow_location(true)?;
    easy.connect_timeout(Duration::from_secs(15))?;
    easy.timeout(Duration::from_secs(120))?;
    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer
            .perform()
            .with_context(|| format!("could not get file list '{}'", url))?;
    }

    let code = easy.response_code().context("no response code")?;
    if code != 200 {
        bail!("could not get file list '{}': {}", url, code);
    }
    Ok(body)
}

/// Parses a plain file list: one path per line, optional checksum prefix,
/// blank paths skipped.
pub fn parse_file_list<R: Read>(reader: R) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("reading file list")?;
        let (checksum, path) = match line.split_once("  .") {
            Some((sum, rest)) => (Some(sum.to_string()), rest.to_string()),
            None => (None, line),
        };
        if path.is_empty() {
            continue;
        }
        files.push(FileEntry {
            path,
            checksum_expected: checksum,
            ..Default::default()
        });
    }
    Ok(files)
}

/// Resolves and parses `vhost.file_list_location` into `vhost.files`.
/// Must complete before the work queue is fed.
pub fn load_file_list(vhost: &mut VHost) -> Result<()> {
    let location = vhost.file_list_location.clone();
    let reader = open_location(&location)
        .with_context(|| format!("could not get url {}", location))?;

    vhost.files = if location.ends_with(".json") {
        read_manifest(reader).with_context(|| format!("error parsing manifest {}", location))?
    } else {
        parse_file_list(reader)?
    };

    Ok(())
}
