//! HTTP probe against the target cache node.
//!
//! Uses the curl crate (libcurl) to issue one GET per file, with the vhost
//! hostname supplied as the `Host` header so a single physical target can
//! answer for multiple logical sites. The body is buffered so checksum
//! verification can run over it.
//!
//! Runs in the current thread; call from `spawn_blocking` when used from
//! async code.

mod classify;
mod parse;

pub use classify::classify;

use std::str;
use std::time::Duration;

/// Raw result of one probe request.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code (e.g. 200, 404).
    pub status_code: u32,
    /// Full response body.
    pub body: Vec<u8>,
    /// `Content-Length` header, if present.
    pub content_length: Option<u64>,
    /// `Last-Modified` header, if present.
    pub last_modified: Option<String>,
}

impl ProbeResponse {
    /// Observed byte length: `Content-Length` when the server sent one,
    /// otherwise the number of body bytes actually received.
    pub fn observed_size(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }
}

/// Transport-level probe failure (timeout, connection refused, DNS).
/// Never retried within a run; classified as a `RequestError` outcome.
#[derive(Debug)]
pub struct ProbeError(pub curl::Error);

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<curl::Error> for ProbeError {
    fn from(e: curl::Error) -> Self {
        ProbeError(e)
    }
}

/// Per-request timeouts; a probe must never block a worker indefinitely.
#[derive(Debug, Clone, Copy)]
pub struct ProbeTimeouts {
    pub connect: Duration,
    pub total: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        ProbeTimeouts {
            connect: Duration::from_secs(15),
            total: Duration::from_secs(60),
        }
    }
}

/// Issues one GET for `path` against `server` (host or host:port).
///
/// Redirects are not followed: a cache answering with a redirect is not
/// serving the file. Non-2xx statuses are returned as a normal
/// [`ProbeResponse`] for classification, not as an error.
pub fn fetch(
    server: &str,
    hostname: &str,
    path: &str,
    timeouts: ProbeTimeouts,
) -> Result<ProbeResponse, ProbeError> {
    let url = format!("http://{}{}", server, path);

    let mut body: Vec<u8> = Vec::new();
    let mut header_lines: Vec<String> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(&url)?;
    easy.connect_timeout(timeouts.connect)?;
    easy.timeout(timeouts.total)?;

    if !hostname.is_empty() {
        let mut list = curl::easy::List::new();
        list.append(&format!("Host: {}", hostname.trim()))?;
        easy.http_headers(list)?;
    }

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                header_lines.push(s.trim_end().to_string());
            }
            true
        })?;
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status_code = easy.response_code()?;
    let headers = parse::parse_headers(&header_lines);

    Ok(ProbeResponse {
        status_code,
        body,
        content_length: headers.content_length,
        last_modified: headers.last_modified,
    })
}
