//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed set of paths with Content-Length and Last-Modified
//! headers; answers 404 for everything else.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";

/// Starts a server in a background thread serving `files` (path -> body).
/// Returns the address ("127.0.0.1:port") to use as the probe target.
/// The server runs until the process exits.
pub fn start(files: HashMap<String, Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let files = Arc::new(files);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let files = Arc::clone(&files);
            thread::spawn(move || handle(stream, &files));
        }
    });
    format!("127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, files: &HashMap<String, Vec<u8>>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = match parse_path(request) {
        Some(p) => p,
        None => return,
    };
    match files.get(path) {
        Some(body) => {
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nLast-Modified: {}\r\nConnection: close\r\n\r\n",
                body.len(),
                LAST_MODIFIED
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(body);
        }
        None => {
            let _ = stream.write_all(
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        }
    }
}

/// Returns the request path from the first request line.
fn parse_path(request: &str) -> Option<&str> {
    let line = request.lines().next()?;
    line.split_whitespace().nth(1)
}
