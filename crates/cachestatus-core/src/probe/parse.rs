//! Parse HTTP response header lines collected during a probe.

/// Headers the classifier cares about.
#[derive(Debug, Default)]
pub(crate) struct ProbeHeaders {
    pub content_length: Option<u64>,
    pub last_modified: Option<String>,
}

/// Parse collected header lines. If a header repeats, the later value wins.
pub(crate) fn parse_headers(lines: &[String]) -> ProbeHeaders {
    let mut headers = ProbeHeaders::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    headers.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("last-modified") {
                headers.last_modified = Some(value.to_string());
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_length_and_last_modified() {
        let lines = [
            "HTTP/1.1 200 OK".to_string(),
            "Content-Length: 4096".to_string(),
            "Last-Modified: Wed, 21 Oct 2015 07:28:00 GMT".to_string(),
        ];
        let h = parse_headers(&lines);
        assert_eq!(h.content_length, Some(4096));
        assert_eq!(
            h.last_modified.as_deref(),
            Some("Wed, 21 Oct 2015 07:28:00 GMT")
        );
    }

    #[test]
    fn ignores_malformed_content_length() {
        let lines = ["Content-Length: banana".to_string()];
        let h = parse_headers(&lines);
        assert_eq!(h.content_length, None);
    }

    #[test]
    fn empty_headers_yield_defaults() {
        let h = parse_headers(&[]);
        assert!(h.content_length.is_none());
        assert!(h.last_modified.is_none());
    }
}
