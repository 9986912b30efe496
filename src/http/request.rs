//! Absolute-URI request parsing.
//!
//! # Responsibilities
//! - Parse one `GET protocol://host[:port]/path HTTP/1.x` request from a
//!   byte buffer into a structured record
//! - Keep the ordered header list, last writer winning per key
//! - Reconstruct the wire form for forwarding (`unparse`)
//!
//! # Design Decisions
//! - One opaque error kind: callers either have a request or they don't
//! - Header keys are stored case-sensitively, no normalization
//! - A request never escapes half-built; any malformed input fails whole

use thiserror::Error;

/// Shortest byte sequence accepted as a request.
pub const MIN_REQUEST_LEN: usize = 4;

/// Longest byte sequence accepted as a request.
pub const MAX_REQUEST_LEN: usize = 65535;

const DEFAULT_HEADER_CAPACITY: usize = 8;

/// Error returned for any malformed request.
///
/// The parser does not distinguish failure sub-categories to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed request")]
pub struct ParseError;

/// A single `key: value` pair. Keys are stored case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub key: String,
    pub value: String,
}

/// A parsed absolute-URI `GET` request.
///
/// Holds the raw buffer it was parsed from alongside the structured
/// fields; everything is released in one step on drop.
#[derive(Debug, Clone)]
pub struct Request {
    raw: Vec<u8>,
    method: String,
    protocol: String,
    host: String,
    port: Option<u16>,
    path: String,
    version: String,
    headers: Vec<Header>,
}

impl Request {
    /// Parse one request from `buf`. Input length must lie in
    /// [`MIN_REQUEST_LEN`, `MAX_REQUEST_LEN`].
    pub fn parse(buf: &[u8]) -> Result<Request, ParseError> {
        if buf.len() < MIN_REQUEST_LEN || buf.len() > MAX_REQUEST_LEN {
            return Err(ParseError);
        }
        let text = std::str::from_utf8(buf).map_err(|_| ParseError)?;

        let head_end = text.find("\r\n\r\n").ok_or(ParseError)?;
        let line_end = text.find("\r\n").ok_or(ParseError)?;
        let request_line = &text[..line_end];

        let mut tokens = request_line.split(' ');
        let method = tokens.next().ok_or(ParseError)?;
        let uri = tokens.next().ok_or(ParseError)?;
        let version = tokens.next().ok_or(ParseError)?;
        if tokens.next().is_some() {
            return Err(ParseError);
        }

        if method != "GET" {
            return Err(ParseError);
        }
        if !version.starts_with("HTTP/") {
            return Err(ParseError);
        }

        let (protocol, rest) = uri.split_once("://").ok_or(ParseError)?;
        let (authority, path_tail) = match rest.find('/') {
            Some(slash) => (&rest[..slash], Some(&rest[slash + 1..])),
            None => (rest, None),
        };
        let (host, port_text) = match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        };
        if host.is_empty() {
            return Err(ParseError);
        }
        let port = port_text.map(parse_port).transpose()?;
        let path = match path_tail {
            Some(tail) => format!("/{tail}"),
            None => "/".to_string(),
        };

        let mut headers = Vec::with_capacity(DEFAULT_HEADER_CAPACITY);
        // the request line may end exactly at the terminator (no headers)
        let header_block = if line_end == head_end {
            ""
        } else {
            &text[line_end + 2..head_end]
        };
        if !header_block.is_empty() {
            for line in header_block.split("\r\n") {
                let (key, value) = line.split_once(':').ok_or(ParseError)?;
                if key.is_empty() {
                    return Err(ParseError);
                }
                let value = value.trim_start_matches([' ', '\t']);
                set_header(&mut headers, key, value);
            }
        }

        Ok(Request {
            raw: buf.to_vec(),
            method: method.to_string(),
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            path,
            version: version.to_string(),
            headers,
        })
    }

    /// Reconstruct the wire form: request line, each header in order, and
    /// the terminating blank line.
    pub fn unparse(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len());
        out.extend_from_slice(self.method.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.protocol.as_bytes());
        out.extend_from_slice(b"://");
        out.extend_from_slice(self.host.as_bytes());
        if let Some(port) = self.port {
            out.push(b':');
            out.extend_from_slice(port.to_string().as_bytes());
        }
        out.extend_from_slice(self.path.as_bytes());
        out.push(b' ');
        out.extend_from_slice(self.version.as_bytes());
        out.extend_from_slice(b"\r\n");
        for header in &self.headers {
            out.extend_from_slice(header.key.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(header.value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out
    }

    /// The raw bytes this request was parsed from.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Request path, always `/`-prefixed.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Headers in wire order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Value of the header with exactly this key, if present.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.key == key)
            .map(|h| h.value.as_str())
    }
}

/// Append `(key, value)`, dropping any prior occurrence of the key so a
/// single copy is retained.
fn set_header(headers: &mut Vec<Header>, key: &str, value: &str) {
    headers.retain(|h| h.key != key);
    headers.push(Header {
        key: key.to_string(),
        value: value.to_string(),
    });
}

fn parse_port(text: &str) -> Result<u16, ParseError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError);
    }
    let port: u32 = text.parse().map_err(|_| ParseError)?;
    if port == 0 || port > 65535 {
        return Err(ParseError);
    }
    Ok(port as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_stable() {
        let raw = b"GET http://example.com:8080/a/b HTTP/1.1\r\nHost: example.com\r\nAccept:  */*\r\n\r\n";
        let first = Request::parse(raw).unwrap();
        let second = Request::parse(&first.unparse()).unwrap();
        assert_eq!(second.method(), first.method());
        assert_eq!(second.host(), first.host());
        assert_eq!(second.port(), first.port());
        assert_eq!(second.path(), first.path());
        assert_eq!(second.version(), first.version());
        assert_eq!(second.headers(), first.headers());
    }

    #[test]
    fn test_header_last_writer_wins() {
        let raw = b"GET http://h/ HTTP/1.0\r\nX-A: one\r\nX-B: keep\r\nX-A: two\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("X-A"), Some("two"));
        assert_eq!(request.headers().len(), 2);
        // the surviving copy moves to the tail
        assert_eq!(request.headers()[0].key, "X-B");
        assert_eq!(request.headers()[1].key, "X-A");
    }

    #[test]
    fn test_header_lookup_is_case_sensitive() {
        let raw = b"GET http://h/ HTTP/1.0\r\nhost: h\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("Host"), None);
        assert_eq!(request.header("host"), Some("h"));
    }

    #[test]
    fn test_value_whitespace_stripping() {
        let raw = b"GET http://h/ HTTP/1.0\r\nX-A: \t value with space\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("X-A"), Some("value with space"));
    }

    #[test]
    fn test_colon_inside_value_is_kept() {
        let raw = b"GET http://h/ HTTP/1.0\r\nReferer: http://other/\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("Referer"), Some("http://other/"));
    }

    #[test]
    fn test_path_with_colon_does_not_become_port() {
        let raw = b"GET http://h/a:b HTTP/1.0\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.port(), None);
        assert_eq!(request.path(), "/a:b");
    }

    #[test]
    fn test_length_window() {
        assert!(Request::parse(b"GET").is_err());
        let mut oversized = b"GET http://h/".to_vec();
        oversized.resize(MAX_REQUEST_LEN + 1, b'a');
        assert!(Request::parse(&oversized).is_err());
    }
}
