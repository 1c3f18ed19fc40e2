//! Minimal blocking HTTP/1.1 over any Read + Write stream.
//!
//! Deliberately small surface:
//! - One request per connection (`Connection: close`)
//! - Bodies framed by Content-Length or chunked transfer encoding;
//!   neither header means an empty body
//! - Header section capped at 32 KiB; bodies are not size-limited

use serde::Serialize;
use std::fmt;
use std::io::{Read, Write};

/// Maximum header section size (32 KiB)
pub const MAX_HEADER_SIZE: usize = 32 * 1024;

/// Longest accepted chunk-size or trailer line
const MAX_CHUNK_LINE: usize = 4096;

/// Upper bound on buffer preallocation from a client-supplied length
const PREALLOC_LIMIT: usize = 64 * 1024;

/// Parsed HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Header value by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path without query string
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("/")
    }
}

/// HTTP response to write back
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// JSON body with the given status
    pub fn json(status: u16, value: &impl Serialize) -> Self {
        Self {
            status,
            headers: vec![(
                "Content-Type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body: serde_json::to_vec(value).unwrap_or_default(),
        }
    }

    /// `{"error": message}`
    pub fn json_error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// HTML body, 200
    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: vec![(
                "Content-Type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Why a request could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Header section over the cap
    TooLarge(&'static str),
    /// Anything else wrong with the bytes on the wire
    Malformed(String),
}

impl RequestError {
    /// Status code to answer with
    pub fn status(&self) -> u16 {
        match self {
            RequestError::TooLarge(_) => 413,
            RequestError::Malformed(_) => 400,
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::TooLarge(what) => write!(f, "{} too large", what),
            RequestError::Malformed(msg) => f.write_str(msg),
        }
    }
}

/// Reason phrase for the status codes this server emits
fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// Read bytes up to and including the blank line ending the header section.
///
/// `Ok(None)` means the peer closed before sending anything.
fn read_head(stream: &mut impl Read) -> Result<Option<Vec<u8>>, RequestError> {
    let mut head: Vec<u8> = Vec::with_capacity(1024);
    let mut byte = [0u8; 1];

    while !head.ends_with(b"\r\n\r\n") {
        match stream.read(&mut byte) {
            Ok(0) if head.is_empty() => return Ok(None),
            Ok(0) => {
                return Err(RequestError::Malformed(
                    "Connection closed mid-request".to_string(),
                ))
            }
            Ok(_) => {
                head.push(byte[0]);
                if head.len() > MAX_HEADER_SIZE {
                    return Err(RequestError::TooLarge("Headers"));
                }
            }
            Err(_) if head.is_empty() => return Ok(None),
            Err(e) => return Err(RequestError::Malformed(format!("Read error: {}", e))),
        }
    }

    Ok(Some(head))
}

/// Read and parse one request.
///
/// Returns `None` when the connection closed cleanly before a request arrived.
pub fn read_request(stream: &mut impl Read) -> Option<Result<HttpRequest, RequestError>> {
    let head = match read_head(stream) {
        Ok(Some(head)) => head,
        Ok(None) => return None,
        Err(err) => return Some(Err(err)),
    };
    Some(parse_request(stream, &head))
}

fn parse_request(stream: &mut impl Read, head: &[u8]) -> Result<HttpRequest, RequestError> {
    let mut header_slots = [httparse::EMPTY_HEADER; 64];
    let mut parsed = httparse::Request::new(&mut header_slots);

    match parsed.parse(head) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(RequestError::Malformed("Incomplete HTTP request".to_string()))
        }
        Err(e) => return Err(RequestError::Malformed(format!("HTTP parse error: {}", e))),
    }

    let method = parsed.method.unwrap_or_default().to_string();
    let path = parsed.path.unwrap_or("/").to_string();

    let headers: Vec<(String, String)> = parsed
        .headers
        .iter()
        .map(|h| {
            (
                h.name.to_string(),
                String::from_utf8_lossy(h.value).trim().to_string(),
            )
        })
        .collect();

    let mut request = HttpRequest {
        method,
        path,
        headers,
        body: Vec::new(),
    };

    let chunked = request
        .header("Transfer-Encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));

    if chunked {
        request.body = read_chunked_body(stream)?;
    } else if let Some(raw_len) = request.header("Content-Length") {
        let len: usize = raw_len
            .parse()
            .map_err(|_| RequestError::Malformed(format!("Invalid Content-Length: {}", raw_len)))?;
        request.body = read_exact_body(stream, len)?;
    }

    Ok(request)
}

/// Read exactly `len` body bytes.
fn read_exact_body(stream: &mut impl Read, len: usize) -> Result<Vec<u8>, RequestError> {
    let mut body = Vec::with_capacity(len.min(PREALLOC_LIMIT));
    stream
        .by_ref()
        .take(len as u64)
        .read_to_end(&mut body)
        .map_err(|e| RequestError::Malformed(format!("Read error: {}", e)))?;
    if body.len() < len {
        return Err(RequestError::Malformed(
            "Connection closed mid-body".to_string(),
        ));
    }
    Ok(body)
}

/// Read one CRLF-terminated line, CRLF included.
fn read_line(stream: &mut impl Read) -> Result<Vec<u8>, RequestError> {
    let mut line: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];

    while !line.ends_with(b"\r\n") {
        match stream.read(&mut byte) {
            Ok(0) => {
                return Err(RequestError::Malformed(
                    "Connection closed mid-body".to_string(),
                ))
            }
            Ok(_) => {
                line.push(byte[0]);
                if line.len() > MAX_CHUNK_LINE {
                    return Err(RequestError::Malformed("Chunk line too long".to_string()));
                }
            }
            Err(e) => return Err(RequestError::Malformed(format!("Read error: {}", e))),
        }
    }

    Ok(line)
}

/// Decode a chunked body, discarding any trailer fields.
fn read_chunked_body(stream: &mut impl Read) -> Result<Vec<u8>, RequestError> {
    let mut body = Vec::new();

    loop {
        let size_line = read_line(stream)?;
        let size = match httparse::parse_chunk_size(&size_line) {
            Ok(httparse::Status::Complete((_, size))) => size,
            _ => return Err(RequestError::Malformed("Invalid chunk size".to_string())),
        };
        let size = usize::try_from(size)
            .map_err(|_| RequestError::Malformed("Invalid chunk size".to_string()))?;

        if size == 0 {
            // Trailer section ends with an empty line
            while read_line(stream)? != b"\r\n" {}
            return Ok(body);
        }

        body.extend(read_exact_body(stream, size)?);
        if read_line(stream)? != b"\r\n" {
            return Err(RequestError::Malformed(
                "Missing CRLF after chunk".to_string(),
            ));
        }
    }
}

/// Write a response. Errors are ignored; the client may already be gone.
pub fn write_response(stream: &mut impl Write, response: &HttpResponse) {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(name);
        head.push_str(": ");
        head.push_str(value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    if !response.body.is_empty() {
        let _ = stream.write_all(&response.body);
    }
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(raw: impl Into<Vec<u8>>) -> Option<Result<HttpRequest, RequestError>> {
        read_request(&mut Cursor::new(raw.into()))
    }

    #[test]
    fn test_parse_get_request() {
        let req = parse("GET /?lang=pt HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(req.method, "GET");
        assert_eq!(req.route(), "/");
        assert_eq!(req.header("host"), Some("localhost"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_parse_post_with_body() {
        let body = r#"{"question":"O que é recursão?"}"#;
        let raw = format!(
            "POST /api/ask HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let req = parse(raw).unwrap().unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(req.route(), "/api/ask");
        assert_eq!(String::from_utf8(req.body).unwrap(), body);
    }

    #[test]
    fn test_parse_chunked_body() {
        let raw = "POST /api/ask HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n\
                   7\r\n{\"quest\r\n\
                   a;ext=1\r\nion\":\"oi\"}\r\n\
                   0\r\nX-Trailer: yes\r\n\r\n";
        let req = parse(raw).unwrap().unwrap();
        assert_eq!(String::from_utf8(req.body).unwrap(), r#"{"question":"oi"}"#);
    }

    #[test]
    fn test_chunked_with_bad_size() {
        let err = parse("POST /api/ask HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n")
            .unwrap()
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_post_without_length_has_empty_body() {
        let req = parse("POST /api/ask HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .unwrap()
            .unwrap();
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_body_over_one_mebibyte_is_read() {
        let body = format!(r#"{{"question":"{}"}}"#, "a".repeat(1_100_000));
        let raw = format!(
            "POST /api/ask HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let req = parse(raw).unwrap().unwrap();
        assert_eq!(req.body.len(), body.len());
    }

    #[test]
    fn test_invalid_content_length() {
        let err = parse("POST /api/ask HTTP/1.1\r\nContent-Length: lots\r\n\r\n")
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("Content-Length"));
    }

    #[test]
    fn test_truncated_body() {
        let err = parse("POST /api/ask HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}")
            .unwrap()
            .unwrap_err();
        assert!(err.to_string().contains("mid-body"));
    }

    #[test]
    fn test_headers_too_large() {
        let raw = format!(
            "GET / HTTP/1.1\r\nX-Big: {}\r\n\r\n",
            "A".repeat(MAX_HEADER_SIZE)
        );
        let err = parse(raw).unwrap().unwrap_err();
        assert_eq!(err.status(), 413);
    }

    #[test]
    fn test_empty_stream_returns_none() {
        assert!(parse(Vec::<u8>::new()).is_none());
    }

    #[test]
    fn test_write_response() {
        let resp = HttpResponse::json_error(400, "Pergunta vazia");
        let mut buf = Vec::new();
        write_response(&mut buf, &resp);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(output.contains("Connection: close\r\n"));
        assert!(output.contains("Content-Type: application/json; charset=utf-8\r\n"));
        assert!(output.ends_with(r#"{"error":"Pergunta vazia"}"#));
    }
}
