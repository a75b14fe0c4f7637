//! `multipart/mixed` encoding of update responses.
//!
//! Each part carries a `Content-Disposition: form-data; name="..."` header
//! and an optional `content-type`. Lines end with CRLF.

use bytes::{BufMut, Bytes, BytesMut};
use uuid::Uuid;

/// Content type of JSON parts that declare their charset.
pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Content type of plain JSON parts.
pub const JSON: &str = "application/json";

const CRLF: &[u8] = b"\r\n";

/// Incrementally assembles a multipart body.
#[derive(Debug)]
pub struct MultipartBuilder {
    boundary: String,
    body: BytesMut,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    /// Start a body with a fresh random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("ota-{}", Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: BytesMut::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the response `content-type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed; boundary={}", self.boundary)
    }

    /// Append a named part.
    pub fn part(mut self, name: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        self.body.put_slice(b"--");
        self.body.put_slice(self.boundary.as_bytes());
        self.body.put_slice(CRLF);
        self.body
            .put_slice(format!("Content-Disposition: form-data; name=\"{name}\"").as_bytes());
        self.body.put_slice(CRLF);
        if let Some(content_type) = content_type {
            self.body
                .put_slice(format!("content-type: {content_type}").as_bytes());
            self.body.put_slice(CRLF);
        }
        self.body.put_slice(CRLF);
        self.body.put_slice(body);
        self.body.put_slice(CRLF);
        self
    }

    /// Close the body.
    pub fn finish(mut self) -> Bytes {
        self.body.put_slice(b"--");
        self.body.put_slice(self.boundary.as_bytes());
        self.body.put_slice(b"--");
        self.body.put_slice(CRLF);
        self.body.freeze()
    }
}

/// One decoded part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Extract the boundary parameter from a `multipart/*` content type.
pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    let (essence, params) = content_type.split_once(';')?;
    if !essence.trim().to_ascii_lowercase().starts_with("multipart/") {
        return None;
    }
    params.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("boundary") {
            Some(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

/// Decode a multipart body produced with `boundary`.
pub fn parse_multipart(body: &[u8], boundary: &str) -> crate::Result<Vec<Part>> {
    let delimiter = format!("--{boundary}");
    let next_delimiter = format!("\r\n--{boundary}");
    let malformed = |msg: &str| crate::Error::Multipart(msg.to_string());

    let mut pos = find(body, delimiter.as_bytes(), 0)
        .ok_or_else(|| malformed("opening boundary not found"))?
        + delimiter.len();

    let mut parts = Vec::new();
    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        if !rest.starts_with(CRLF) {
            return Err(malformed("boundary not followed by CRLF"));
        }
        pos += CRLF.len();

        let headers_end =
            find(body, b"\r\n\r\n", pos).ok_or_else(|| malformed("unterminated part headers"))?;
        let headers = std::str::from_utf8(&body[pos..headers_end])
            .map_err(|_| malformed("part headers are not UTF-8"))?;

        let mut name = None;
        let mut content_type = None;
        for line in headers.split("\r\n") {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if key.eq_ignore_ascii_case("content-disposition") {
                name = disposition_name(value);
            } else if key.eq_ignore_ascii_case("content-type") {
                content_type = Some(value.to_string());
            }
        }

        let body_start = headers_end + 4;
        let body_end = find(body, next_delimiter.as_bytes(), body_start)
            .ok_or_else(|| malformed("closing boundary not found"))?;

        parts.push(Part {
            name: name.ok_or_else(|| malformed("part without a name"))?,
            content_type,
            body: Bytes::copy_from_slice(&body[body_start..body_end]),
        });
        pos = body_end + next_delimiter.len();
    }
}

fn disposition_name(value: &str) -> Option<String> {
    value.split(';').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        (key.trim() == "name").then(|| value.trim().trim_matches('"').to_string())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|i| i + from)
}
