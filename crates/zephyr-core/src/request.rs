//! HTTP Request types

use smallvec::SmallVec;
use std::collections::HashMap;

/// HTTP Request as handed over by the transport
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, as sent
    pub method: String,
    /// Request path (without query string)
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// Request headers (stack-allocated for small header counts)
    pub headers: SmallVec<[(String, String); 16]>,
    /// Request body
    pub body: bytes::Bytes,
}

impl Request {
    /// Create a new request
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: None,
            headers: SmallVec::new(),
            body: bytes::Bytes::new(),
        }
    }

    /// Get a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get content-type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Parse query string into key-value pairs, last value wins
    pub fn query_params(&self) -> HashMap<String, String> {
        self.query
            .as_deref()
            .map(parse_urlencoded)
            .unwrap_or_default()
            .into_iter()
            .collect()
    }

    /// First value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<String> {
        first_value(self.query.as_deref()?, key)
    }

    /// Whether the body carries `application/x-www-form-urlencoded` data
    pub fn is_form(&self) -> bool {
        self.content_type()
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false)
    }

    /// Decoded form fields from the body, empty unless the body is a form
    pub fn form_values(&self) -> HashMap<String, String> {
        if !self.is_form() {
            return HashMap::new();
        }
        parse_urlencoded(&String::from_utf8_lossy(&self.body))
            .into_iter()
            .collect()
    }

    /// First value of a form field from the body
    pub fn form_value(&self, key: &str) -> Option<String> {
        if !self.is_form() {
            return None;
        }
        first_value(&String::from_utf8_lossy(&self.body), key)
    }
}

/// Builder for constructing requests
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    /// Create a new builder
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request: Request::new(method, path),
        }
    }

    /// Set query string
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.request.query = Some(query.into());
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((name.into(), value.into()));
        self
    }

    /// Set body
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Set a form body and its content type
    pub fn form(self, body: impl Into<bytes::Bytes>) -> Self {
        self.header("content-type", "application/x-www-form-urlencoded")
            .body(body)
    }

    /// Build the request
    pub fn build(self) -> Request {
        self.request
    }
}

fn first_value(encoded: &str, key: &str) -> Option<String> {
    parse_urlencoded(encoded)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

/// Split `a=1&b=2` into decoded pairs; a key without `=` gets an empty value
fn parse_urlencoded(s: &str) -> Vec<(String, String)> {
    s.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (urlencoding_decode(key), urlencoding_decode(value))
        })
        .collect()
}

/// Percent and `+` decoding, invalid UTF-8 is replaced
fn urlencoding_decode(s: &str) -> String {
    percent_decode(s, true)
}

/// Percent-decode a URL path; `+` stays a literal plus
pub fn decode_path(path: &str) -> String {
    percent_decode(path, false)
}

fn percent_decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let decoded = s
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                        continue;
                    }
                    None => out.push(b'%'),
                }
            }
            b'+' if plus_as_space => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
