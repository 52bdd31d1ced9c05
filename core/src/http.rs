//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `ContactsClient` builds
//! `HttpRequest` values and parses `HttpResponse` values without touching the
//! network; a `Transport` (or any host) performs the actual round-trip.
//!
//! Every request records its `RequestScope` so the dispatcher can tell a
//! rejected login apart from a rejected session.

use std::fmt;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family of endpoints a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// Credential exchange (register, login). A 401 here means bad input,
    /// not a stale session.
    Auth,
    /// Everything that requires an established session.
    Resource,
}

/// One part of a multipart form body.
#[derive(Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FormPart::Text { name, .. } | FormPart::File { name, .. } => name,
        }
    }
}

// Text parts can carry passwords.
impl fmt::Debug for FormPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormPart::Text { name, .. } => f
                .debug_struct("Text")
                .field("name", name)
                .finish_non_exhaustive(),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("content_type", content_type)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON document.
    Json(String),
    /// Multipart form; the transport chooses the boundary and sets the
    /// content-type header.
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// The JSON text, if this is a JSON body.
    pub fn as_json(&self) -> Option<&str> {
        match self {
            RequestBody::Json(text) => Some(text),
            RequestBody::Multipart(_) => None,
        }
    }

    /// The form parts, if this is a multipart body.
    pub fn as_multipart(&self) -> Option<&[FormPart]> {
        match self {
            RequestBody::Json(_) => None,
            RequestBody::Multipart(parts) => Some(parts),
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ContactsClient::build_*` methods. The dispatcher adds the
/// bearer credential before handing it to a transport.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub scope: RequestScope,
}

impl HttpRequest {
    /// First header value whose name matches case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            path: "http://localhost/contacts/".to_string(),
            headers: vec![("Authorization".to_string(), "Bearer abc".to_string())],
            body: None,
            scope: RequestScope::Resource,
        };
        assert_eq!(req.header("authorization"), Some("Bearer abc"));
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn form_part_debug_hides_text_values() {
        let part = FormPart::text("password", "hunter22");
        let rendered = format!("{part:?}");
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter22"));
    }
}
