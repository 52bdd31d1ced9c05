//! Error types for the contacts API client.
//!
//! # Design
//! `ApiError` is the classification handed back to callers. The dispatcher
//! decides the variant; facades pass it through untouched and the UI layer
//! turns it into a message or a recovery action (e.g. prompting a new
//! login on `Auth`).

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Errors returned by facades, the dispatcher and `ContactsClient::parse_*`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input was rejected locally; no request was sent.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// 4xx other than 404 and session rejection. Carries the server's
    /// validation messages when it sent any.
    #[error("request rejected (HTTP {status}): {detail}")]
    Client { status: u16, detail: ErrorDetail },

    /// 401/403 from an endpoint that requires a session. The stored token is
    /// missing, expired or revoked.
    #[error("session rejected (HTTP {status}): {detail}")]
    Auth { status: u16, detail: ErrorDetail },

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned a 5xx status.
    #[error("server error (HTTP {status}): {detail}")]
    Server { status: u16, detail: ErrorDetail },

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// A status outside the classified ranges (1xx, 3xx).
    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// True when the caller should discard the session and log in again.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::Auth { .. })
    }

    /// Server-provided detail, if the error came from a response.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            ApiError::Client { detail, .. }
            | ApiError::Auth { detail, .. }
            | ApiError::Server { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// HTTP status, if the error came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Client { status, .. }
            | ApiError::Auth { status, .. }
            | ApiError::Server { status, .. }
            | ApiError::UnexpectedStatus { status, .. } => Some(*status),
            ApiError::NotFound => Some(404),
            _ => None,
        }
    }
}

/// Local shape validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Error payload sent by the backend, normalized.
///
/// The backend answers failures with `{"error": "..."}` or, for schema
/// validation, `{"error": {"field": ["message", ...]}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDetail {
    Message(String),
    Fields(BTreeMap<String, Vec<String>>),
    Raw(String),
}

impl ErrorDetail {
    /// Parse a response body. Never fails; unrecognized bodies become `Raw`.
    pub fn from_body(body: &str) -> Self {
        let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
            return ErrorDetail::Raw(body.trim().to_string());
        };
        match map.get("error").or_else(|| map.get("message")) {
            Some(Value::String(message)) => ErrorDetail::Message(message.clone()),
            Some(Value::Object(fields)) => ErrorDetail::Fields(
                fields
                    .iter()
                    .map(|(field, messages)| (field.clone(), flatten_messages(messages)))
                    .collect(),
            ),
            _ => ErrorDetail::Raw(body.trim().to_string()),
        }
    }

    /// True when the server reported field-level validation messages.
    pub fn is_validation(&self) -> bool {
        matches!(self, ErrorDetail::Fields(_))
    }

    /// All messages, flattened in field order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ErrorDetail::Message(message) => vec![message.clone()],
            ErrorDetail::Fields(fields) => fields
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |message| format!("{field}: {message}"))
                })
                .collect(),
            ErrorDetail::Raw(body) if body.is_empty() => Vec::new(),
            ErrorDetail::Raw(body) => vec![body.clone()],
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages = self.messages();
        if messages.is_empty() {
            f.write_str("no details")
        } else {
            f.write_str(&messages.join(", "))
        }
    }
}

fn flatten_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(message) => vec![message.clone()],
        Value::Array(items) => items.iter().flat_map(flatten_messages).collect(),
        Value::Object(nested) => nested.values().flat_map(flatten_messages).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
