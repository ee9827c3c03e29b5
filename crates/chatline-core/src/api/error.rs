use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::auth::StorageError;

/// Message used when a 401 carries no readable detail
const AUTH_REJECTED_MESSAGE: &str = "Authentication token expired or invalid";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No authentication token found")]
    Unauthenticated,

    #[error("{0}")]
    AuthRejected(String),

    #[error("HTTP error! status: {status}{}", message_suffix(.message))]
    HttpFailure { status: StatusCode, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkFailure(#[source] reqwest::Error),

    #[error("Invalid input: {0}")]
    ValidationFailure(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to save credential: {0}")]
    Storage(#[from] StorageError),
}

fn message_suffix(message: &str) -> String {
    if message.is_empty() {
        String::new()
    } else {
        format!(": {}", message)
    }
}

/// The failure classes callers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    AuthRejected,
    HttpFailure,
    NetworkFailure,
    ValidationFailure,
    StorageFailure,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Unauthenticated => ErrorKind::Unauthenticated,
            ApiError::AuthRejected(_) => ErrorKind::AuthRejected,
            ApiError::HttpFailure { .. } | ApiError::Timeout | ApiError::InvalidResponse(_) => {
                ErrorKind::HttpFailure
            }
            ApiError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            ApiError::ValidationFailure(_) => ErrorKind::ValidationFailure,
            ApiError::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// True for failures that invalidate the stored credential
    pub fn is_auth(&self) -> bool {
        matches!(self.kind(), ErrorKind::Unauthenticated | ErrorKind::AuthRejected)
    }

    /// HTTP status of the failed response, when there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::AuthRejected(_) => Some(StatusCode::UNAUTHORIZED),
            ApiError::HttpFailure { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull a readable message out of a DRF-style error body.
    ///
    /// Recognizes `{"detail": "..."}` first, then `non_field_errors`, then the
    /// first field error list.
    fn server_message(body: &str) -> Option<String> {
        let value: Value = serde_json::from_str(body).ok()?;
        let obj = value.as_object()?;

        if let Some(detail) = obj.get("detail").and_then(Value::as_str) {
            return Some(detail.to_string());
        }

        let first_of = |v: &Value| -> Option<String> {
            match v {
                Value::String(s) => Some(s.clone()),
                Value::Array(items) => items.iter().find_map(|i| i.as_str().map(str::to_string)),
                _ => None,
            }
        };

        if let Some(msg) = obj.get("non_field_errors").and_then(first_of) {
            return Some(msg);
        }

        obj.iter()
            .filter(|(k, _)| k.as_str() != "code")
            .find_map(|(field, v)| first_of(v).map(|m| format!("{}: {}", field, m)))
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        match status.as_u16() {
            401 => ApiError::AuthRejected(message.unwrap_or_else(|| AUTH_REJECTED_MESSAGE.to_string())),
            _ => ApiError::HttpFailure {
                status,
                message: message.unwrap_or_else(|| Self::truncate_body(body)),
            },
        }
    }

    /// Classify a transport-level failure from reqwest
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::from_status(status, "")
        } else {
            ApiError::NetworkFailure(err)
        }
    }
}
