//! Error types for the Sendamatic client.

use crate::message::ValidationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing or sending a message.
///
/// Each variant names the phase that failed and keeps the underlying cause
/// reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum Error {
    /// The message failed local checks; nothing was sent.
    #[error("message validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The message could not be encoded as JSON.
    #[error("failed to marshal message: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The request could not be completed (connection, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response body could not be read.
    #[error("failed to read response: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// The service rejected the request with status 400 or above.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A success response body did not have the expected shape.
    #[error("failed to unmarshal response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The caller's cancellation signal fired before the call completed.
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline passed before the call completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// An attachment file could not be read.
    #[error("failed to read attachment {}: {source}", .path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),

    /// The credentials cannot be carried in an HTTP header.
    #[error("api key contains characters not allowed in a header value")]
    InvalidApiKey,
}

impl Error {
    /// Whether the call ran out of time, either on the caller's deadline or
    /// on the transport's request timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::DeadlineExceeded => true,
            Error::Request(err) | Error::ReadBody(err) => err.is_timeout(),
            _ => false,
        }
    }

    /// Whether the caller cancelled the call.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// The structured service rejection, if that is what this error is.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// A rejection returned by the Sendamatic API.
///
/// Built from the response body by [`ApiError::from_response`]. `sender` and
/// `smtp_code` are carried as data but are not part of the `Display` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// HTTP status of the response. Taken from the status line, never the body.
    #[serde(skip)]
    pub status_code: u16,
    /// Human readable message, or the raw body when it was not JSON.
    #[serde(rename = "error", default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Field-level validation failures reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<String>,
    /// JSON path of the offending request field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Sender address the service objected to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// SMTP reply code from the upstream relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_code: Option<i64>,
}

/// Read a string field, treating `null` as empty.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ApiError {
    /// Decode an error response body. Never fails.
    ///
    /// A body that is not a JSON object of the expected shape becomes the
    /// message verbatim; an empty body yields an empty message. The message
    /// is a `String`, so bytes that are not valid UTF-8 are replaced with
    /// U+FFFD; UTF-8 bodies are kept byte for byte.
    pub fn from_response(status_code: u16, body: &[u8]) -> Self {
        // Serde would also accept a positional array for the struct; only objects count.
        let mut err = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .filter(serde_json::Value::is_object)
            .and_then(|value| serde_json::from_value::<ApiError>(value).ok())
            .unwrap_or_else(|| ApiError {
                message: String::from_utf8_lossy(body).into_owned(),
                ..ApiError::default()
            });
        err.status_code = status_code;
        err
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.validation_errors.as_deref() {
            Some(validation) if !validation.is_empty() => write!(
                f,
                "sendamatic api error (status {}): {} (path: {})",
                self.status_code,
                validation,
                self.json_path.as_deref().unwrap_or_default()
            ),
            _ => write!(
                f,
                "sendamatic api error (status {}): {}",
                self.status_code, self.message
            ),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_plain_message() {
        let err = ApiError {
            status_code: 400,
            message: "Invalid request".into(),
            ..ApiError::default()
        };
        assert_eq!(err.to_string(), "sendamatic api error (status 400): Invalid request");
    }

    #[test]
    fn display_prefers_validation_errors() {
        let err = ApiError::from_response(
            422,
            br#"{"error":"Validation failed","validation_errors":"sender is required","json_path":"$.sender"}"#,
        );
        assert_eq!(
            err.to_string(),
            "sendamatic api error (status 422): sender is required (path: $.sender)"
        );
        assert_eq!(err.message, "Validation failed");
    }

    #[test]
    fn display_hides_smtp_details() {
        let err = ApiError::from_response(
            500,
            br#"{"error": "SMTP error", "smtp_code": 550, "sender": "test@example.com"}"#,
        );
        assert_eq!(err.to_string(), "sendamatic api error (status 500): SMTP error");
        assert_eq!(err.smtp_code, Some(550));
        assert_eq!(err.sender.as_deref(), Some("test@example.com"));
    }

    #[test]
    fn empty_validation_errors_fall_back_to_message() {
        let err = ApiError::from_response(400, br#"{"error":"bad","validation_errors":""}"#);
        assert_eq!(err.to_string(), "sendamatic api error (status 400): bad");
    }

    #[test]
    fn status_comes_from_argument() {
        let err = ApiError::from_response(401, br#"{"error":"Invalid API key","status_code":999}"#);
        assert_eq!(err.status_code, 401);
        assert_eq!(err.message, "Invalid API key");
        assert_eq!(err.validation_errors, None);
        assert_eq!(err.json_path, None);
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let err = ApiError::from_response(500, b"Internal Server Error - not JSON");
        assert_eq!(err.status_code, 500);
        assert_eq!(err.message, "Internal Server Error - not JSON");
        assert_eq!(err.smtp_code, None);
        assert_eq!(err.sender, None);
    }

    #[test]
    fn malformed_and_non_object_json_fall_back() {
        for body in [r#"{"error": "truncated"#, r#"["positional"]"#, r#""just a string""#] {
            let err = ApiError::from_response(502, body.as_bytes());
            assert_eq!(err.message, body);
            assert_eq!(err.status_code, 502);
        }
    }

    #[test]
    fn null_error_field_keeps_other_fields() {
        let err = ApiError::from_response(
            422,
            br#"{"error":null,"validation_errors":"bad","json_path":"$.to"}"#,
        );
        assert_eq!(err.message, "");
        assert_eq!(err.validation_errors.as_deref(), Some("bad"));
        assert_eq!(err.json_path.as_deref(), Some("$.to"));
        assert_eq!(err.to_string(), "sendamatic api error (status 422): bad (path: $.to)");
    }

    #[test]
    fn smtp_code_outside_u16_is_kept() {
        let err = ApiError::from_response(500, br#"{"error":"relay","smtp_code":70000}"#);
        assert_eq!(err.message, "relay");
        assert_eq!(err.smtp_code, Some(70000));

        let err = ApiError::from_response(500, br#"{"error":"relay","smtp_code":-1}"#);
        assert_eq!(err.smtp_code, Some(-1));
    }

    #[test]
    fn invalid_utf8_body_is_replaced_lossily() {
        let err = ApiError::from_response(500, b"bad \xff gateway");
        assert_eq!(err.message, "bad \u{fffd} gateway");

        let err = ApiError::from_response(500, "caf\u{e9} down".as_bytes());
        assert_eq!(err.message, "caf\u{e9} down");
    }

    #[test]
    fn empty_body_yields_empty_message() {
        let err = ApiError::from_response(404, b"");
        assert_eq!(err.status_code, 404);
        assert_eq!(err.message, "");
        assert_eq!(err.to_string(), "sendamatic api error (status 404): ");
    }

    #[test]
    fn api_error_is_reachable_from_crate_error() {
        let err: Error = ApiError::from_response(403, br#"{"error":"forbidden"}"#).into();
        assert_eq!(err.to_string(), "sendamatic api error (status 403): forbidden");
        assert_eq!(err.api_error().map(|e| e.status_code), Some(403));
        assert!(!err.is_timeout());
    }

    #[test]
    fn validation_error_keeps_source() {
        let err: Error = ValidationError::MissingSubject.into();
        assert_eq!(err.to_string(), "message validation failed: subject is required");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("subject is required")
        );
    }

    #[test]
    fn cancellation_kinds_are_distinct() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::Cancelled.is_timeout());
        assert!(Error::DeadlineExceeded.is_timeout());
        assert!(!Error::DeadlineExceeded.is_cancelled());
    }
}
