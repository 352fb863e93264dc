//! Outgoing message model and pre-send validation.

use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Maximum number of `to` recipients the service accepts per message.
pub const MAX_RECIPIENTS: usize = 255;

/// An email message ready to be sent through [`Client::send`](crate::Client::send).
///
/// Build one with [`Message::new`] and the chaining methods below. None of
/// them validate; call [`Message::validate`] (or just send, which validates
/// first) to check the message.
///
/// # Examples
/// ```
/// use sendamatic::Message;
///
/// let message = Message::new()
///     .sender("sender@example.com")
///     .add_to("one@example.com")
///     .add_cc("two@example.com")
///     .subject("Quarterly report")
///     .html_body("<p>See attached.</p>")
///     .add_header("Reply-To", "reports@example.com")
///     .attach_file("report.csv", "text/csv", b"a,b\n1,2\n");
///
/// assert!(message.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Primary recipients.
    #[serde(default)]
    pub to: Vec<String>,
    /// Carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    /// Blind carbon-copy recipients.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    /// Sender address.
    #[serde(default)]
    pub sender: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Plain text body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text_body: String,
    /// HTML body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_body: String,
    /// Custom headers, in insertion order. Duplicates are allowed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    /// Attachments, in insertion order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

/// A custom header as a name/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name, e.g. `Reply-To`.
    pub header: String,
    /// Header value.
    pub value: String,
}

/// A file attachment. The payload is held base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name shown to the recipient.
    pub filename: String,
    /// Base64-encoded file content.
    pub data: String,
    /// MIME type, e.g. `application/pdf`.
    #[serde(rename = "mimetype")]
    pub mime_type: String,
}

impl Attachment {
    /// Create an attachment, encoding `data` immediately.
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            data: STANDARD.encode(data),
            mime_type: mime_type.into(),
        }
    }

    /// Decode the stored payload back into raw bytes.
    pub fn decoded(&self) -> std::result::Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Reasons a [`Message`] is not ready to send.
///
/// Only the first violation found is reported, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `to` is empty.
    #[error("at least one recipient required")]
    NoRecipients,

    /// `to` holds more than [`MAX_RECIPIENTS`] addresses.
    #[error("maximum 255 recipients allowed")]
    TooManyRecipients,

    /// `sender` is empty.
    #[error("sender is required")]
    MissingSender,

    /// `subject` is empty.
    #[error("subject is required")]
    MissingSubject,

    /// Both bodies are empty.
    #[error("either text body or html body is required")]
    MissingBody,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primary recipient.
    pub fn add_to(mut self, address: impl Into<String>) -> Self {
        self.to.push(address.into());
        self
    }

    /// Append a carbon-copy recipient.
    pub fn add_cc(mut self, address: impl Into<String>) -> Self {
        self.cc.push(address.into());
        self
    }

    /// Append a blind carbon-copy recipient.
    pub fn add_bcc(mut self, address: impl Into<String>) -> Self {
        self.bcc.push(address.into());
        self
    }

    /// Set the sender address.
    pub fn sender(mut self, address: impl Into<String>) -> Self {
        self.sender = address.into();
        self
    }

    /// Set the subject line.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the plain text body.
    pub fn text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = body.into();
        self
    }

    /// Set the HTML body.
    pub fn html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = body.into();
        self
    }

    /// Append a custom header such as `Reply-To` or `X-Priority`.
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(Header {
            header: name.into(),
            value: value.into(),
        });
        self
    }

    /// Attach raw bytes. The data is base64-encoded right away.
    pub fn attach_file(
        mut self,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        data: &[u8],
    ) -> Self {
        self.attachments
            .push(Attachment::new(filename, mime_type, data));
        self
    }

    /// Read a file from disk and attach it.
    ///
    /// The attachment is named after the last segment of `path`, split on
    /// both `/` and `\`.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read; the message is left
    /// unchanged.
    pub fn attach_file_from_path(
        &mut self,
        path: impl AsRef<Path>,
        mime_type: impl Into<String>,
    ) -> Result<&mut Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let raw = path.to_string_lossy();
        let filename = Self::file_name(&raw).to_string();

        self.attachments
            .push(Attachment::new(filename, mime_type, &data));
        Ok(self)
    }

    /// Check that the message can be sent.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] that applies.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.to.is_empty() {
            return Err(ValidationError::NoRecipients);
        }
        if self.to.len() > MAX_RECIPIENTS {
            return Err(ValidationError::TooManyRecipients);
        }
        if self.sender.is_empty() {
            return Err(ValidationError::MissingSender);
        }
        if self.subject.is_empty() {
            return Err(ValidationError::MissingSubject);
        }
        if self.text_body.is_empty() && self.html_body.is_empty() {
            return Err(ValidationError::MissingBody);
        }
        Ok(())
    }

    /// Final path segment, accepting both separators regardless of platform.
    fn file_name(path: &str) -> &str {
        path.rsplit(['/', '\\']).next().unwrap_or(path)
    }
}
