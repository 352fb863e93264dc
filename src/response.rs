//! Decoding of successful send responses.

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Outcome of a send request that was not rejected outright.
///
/// The service answers with one `[status, message_id]` pair per recipient.
/// A `200` envelope can still contain rejected recipients, so check each
/// address you care about with [`SendResponse::status`].
#[derive(Debug, Clone, PartialEq)]
pub struct SendResponse {
    /// HTTP status of the response.
    pub status_code: u16,
    recipients: HashMap<String, RecipientStatus>,
}

/// The raw `[status, message_id]` pair reported for one recipient.
///
/// Both slots are kept as untyped JSON; the accessors return `None` when a
/// slot does not hold the expected type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RecipientStatus([Value; 2]);

impl RecipientStatus {
    /// Delivery status code, truncated toward zero if sent as a fraction.
    pub fn status(&self) -> Option<i64> {
        match &self.0[0] {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
            _ => None,
        }
    }

    /// Provider-assigned message identifier.
    pub fn message_id(&self) -> Option<&str> {
        self.0[1].as_str()
    }

    /// The pair exactly as received.
    pub fn raw(&self) -> &[Value; 2] {
        &self.0
    }
}

impl SendResponse {
    /// Decode a success body.
    ///
    /// The body must be a JSON object whose values are two-element arrays.
    /// The element types are not checked here.
    ///
    /// # Errors
    /// Returns [`Error::Decode`] if the body does not have that shape.
    pub fn from_response(status_code: u16, body: &[u8]) -> Result<Self> {
        let recipients = serde_json::from_slice(body).map_err(Error::Decode)?;
        Ok(Self {
            status_code,
            recipients,
        })
    }

    /// Whether the envelope status is exactly `200`.
    ///
    /// This says nothing about individual recipients.
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Delivery status for `address`.
    ///
    /// `None` if the address is absent or its status is not numeric.
    pub fn status(&self, address: &str) -> Option<i64> {
        self.recipients.get(address).and_then(RecipientStatus::status)
    }

    /// Message identifier for `address`.
    ///
    /// `None` if the address is absent or its identifier is not a string.
    pub fn message_id(&self, address: &str) -> Option<&str> {
        self.recipients
            .get(address)
            .and_then(RecipientStatus::message_id)
    }

    /// Raw outcome for `address`.
    pub fn recipient(&self, address: &str) -> Option<&RecipientStatus> {
        self.recipients.get(address)
    }

    /// Iterate over every reported recipient, in no particular order.
    pub fn recipients(&self) -> impl Iterator<Item = (&str, &RecipientStatus)> {
        self.recipients
            .iter()
            .map(|(address, outcome)| (address.as_str(), outcome))
    }

    /// Number of recipients reported.
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether no recipients were reported.
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }
}
