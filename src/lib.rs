//! # Sendamatic Client
//! Asynchronous wrapper around the Sendamatic transactional email HTTP API: build a [`Message`], submit it with [`Client::send`], and branch on the typed [`SendResponse`] or [`Error`].
//!
//! ## Audience and uses
//! For Rust services that deliver transactional mail (sign-up confirmations, password resets, receipts) through Sendamatic without speaking SMTP themselves: configure with [`ClientBuilder`], compose a [`Message`], send it, then inspect per-recipient outcomes.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`, so ensure the chosen Tokio features (`rt-multi-thread` or `current_thread`) are available in your application.
//!
//! ## Out of scope
//! No retries, batching, or persistence of sent messages. Each call to [`Client::send`] issues at most one request.
//!
//! ## Errors
//! Messages are validated before any I/O and rejected with [`Error::Validation`]. Rejections by the service (status 400 and above) surface as [`Error::Api`] carrying an [`ApiError`]; a success body that does not match the expected shape becomes [`Error::Decode`]. Transport failures are [`Error::Request`], and caller-side aborts are [`Error::Cancelled`] or [`Error::DeadlineExceeded`].
//!
//! A `200` response can still contain rejected recipients. Those are not errors: query them with [`SendResponse::status`] and [`SendResponse::message_id`].
//!
//! ## Example
//! ```no_run
//! use sendamatic::{Client, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sendamatic::Error> {
//!     let client = Client::new("user-id", "password")?;
//!     let message = Message::new()
//!         .sender("sender@example.com")
//!         .add_to("recipient@example.com")
//!         .subject("Hello")
//!         .text_body("Hello World");
//!
//!     let response = client.send(&message).await?;
//!     for (address, outcome) in response.recipients() {
//!         println!("{address}: {:?} {:?}", outcome.status(), outcome.message_id());
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod message;
mod response;

pub use client::{Client, ClientBuilder};
pub use error::{ApiError, Error};
pub use message::{Attachment, Header, MAX_RECIPIENTS, Message, ValidationError};
pub use response::{RecipientStatus, SendResponse};

/// Result type alias for Sendamatic operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
