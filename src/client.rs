//! Sendamatic async client implementation.

use crate::{ApiError, Error, Message, Result, SendResponse};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

const BASE_URL: &str = "https://send.api.sendamatic.net";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT_VALUE: &str = concat!("sendamatic-rs/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-api-key";

/// Async client for the Sendamatic email delivery API.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] for a custom
/// endpoint, timeout, or HTTP transport. The client is cheap to share by
/// reference across tasks; each send is independent.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    api_key: HeaderValue,
    base_url: String,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder(user_id: impl Into<String>, password: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(user_id, password)
    }

    /// Create a client with the default endpoint and a 30 second timeout.
    ///
    /// # Examples
    /// ```no_run
    /// # use sendamatic::Client;
    /// let client = Client::new("user-id", "password")?;
    /// # Ok::<(), sendamatic::Error>(())
    /// ```
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(user_id, password).build()
    }

    /// The API endpoint requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Send a message.
    ///
    /// The message is validated first; an invalid message is rejected
    /// without touching the network. A `200` response with some rejected
    /// recipients is still `Ok`: inspect them on the returned
    /// [`SendResponse`].
    ///
    /// # Errors
    /// - [`Error::Validation`] if the message is incomplete
    /// - [`Error::Request`] / [`Error::ReadBody`] on transport failures
    /// - [`Error::Api`] if the service answers with status 400 or above
    /// - [`Error::Decode`] if a success body has an unexpected shape
    ///
    /// # Examples
    /// ```no_run
    /// # use sendamatic::{Client, Message};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), sendamatic::Error> {
    /// let client = Client::new("user-id", "password")?;
    /// let message = Message::new()
    ///     .sender("sender@example.com")
    ///     .add_to("recipient@example.com")
    ///     .subject("Hello")
    ///     .text_body("Hello World");
    /// let response = client.send(&message).await?;
    /// println!("{:?}", response.message_id("recipient@example.com"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send(&self, message: &Message) -> Result<SendResponse> {
        message.validate()?;
        self.dispatch(message).await
    }

    /// Send a message, giving up once `deadline` passes.
    ///
    /// A deadline already in the past fails without sending. The in-flight
    /// request is dropped, which closes its connection.
    ///
    /// # Errors
    /// [`Error::DeadlineExceeded`] if the deadline fires first, otherwise as
    /// for [`Client::send`].
    pub async fn send_with_deadline(
        &self,
        message: &Message,
        deadline: Instant,
    ) -> Result<SendResponse> {
        message.validate()?;
        if Instant::now() >= deadline {
            tracing::debug!("deadline passed before dispatch");
            return Err(Error::DeadlineExceeded);
        }
        tokio::time::timeout_at(deadline, self.dispatch(message))
            .await
            .unwrap_or_else(|_| {
                tracing::debug!("deadline exceeded during send");
                Err(Error::DeadlineExceeded)
            })
    }

    /// Send a message, aborting when `cancel` resolves.
    ///
    /// `cancel` is polled before the request, so an already-resolved signal
    /// fails without sending.
    ///
    /// # Errors
    /// [`Error::Cancelled`] if the signal fires first, otherwise as for
    /// [`Client::send`].
    ///
    /// # Examples
    /// ```no_run
    /// # use sendamatic::{Client, Message};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), sendamatic::Error> {
    /// # let client = Client::new("user-id", "password")?;
    /// # let message = Message::new();
    /// let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    /// let cancel = async {
    ///     let _ = rx.await;
    /// };
    /// let response = client.send_with_cancel(&message, cancel).await;
    /// # drop(tx);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_with_cancel<F>(&self, message: &Message, cancel: F) -> Result<SendResponse>
    where
        F: Future<Output = ()>,
    {
        message.validate()?;
        tokio::select! {
            biased;
            () = cancel => {
                tracing::debug!("send cancelled by caller");
                Err(Error::Cancelled)
            }
            result = self.dispatch(message) => result,
        }
    }

    /// Serialize, post, and decode. Assumes the message is valid.
    async fn dispatch(&self, message: &Message) -> Result<SendResponse> {
        let payload = serde_json::to_vec(message).map_err(Error::Serialize)?;
        let url = format!("{}/send", self.base_url);

        tracing::debug!(%url, recipients = message.to.len(), "sending message");

        let mut request = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(API_KEY_HEADER, self.api_key.clone())
            .body(payload);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(Error::Request)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(Error::ReadBody)?;

        if status >= 400 {
            let err = ApiError::from_response(status, &body);
            tracing::warn!(status, "sendamatic rejected message");
            return Err(err.into());
        }

        let response = SendResponse::from_response(status, &body)?;
        tracing::debug!(status, recipients = response.len(), "message sent");
        Ok(response)
    }
}

/// The HTTP transport a [`Client`] will use.
#[derive(Debug, Clone)]
enum Transport {
    Default,
    Custom(reqwest::Client),
}

/// Builder for configuring a Sendamatic client.
///
/// Start with [`Client::builder`] to override defaults. Options apply in
/// call order: [`ClientBuilder::http_client`] replaces the transport
/// wholesale and discards an earlier [`ClientBuilder::timeout`], while a
/// later `timeout` applies to the custom transport.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    user_id: String,
    password: String,
    base_url: String,
    transport: Transport,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Endpoint `https://send.api.sendamatic.net`
    /// - 30 second request timeout
    /// - A fresh `reqwest` client
    pub fn new(user_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            password: password.into(),
            base_url: BASE_URL.to_string(),
            transport: Transport::Default,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Override the API endpoint.
    ///
    /// Useful for testing or a staging environment.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout. `Duration::ZERO` disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Use a preconfigured `reqwest` client for all requests.
    ///
    /// Its own settings (timeouts, proxies, TLS) are kept as they are.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.transport = Transport::Custom(client);
        self.timeout = None;
        self
    }

    /// Build the client.
    ///
    /// No network traffic happens here.
    ///
    /// # Errors
    /// - [`Error::InvalidApiKey`] if the credentials cannot be sent as a header
    /// - [`Error::Build`] if the default transport cannot be created
    ///
    /// # Examples
    /// ```no_run
    /// # use sendamatic::Client;
    /// # use std::time::Duration;
    /// let client = Client::builder("user-id", "password")
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// # Ok::<(), sendamatic::Error>(())
    /// ```
    pub fn build(self) -> Result<Client> {
        let mut api_key = HeaderValue::from_str(&format!("{}-{}", self.user_id, self.password))
            .map_err(|_| Error::InvalidApiKey)?;
        api_key.set_sensitive(true);

        let http = match self.transport {
            Transport::Default => reqwest::Client::builder()
                .user_agent(USER_AGENT_VALUE)
                .build()
                .map_err(Error::Build)?,
            Transport::Custom(client) => client,
        };

        Ok(Client {
            http,
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let client = Client::new("test-user", "test-pass").unwrap();

        assert_eq!(client.api_key, "test-user-test-pass");
        assert!(client.api_key.is_sensitive());
        assert_eq!(client.base_url(), BASE_URL);
        assert_eq!(client.timeout(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn base_url_override() {
        for url in [
            "https://api.example.com",
            "http://localhost:8080",
            "https://staging.sendamatic.net",
        ] {
            let client = Client::builder("u", "p").base_url(url).build().unwrap();
            assert_eq!(client.base_url(), url);
        }
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = Client::builder("u", "p")
            .base_url("http://localhost:8080/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn timeout_override() {
        let client = Client::builder("u", "p")
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));

        let client = Client::builder("u", "p")
            .timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn http_client_discards_earlier_timeout() {
        let client = Client::builder("u", "p")
            .timeout(Duration::from_secs(5))
            .http_client(reqwest::Client::new())
            .build()
            .unwrap();
        assert_eq!(client.timeout(), None);
    }

    #[test]
    fn later_timeout_applies_to_custom_client() {
        let client = Client::builder("u", "p")
            .http_client(reqwest::Client::new())
            .timeout(Duration::from_secs(60))
            .base_url("https://custom.example.com")
            .build()
            .unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(client.base_url(), "https://custom.example.com");
    }

    #[test]
    fn invalid_api_key_is_rejected() {
        let err = Client::new("user\n", "pass").unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey));
    }
}
