//! NATS connection to the session registry.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::codec;
use crate::error::NetError;

/// Used when neither a URL nor `NATS_URL` is given.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

pub const NATS_URL_ENV: &str = "NATS_URL";

/// How long a registry call may wait for its reply.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client name announced to the NATS server.
const CLIENT_NAME: &str = "lobby-registry-client";

/// An `async-nats` client that speaks MessagePack request/reply.
#[derive(Debug, Clone)]
pub struct NatsConnection {
    client: async_nats::Client,
}

impl NatsConnection {
    /// Connect to `$NATS_URL`, or [`DEFAULT_NATS_URL`] when unset.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the server cannot be reached.
    pub async fn connect() -> Result<Self, NetError> {
        let url = std::env::var(NATS_URL_ENV).unwrap_or_else(|_| DEFAULT_NATS_URL.to_string());
        Self::connect_to(&url).await
    }

    /// Connect to `url` with [`DEFAULT_REQUEST_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the server cannot be reached.
    pub async fn connect_to(url: &str) -> Result<Self, NetError> {
        Self::connect_with_timeout(url, DEFAULT_REQUEST_TIMEOUT).await
    }

    /// Connect to `url`, failing registry calls that get no reply within
    /// `request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Connect`] if the server cannot be reached.
    pub async fn connect_with_timeout(
        url: &str,
        request_timeout: Duration,
    ) -> Result<Self, NetError> {
        info!(url, timeout_ms = request_timeout.as_millis() as u64, "connecting to NATS");
        let client = async_nats::ConnectOptions::new()
            .name(CLIENT_NAME)
            .request_timeout(Some(request_timeout))
            .connect(url)
            .await?;
        info!(url, "connected to NATS");
        Ok(Self { client })
    }

    /// Send `message` to `subject` with `headers` attached and decode the
    /// reply.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if encoding, the request, or decoding fails.
    pub async fn request_with_headers<T: Serialize, R: DeserializeOwned>(
        &self,
        subject: &str,
        headers: async_nats::HeaderMap,
        message: &T,
    ) -> Result<R, NetError> {
        let payload = codec::encode(message)?;
        let reply = self
            .client
            .request_with_headers(subject.to_string(), headers, payload.into())
            .await?;
        debug!(subject, bytes = reply.payload.len(), "registry reply");
        codec::decode(&reply.payload)
    }
}
