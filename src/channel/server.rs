//! Agent-side channel endpoint, opened once per cycle.
//!
//! Each exchange binds the well-known name, waits for one model
//! connection, writes the request record, reads one reply record, and
//! releases the name. Release happens when [`ChannelEndpoint`] and its
//! [`ChannelConnection`] go out of scope, so it covers success, error,
//! and timeout alike.

use interprocess::local_socket::tokio::{prelude::*, Listener};
use interprocess::local_socket::{GenericNamespaced, ListenerOptions};
use tracing::{debug, info, info_span, Instrument};

use crate::channel::{bounded, ChannelConnection, ChannelSettings};
use crate::{AppError, Result};

/// Serves one request/reply exchange per call.
#[derive(Debug, Clone)]
pub struct ChannelServer {
    settings: ChannelSettings,
}

impl ChannelServer {
    /// Create a server for the given channel settings.
    #[must_use]
    pub fn new(settings: ChannelSettings) -> Self {
        Self { settings }
    }

    /// Channel parameters used for every exchange.
    #[must_use]
    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    /// Bind the well-known name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Channel` if the name is invalid or already bound.
    pub fn open(&self) -> Result<ChannelEndpoint> {
        let name = self.settings.name.as_str();
        let listener_name = name
            .to_ns_name::<GenericNamespaced>()
            .map_err(|err| AppError::Channel(format!("invalid channel name '{name}': {err}")))?;

        let listener = ListenerOptions::new()
            .name(listener_name)
            .create_tokio()
            .map_err(|err| {
                AppError::Channel(format!("failed to create endpoint '{name}': {err}"))
            })?;

        debug!(channel = name, "channel endpoint bound");

        Ok(ChannelEndpoint {
            listener,
            settings: self.settings.clone(),
        })
    }

    /// Run one complete exchange and return the reply with its terminator removed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Channel`, `AppError::ConnectTimeout`,
    /// `AppError::Send`, or `AppError::Receive` for the step that failed.
    pub async fn exchange(&self, request: &str) -> Result<String> {
        let span = info_span!("channel_exchange", channel = %self.settings.name);
        async move {
            let endpoint = self.open()?;
            let mut connection = endpoint.accept().await?;
            info!("model connected");

            connection.send(request).await?;
            debug!(bytes = request.len(), "request sent");

            let reply = connection.receive().await?;
            debug!(bytes = reply.len(), "reply received");
            Ok(reply)
        }
        .instrument(span)
        .await
    }
}

/// A bound endpoint. Dropping it releases the name.
pub struct ChannelEndpoint {
    listener: Listener,
    settings: ChannelSettings,
}

impl ChannelEndpoint {
    /// Name this endpoint is bound to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Wait for exactly one model connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConnectTimeout` if nobody connects within the
    /// connect timeout, or `AppError::Channel` if the accept call fails.
    pub async fn accept(&self) -> Result<ChannelConnection> {
        match bounded(self.settings.connect_timeout, self.listener.accept()).await {
            Some(Ok(stream)) => Ok(ChannelConnection::new(stream, &self.settings)),
            Some(Err(err)) => Err(AppError::Channel(format!("accept failed: {err}"))),
            None => Err(AppError::ConnectTimeout(format!(
                "no model connected to '{}' within {:?}",
                self.settings.name,
                self.settings.connect_timeout.unwrap_or_default()
            ))),
        }
    }
}

impl Drop for ChannelEndpoint {
    fn drop(&mut self) {
        debug!(channel = %self.settings.name, "channel endpoint released");
    }
}

impl std::fmt::Debug for ChannelEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelEndpoint")
            .field("name", &self.settings.name)
            .finish_non_exhaustive()
    }
}
