//! Model-side channel client.
//!
//! The agent tears its endpoint down after every cycle, so the model
//! reconnects for each exchange and retries while no endpoint is bound.

use std::time::Duration;

use interprocess::local_socket::tokio::{prelude::*, Stream};
use interprocess::local_socket::GenericNamespaced;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::channel::{ChannelConnection, ChannelSettings};
use crate::protocol::{decoder, GateTime};
use crate::{AppError, Result};

/// Pause between connection attempts while the agent has no endpoint bound.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// The model's end of one exchange.
#[derive(Debug)]
pub struct ModelClient {
    connection: ChannelConnection,
}

impl ModelClient {
    /// Connect to the agent's endpoint, retrying for up to `retry_window`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Channel` for an invalid name, or
    /// `AppError::ConnectTimeout` if no endpoint accepted within the window.
    pub async fn connect(settings: &ChannelSettings, retry_window: Duration) -> Result<Self> {
        let deadline = Instant::now() + retry_window;
        let name = settings.name.as_str();

        loop {
            let ns_name = name
                .to_ns_name::<GenericNamespaced>()
                .map_err(|err| AppError::Channel(format!("invalid channel name '{name}': {err}")))?;

            match Stream::connect(ns_name).await {
                Ok(stream) => {
                    info!(channel = name, "connected to agent");
                    return Ok(Self {
                        connection: ChannelConnection::new(stream, settings),
                    });
                }
                Err(err) if Instant::now() < deadline => {
                    debug!(channel = name, %err, "agent endpoint not ready, retrying");
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(err) => {
                    return Err(AppError::ConnectTimeout(format!(
                        "agent endpoint '{name}' unavailable after {retry_window:?}: {err}"
                    )));
                }
            }
        }
    }

    /// Read the agent's observation record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Receive` if no complete record arrives.
    pub async fn receive_request(&mut self) -> Result<String> {
        self.connection.receive().await
    }

    /// Reply with the next gate time followed by `directives`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Send` if the reply cannot be written.
    pub async fn send_reply<S: AsRef<str>>(&mut self, gate: GateTime, directives: &[S]) -> Result<()> {
        self.send_raw(&decoder::encode(gate, directives)).await
    }

    /// Reply with an arbitrary record.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Send` if the reply cannot be written.
    pub async fn send_raw(&mut self, raw: &str) -> Result<()> {
        self.connection.send(raw).await
    }
}
