//! Local duplex channel between the agent and the model.
//!
//! Uses a named pipe (Windows) or Unix domain socket (Linux/macOS) through
//! the `interprocess` crate. The agent side ([`server::ChannelServer`])
//! binds a fresh endpoint for every cycle, serves exactly one request and
//! one reply, and releases the endpoint. The model side
//! ([`client::ModelClient`]) connects, reads the request, and replies.

pub mod client;
pub mod connection;
pub mod server;

use std::future::Future;
use std::time::Duration;

pub use client::ModelClient;
pub use connection::ChannelConnection;
pub use server::{ChannelEndpoint, ChannelServer};

use crate::config::GlobalConfig;

/// Resolved channel parameters shared by both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Well-known endpoint name.
    pub name: String,
    /// Receive buffer size in bytes; one byte is reserved.
    pub max_message_bytes: usize,
    /// Bound on the connect-wait; `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Bound on each write and read; `None` waits indefinitely.
    pub io_timeout: Option<Duration>,
}

impl ChannelSettings {
    /// Extract channel settings from the global configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            name: config.channel.name.clone(),
            max_message_bytes: config.channel.max_message_bytes,
            connect_timeout: config.connect_timeout(),
            io_timeout: config.io_timeout(),
        }
    }

    /// Settings for `name` with the default size limit and no timeouts.
    #[must_use]
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_message_bytes: crate::config::ChannelConfig::default().max_message_bytes,
            connect_timeout: None,
            io_timeout: None,
        }
    }
}

/// Await `fut`, giving up after `limit` when one is set.
///
/// Returns `None` on timeout.
pub(crate) async fn bounded<F: Future>(limit: Option<Duration>, fut: F) -> Option<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
        None => Some(fut.await),
    }
}
