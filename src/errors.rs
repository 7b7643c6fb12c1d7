//! Error types shared across the coordination layer.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all coordination failure modes.
///
/// Lifecycle variants (`ProcessLaunch`, `InvalidState`) are fatal to the
/// caller. Exchange variants (`Channel`, `ConnectTimeout`, `Send`, `Receive`,
/// `TimestampFormat`) are contained per cycle by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// The model process could not be located or launched.
    ProcessLaunch(String),
    /// A lifecycle operation was called in the wrong state.
    InvalidState(String),
    /// The channel endpoint could not be created.
    Channel(String),
    /// No model connected to the endpoint within the connect timeout.
    ConnectTimeout(String),
    /// The outgoing record could not be written.
    Send(String),
    /// The reply record could not be read.
    Receive(String),
    /// The reply's leading field is not a `MM:DD:YYYY:HH:MM:SS` timestamp.
    TimestampFormat(String),
    /// File-system or process I/O failure.
    Io(String),
}

impl AppError {
    /// Whether this error is contained inside a single exchange cycle.
    #[must_use]
    pub fn is_cycle_local(&self) -> bool {
        matches!(
            self,
            Self::Channel(_)
                | Self::ConnectTimeout(_)
                | Self::Send(_)
                | Self::Receive(_)
                | Self::TimestampFormat(_)
        )
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::ProcessLaunch(msg) => write!(f, "process launch: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Channel(msg) => write!(f, "channel: {msg}"),
            Self::ConnectTimeout(msg) => write!(f, "connect timeout: {msg}"),
            Self::Send(msg) => write!(f, "send: {msg}"),
            Self::Receive(msg) => write!(f, "receive: {msg}"),
            Self::TimestampFormat(msg) => write!(f, "timestamp format: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}
