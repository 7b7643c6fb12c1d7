#![forbid(unsafe_code)]

//! `model-link`: throttled coordination between a real-time agent and a
//! long-lived model process over a local duplex channel.

pub mod channel;
pub mod config;
pub mod errors;
pub mod protocol;
pub mod scheduler;
pub mod session;
pub mod supervisor;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
pub use session::{CoordinationSession, Coordinator, CycleOutcome};
