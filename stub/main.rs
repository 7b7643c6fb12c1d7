#![forbid(unsafe_code)]

//! `model-link-stub`: stand-in model process.
//!
//! Speaks the model side of the wire protocol: for every cycle it connects
//! to the agent's endpoint, reads the observation record, and replies with
//! a gate `--delay-seconds` in the future followed by the configured
//! directives.

use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use model_link::channel::{ChannelSettings, ModelClient};
use model_link::protocol::GateTime;
use model_link::{AppError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "model-link-stub",
    about = "Stand-in model for model-link",
    version,
    long_about = None
)]
struct Cli {
    /// Channel name (must match the agent's `channel.name` config).
    #[arg(long, default_value = "AgentServer")]
    channel_name: String,

    /// Number of cycles to serve before exiting. Serves forever when omitted.
    #[arg(long)]
    cycles: Option<u32>,

    /// Seconds the agent must wait before the next cycle.
    #[arg(long, default_value_t = 15)]
    delay_seconds: u64,

    /// Directive to return each cycle; repeat for several.
    #[arg(long = "directive")]
    directives: Vec<String>,

    /// Seconds to keep retrying while the agent has no endpoint bound.
    #[arg(long, default_value_t = 60)]
    connect_window_seconds: u64,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(serve(args))
}

async fn serve(args: Cli) -> Result<()> {
    let settings = ChannelSettings::unbounded(args.channel_name.clone());
    let window = Duration::from_secs(args.connect_window_seconds);
    let delay = Duration::from_secs(args.delay_seconds);

    let mut served = 0u32;
    while args.cycles.is_none_or(|limit| served < limit) {
        let mut client = ModelClient::connect(&settings, window).await?;

        let observation = match client.receive_request().await {
            Ok(observation) => observation,
            Err(err) => {
                warn!(%err, "agent sent no observation");
                continue;
            }
        };
        if observation.trim().is_empty() {
            warn!("agent sent an empty observation");
        }
        info!(%observation, "observation received");

        let gate = GateTime::now().after(delay);
        if let Err(err) = client.send_reply(gate, &args.directives).await {
            warn!(%err, "failed to reply to agent");
            continue;
        }
        served += 1;
        info!(%gate, cycle = served, "reply sent");
    }

    info!(cycles = served, "model stub exiting");
    Ok(())
}
