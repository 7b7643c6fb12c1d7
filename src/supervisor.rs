//! Model process supervisor.
//!
//! Launches the model as a child process from a path chosen by build
//! profile and resolved against the current working directory, reports
//! its health, and waits for (or forces) its exit on stop. The child is
//! spawned with `kill_on_drop(true)` so a dropped supervisor never leaks it.
//! Its stdout is discarded; stderr is shared with the agent for diagnostics.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{info, info_span, warn, Instrument};

use crate::config::ModelConfig;
use crate::{AppError, Result};

/// Build profile selecting which model executable to launch.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BuildProfile {
    /// Debug build of the agent; launches `debug_executable`.
    Debug,
    /// Release build of the agent; launches `release_executable`.
    Release,
}

impl BuildProfile {
    /// Profile of the running binary.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Observed state of the model process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelHealth {
    /// No process has been started, or it was stopped.
    NotStarted,
    /// The process is alive.
    Running {
        /// OS process id.
        pid: u32,
    },
    /// The process exited on its own.
    Exited {
        /// Human-readable exit description.
        status: String,
    },
}

/// Resolve the model executable for `profile` against `working_dir`.
///
/// Absolute configured paths are returned unchanged.
#[must_use]
pub fn resolve_executable(config: &ModelConfig, profile: BuildProfile, working_dir: &Path) -> PathBuf {
    let configured = match profile {
        BuildProfile::Debug => &config.debug_executable,
        BuildProfile::Release => &config.release_executable,
    };
    working_dir.join(configured)
}

/// Owns the model child process between `start` and `stop`.
#[derive(Debug)]
pub struct ProcessSupervisor {
    config: ModelConfig,
    profile: BuildProfile,
    child: Option<Child>,
}

impl ProcessSupervisor {
    /// Create a supervisor for the current build profile. Nothing is launched yet.
    #[must_use]
    pub fn new(config: ModelConfig) -> Self {
        Self::with_profile(config, BuildProfile::current())
    }

    /// Create a supervisor that launches the executable for `profile`.
    #[must_use]
    pub fn with_profile(config: ModelConfig, profile: BuildProfile) -> Self {
        Self {
            config,
            profile,
            child: None,
        }
    }

    /// Whether a process is currently recorded.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.child.is_some()
    }

    /// Launch the model and record its handle.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if a process is already recorded,
    /// or `AppError::ProcessLaunch` if the working directory cannot be
    /// determined or the spawn fails.
    pub fn start(&mut self) -> Result<u32> {
        if self.child.is_some() {
            return Err(AppError::InvalidState("model process already started".into()));
        }

        let working_dir = env::current_dir().map_err(|err| {
            AppError::ProcessLaunch(format!("failed to get the current directory: {err}"))
        })?;
        let executable = resolve_executable(&self.config, self.profile, &working_dir);

        let child = Command::new(&executable)
            .args(&self.config.args)
            .stdin(Stdio::null())
            // The agent's stdout carries directives only.
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                AppError::ProcessLaunch(format!(
                    "failed to start model '{}': {err}",
                    executable.display()
                ))
            })?;

        let pid = child.id().unwrap_or(0);
        info!(pid, executable = %executable.display(), profile = ?self.profile, "model process started");
        self.child = Some(child);
        Ok(pid)
    }

    /// Poll the model without blocking.
    pub fn health(&mut self) -> ModelHealth {
        let Some(child) = self.child.as_mut() else {
            return ModelHealth::NotStarted;
        };

        match child.try_wait() {
            Ok(None) => ModelHealth::Running {
                pid: child.id().unwrap_or(0),
            },
            Ok(Some(status)) => ModelHealth::Exited {
                status: describe_exit(status),
            },
            Err(err) => {
                warn!(%err, "failed to poll model process status");
                ModelHealth::Exited {
                    status: "status unknown".into(),
                }
            }
        }
    }

    /// Wait for the model to exit and clear the recorded handle.
    ///
    /// With a grace period the model is killed once it elapses; without one
    /// this waits indefinitely. A later [`start`](Self::start) is allowed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if no process was started, or
    /// `AppError::Io` if waiting on or killing the process fails.
    pub async fn stop(&mut self, grace: Option<Duration>) -> Result<String> {
        let Some(mut child) = self.child.take() else {
            return Err(AppError::InvalidState("model process is not running".into()));
        };

        let pid = child.id().unwrap_or(0);
        let span = info_span!("model_stop", pid);
        async move {
            info!("waiting for model process to exit");
            let status = match grace {
                None => child.wait().await?,
                Some(grace) => match tokio::time::timeout(grace, child.wait()).await {
                    Ok(status) => status?,
                    Err(_elapsed) => {
                        warn!(?grace, "model did not exit within grace period, killing");
                        child.kill().await?;
                        child.wait().await?
                    }
                },
            };

            let description = describe_exit(status);
            info!(status = %description, "model process stopped");
            Ok(description)
        }
        .instrument(span)
        .await
    }
}

fn describe_exit(status: ExitStatus) -> String {
    if status.success() {
        "exited normally (code 0)".to_owned()
    } else {
        status.code().map_or_else(
            || "terminated by signal".to_owned(),
            |code| format!("exited with code {code}"),
        )
    }
}
