//! Coordination session: the agent's single entry point to the model.
//!
//! A [`Coordinator`] is constructed once by the caller and passed by
//! reference. [`Coordinator::get_or_create_session`] launches the model on
//! first use and keeps returning the same [`CoordinationSession`] until it
//! is stopped. Each session exposes the gate check, the per-cycle update,
//! and stop.
//!
//! Exchange failures never leave a session: they are logged and turned
//! into a [`CycleOutcome::Degraded`] with the gate untouched. Lifecycle
//! misuse is returned as an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, MutexGuard, PoisonError};

use tokio::sync::Mutex;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::channel::{ChannelServer, ChannelSettings};
use crate::config::GlobalConfig;
use crate::protocol::decoder::{self, DecodedResponse};
use crate::protocol::{DirectiveQueue, GateTime};
use crate::scheduler::UpdateScheduler;
use crate::supervisor::{ModelHealth, ProcessSupervisor};
use crate::{AppError, Result};

/// Result of one coordination cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The model replied with a valid record.
    Completed {
        /// New gate time, already stored in the scheduler.
        gate: GateTime,
        /// Directives in the order the model sent them.
        directives: DirectiveQueue,
    },
    /// The exchange failed; the agent acts without new guidance this cycle.
    Degraded {
        /// Why the cycle produced nothing.
        reason: AppError,
    },
}

impl CycleOutcome {
    /// Whether the cycle completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// The cycle's directives; empty when degraded.
    #[must_use]
    pub fn into_directives(self) -> DirectiveQueue {
        match self {
            Self::Completed { directives, .. } => directives,
            Self::Degraded { .. } => DirectiveQueue::empty(),
        }
    }
}

/// One running model plus the gate and channel used to consult it.
#[derive(Debug)]
pub struct CoordinationSession {
    id: Uuid,
    config: Arc<GlobalConfig>,
    // Held for the whole cycle so only one endpoint is bound at a time.
    channel: Mutex<ChannelServer>,
    scheduler: std::sync::Mutex<UpdateScheduler>,
    supervisor: Mutex<ProcessSupervisor>,
    stopped: AtomicBool,
}

impl CoordinationSession {
    /// Launch the model and build a session around it.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ProcessLaunch` if the model cannot be started.
    pub fn launch(config: Arc<GlobalConfig>) -> Result<Self> {
        let mut supervisor = ProcessSupervisor::new(config.model.clone());
        supervisor.start()?;

        let id = Uuid::new_v4();
        info!(session_id = %id, channel = %config.channel.name, "coordination session created");

        Ok(Self {
            id,
            channel: Mutex::new(ChannelServer::new(ChannelSettings::from_config(&config))),
            scheduler: std::sync::Mutex::new(UpdateScheduler::new()),
            supervisor: Mutex::new(supervisor),
            stopped: AtomicBool::new(false),
            config,
        })
    }

    /// Session identity.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether [`stop`](Self::stop) has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Whether a new cycle may begin now.
    #[must_use]
    pub fn should_proceed(&self) -> bool {
        self.should_proceed_at(GateTime::now())
    }

    /// Whether a new cycle may begin at `now`.
    #[must_use]
    pub fn should_proceed_at(&self, now: GateTime) -> bool {
        self.scheduler().should_proceed(now)
    }

    /// Gate set by the last completed cycle.
    #[must_use]
    pub fn gate_time(&self) -> Option<GateTime> {
        self.scheduler().gate_time()
    }

    /// Send `observation` to the model and return its directives.
    ///
    /// Never fails: a failed cycle yields an empty queue.
    pub async fn update(&self, observation: &str) -> DirectiveQueue {
        self.cycle(observation).await.into_directives()
    }

    /// Run one cycle and report how it went.
    pub async fn cycle(&self, observation: &str) -> CycleOutcome {
        let span = info_span!("coordination_cycle", session_id = %self.id);
        async move {
            let channel = self.channel.lock().await;
            if self.is_stopped() {
                let reason = AppError::InvalidState("session is stopped".into());
                warn!(%reason, "cycle refused");
                return CycleOutcome::Degraded { reason };
            }

            let decoded = channel
                .exchange(observation)
                .await
                .and_then(|raw| decoder::decode(&raw));

            match decoded {
                Ok(DecodedResponse { gate, directives }) => {
                    self.scheduler().set_gate_time(gate);
                    info!(%gate, directives = directives.len(), "cycle completed");
                    CycleOutcome::Completed { gate, directives }
                }
                Err(reason) => {
                    warn!(%reason, "cycle degraded, no directives this cycle");
                    CycleOutcome::Degraded { reason }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Poll the model process.
    pub async fn model_health(&self) -> ModelHealth {
        self.supervisor.lock().await.health()
    }

    /// Wait for the model to exit and retire this session.
    ///
    /// Waits for any in-flight cycle first. The session counts as stopped
    /// from the start of the call.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidState` if the session was already stopped,
    /// or `AppError::Io` if waiting on the model fails.
    pub async fn stop(&self) -> Result<String> {
        let _cycle = self.channel.lock().await;
        // Flag only while holding the supervisor so `wait_stopped` cannot slip in
        // between the flag and the model's exit.
        let mut supervisor = self.supervisor.lock().await;
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Err(AppError::InvalidState(format!(
                "session {} already stopped",
                self.id
            )));
        }

        info!(session_id = %self.id, "stopping coordination session");
        supervisor.stop(self.config.shutdown_grace()).await
    }

    /// Wait until a stop in progress has finished with the model process.
    ///
    /// Returns at once if the session is running or fully stopped.
    pub async fn wait_stopped(&self) {
        drop(self.supervisor.lock().await);
    }

    fn scheduler(&self) -> MutexGuard<'_, UpdateScheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Explicitly constructed owner of at most one live session.
#[derive(Debug)]
pub struct Coordinator {
    config: Arc<GlobalConfig>,
    current: Mutex<Option<Arc<CoordinationSession>>>,
}

impl Coordinator {
    /// Create a coordinator. No model is launched until the first session request.
    #[must_use]
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            config: Arc::new(config),
            current: Mutex::new(None),
        }
    }

    /// Configuration shared by every session.
    #[must_use]
    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Return the live session, launching the model if there is none.
    ///
    /// Every call returns the same session until it is stopped. If that
    /// session is still stopping, this waits for its model to exit before
    /// launching a new one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ProcessLaunch` if a new model cannot be started.
    pub async fn get_or_create_session(&self) -> Result<Arc<CoordinationSession>> {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            if !session.is_stopped() {
                return Ok(Arc::clone(session));
            }
            // Never run two models on one channel.
            session.wait_stopped().await;
        }

        let session = Arc::new(CoordinationSession::launch(Arc::clone(&self.config))?);
        *current = Some(Arc::clone(&session));
        Ok(session)
    }

    /// The live session, if one exists and has not been stopped.
    pub async fn current_session(&self) -> Option<Arc<CoordinationSession>> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|s| !s.is_stopped())
            .map(Arc::clone)
    }
}
