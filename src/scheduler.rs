//! Time gate deciding whether a new coordination cycle may begin.
//!
//! The gate starts unset, and an unset gate always proceeds, so the first
//! cycle after construction runs without special-casing by the caller.
//! Afterwards the model's reply reseeds the gate, and cycles are refused
//! until local wall-clock time reaches it.

use tracing::debug;

use crate::protocol::GateTime;

/// Holds the earliest time at which the next cycle may start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateScheduler {
    gate: Option<GateTime>,
}

impl UpdateScheduler {
    /// A scheduler with no gate set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a cycle may begin at `now`.
    ///
    /// True when no gate is set or `now` has reached the gate.
    #[must_use]
    pub fn should_proceed(&self, now: GateTime) -> bool {
        self.gate.is_none_or(|gate| now >= gate)
    }

    /// Overwrite the gate unconditionally.
    ///
    /// A gate at or before the current time allows the next cycle at once.
    pub fn set_gate_time(&mut self, gate: GateTime) {
        if let Some(previous) = self.gate {
            if gate < previous {
                debug!(%previous, %gate, "gate moved backwards");
            }
        }
        self.gate = Some(gate);
    }

    /// The stored gate, if any cycle has completed.
    #[must_use]
    pub fn gate_time(&self) -> Option<GateTime> {
        self.gate
    }
}
