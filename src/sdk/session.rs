//! Client request state
//!
//! Explicit request-state machine in place of an ambient "has run" flag.
//! The guard admits one request at a time per client instance when in-flight
//! deduplication is enabled.

use parking_lot::Mutex;

/// Lifecycle of the client's current analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InFlight,
    Done,
    Failed,
}

/// Per-client session tracker
#[derive(Debug)]
pub struct AnalysisSession {
    state: Mutex<SessionState>,
    dedupe_in_flight: bool,
}

impl AnalysisSession {
    pub fn new(dedupe_in_flight: bool) -> Self {
        Self {
            state: Mutex::new(SessionState::Idle),
            dedupe_in_flight,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    /// Try to enter `InFlight`. Returns false when another request is in
    /// flight and deduplication is enabled.
    pub fn begin(&self) -> bool {
        let mut state = self.state.lock();
        if self.dedupe_in_flight && *state == SessionState::InFlight {
            return false;
        }
        *state = SessionState::InFlight;
        true
    }

    /// Leave `InFlight` with the given terminal state
    pub fn finish(&self, state: SessionState) {
        *self.state.lock() = state;
    }
}
