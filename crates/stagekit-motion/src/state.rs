//! Shared machine state cell
//!
//! Readable from any thread while a move is running; transitions are
//! checked against [`MachineState::can_transition_to`].

use parking_lot::RwLock;
use stagekit_core::{MachineState, MotionError};
use tracing::{debug, warn};

/// Thread-safe holder of the current [`MachineState`]
#[derive(Debug)]
pub struct StateCell {
    state: RwLock<MachineState>,
}

impl StateCell {
    /// Create a cell in `Disconnected`
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MachineState::Disconnected),
        }
    }

    /// Current state
    pub fn get(&self) -> MachineState {
        *self.state.read()
    }

    /// Move to `next` if the transition table allows it
    pub fn transition(&self, next: MachineState) -> Result<(), MotionError> {
        let mut state = self.state.write();
        if !state.can_transition_to(next) {
            warn!(from = %*state, to = %next, "Rejected state transition");
            return Err(MotionError::InvalidState {
                state: *state,
                operation: format!("enter {}", next),
            });
        }
        if *state != next {
            debug!(from = %*state, to = %next, "State transition");
            *state = next;
        }
        Ok(())
    }

    /// Enter `Error` (allowed from every state)
    pub fn fault(&self) {
        let mut state = self.state.write();
        if *state != MachineState::Error {
            warn!(from = %*state, "Controller fault");
            *state = MachineState::Error;
        }
    }

    /// Drop to `Disconnected` (allowed from every state)
    pub fn reset(&self) {
        *self.state.write() = MachineState::Disconnected;
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
