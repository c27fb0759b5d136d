//! One-time homing sequence
//!
//! `Idle -> Homing -> Unlocking -> Zeroed -> Idle`
//!
//! The firmware gives no confirmable end-of-travel report for `$H`, so the
//! homing phase is a fixed settle interval on the injected clock. Input
//! that arrived meanwhile (the `$H` acknowledgement, alarm chatter) is
//! dropped before `$X` goes out.

use crate::axis::AxisState;
use crate::link::CommandLink;
use parking_lot::Mutex;
use serde::Serialize;
use stagekit_communication::GrblCommand;
use stagekit_core::{Clock, Result};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Step of the homing sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HomingPhase {
    /// Not homing
    Idle,
    /// `$H` sent, waiting out the settle interval
    Homing,
    /// `$X` sent to clear the post-home lock
    Unlocking,
    /// `G92 X0 Y0 Z0` accepted, position is the origin
    Zeroed,
}

impl fmt::Display for HomingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Homing => write!(f, "Homing"),
            Self::Unlocking => write!(f, "Unlocking"),
            Self::Zeroed => write!(f, "Zeroed"),
        }
    }
}

/// Homing sequence with its once-per-connection flag
#[derive(Debug, Clone)]
pub struct HomingMachine {
    phase: HomingPhase,
    home_executed: bool,
    settle: Duration,
}

impl HomingMachine {
    /// Create a machine that has not homed yet
    pub fn new(settle: Duration) -> Self {
        Self {
            phase: HomingPhase::Idle,
            home_executed: false,
            settle,
        }
    }

    /// Current step
    pub fn phase(&self) -> HomingPhase {
        self.phase
    }

    /// True once a full sequence has completed on this connection
    pub fn home_executed(&self) -> bool {
        self.home_executed
    }

    /// Forget the previous homing; called on every new connection
    pub fn reset(&mut self) {
        self.phase = HomingPhase::Idle;
        self.home_executed = false;
    }

    fn enter(&mut self, phase: HomingPhase) {
        info!(from = %self.phase, to = %phase, "Homing phase");
        self.phase = phase;
    }

    /// Run the full sequence and zero `axis`.
    ///
    /// On failure the machine returns to `Idle` with `home_executed`
    /// unchanged and the position untouched.
    pub fn run(
        &mut self,
        link: &CommandLink,
        axis: &Mutex<AxisState>,
        clock: &dyn Clock,
    ) -> Result<()> {
        let result = self.sequence(link, axis, clock);
        if let Err(e) = &result {
            warn!(phase = %self.phase, "Homing aborted: {}", e);
            self.phase = HomingPhase::Idle;
        }
        result
    }

    fn sequence(
        &mut self,
        link: &CommandLink,
        axis: &Mutex<AxisState>,
        clock: &dyn Clock,
    ) -> Result<()> {
        self.enter(HomingPhase::Homing);
        link.send_unacknowledged(&GrblCommand::Home)?;
        clock.sleep(self.settle);
        link.transport().discard_input()?;

        self.enter(HomingPhase::Unlocking);
        link.execute(&GrblCommand::Unlock)?;

        link.execute(&GrblCommand::ZeroOrigin)?;
        self.enter(HomingPhase::Zeroed);
        axis.lock().zero();

        self.home_executed = true;
        self.enter(HomingPhase::Idle);
        Ok(())
    }
}
