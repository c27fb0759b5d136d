//! Move sequencing and arrival confirmation
//!
//! A compound move is split into phases. Each phase sends one rapid move
//! frame, waits for `ok`, then polls `?` on the injected clock until the
//! reported machine position is within tolerance on the phase's axes. The
//! next phase's frame is only sent after the previous phase is confirmed.
//!
//! Plain moves and jogs are fire-and-continue: one frame, one `ok`, no
//! polling, and only the commanded target is updated.

use crate::axis::AxisState;
use crate::config::PollPolicy;
use crate::link::CommandLink;
use crate::state::StateCell;
use parking_lot::Mutex;
use serde::Serialize;
use stagekit_communication::firmware::grbl::rapid_move;
use stagekit_communication::GrblCommand;
use stagekit_core::{
    Axis, BoundsClampedWarning, Clock, MachineState, MotionError, MoveOrder, PartialPosition,
    Position, Result,
};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// One confirmed leg of a compound move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MovePhase {
    /// Lateral travel
    Xy,
    /// Vertical travel
    Z,
}

impl MovePhase {
    /// Axes this phase moves and confirms
    pub fn axes(&self) -> &'static [Axis] {
        match self {
            MovePhase::Xy => &[Axis::X, Axis::Y],
            MovePhase::Z => &[Axis::Z],
        }
    }

    /// Part of `target` sent in this phase's frame
    pub fn select(&self, target: Position) -> PartialPosition {
        match self {
            MovePhase::Xy => PartialPosition::xy(target),
            MovePhase::Z => PartialPosition::z_only(target),
        }
    }

    /// Phases in execution order
    pub fn ordered(order: MoveOrder) -> [MovePhase; 2] {
        match order {
            MoveOrder::XyFirst => [MovePhase::Xy, MovePhase::Z],
            MoveOrder::ZFirst => [MovePhase::Z, MovePhase::Xy],
        }
    }
}

impl fmt::Display for MovePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovePhase::Xy => write!(f, "xy"),
            MovePhase::Z => write!(f, "z"),
        }
    }
}

/// Result of a move request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    /// Target after clamping, with unspecified axes filled in
    pub target: Position,
    /// Phases whose arrival was confirmed, in order
    pub confirmed: Vec<MovePhase>,
    /// Axes that were saturated into their bounds
    pub warnings: Vec<BoundsClampedWarning>,
}

impl MoveReport {
    /// True when the stage was seen at the target
    pub fn is_confirmed(&self) -> bool {
        !self.confirmed.is_empty()
    }

    /// True when any axis had to be clamped
    pub fn was_clamped(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Borrowed view of everything one move needs
pub struct MotionSequencer<'a> {
    link: &'a CommandLink,
    axis: &'a Mutex<AxisState>,
    state: &'a StateCell,
    clock: &'a dyn Clock,
    policy: &'a PollPolicy,
    halted: &'a AtomicBool,
}

impl<'a> MotionSequencer<'a> {
    /// Assemble a sequencer for one request
    pub fn new(
        link: &'a CommandLink,
        axis: &'a Mutex<AxisState>,
        state: &'a StateCell,
        clock: &'a dyn Clock,
        policy: &'a PollPolicy,
        halted: &'a AtomicBool,
    ) -> Self {
        Self {
            link,
            axis,
            state,
            clock,
            policy,
            halted,
        }
    }

    fn check_halt(&self, phase: &str) -> std::result::Result<(), MotionError> {
        if self.halted.load(Ordering::SeqCst) {
            info!(phase, "Feed hold active, not continuing");
            return Err(MotionError::Halted {
                phase: phase.to_string(),
            });
        }
        Ok(())
    }

    /// Send one combined frame for the axes in `target` without polling
    pub fn dispatch(&self, target: PartialPosition) -> Result<MoveReport> {
        self.check_halt("dispatch")?;
        let clamped = self.axis.lock().clamp_partial(target);

        let command = match rapid_move(clamped.value) {
            Some(command) => command,
            None => {
                debug!("Empty move request, nothing sent");
                return Ok(MoveReport {
                    target: self.axis.lock().commanded(),
                    confirmed: Vec::new(),
                    warnings: clamped.warnings,
                });
            }
        };

        self.state.transition(MachineState::Moving)?;
        self.link.execute(&command)?;

        let mut axis = self.axis.lock();
        axis.record_commanded(clamped.value);
        Ok(MoveReport {
            target: axis.commanded(),
            confirmed: Vec::new(),
            warnings: clamped.warnings,
        })
    }

    /// Move to `target` in confirmed phases, in the given order.
    ///
    /// The second phase's frame is never sent unless the first was
    /// confirmed.
    pub fn run_phases(&self, target: Position, order: MoveOrder) -> Result<MoveReport> {
        let clamped = self.axis.lock().clamp(target);
        let mut report = MoveReport {
            target: clamped.value,
            confirmed: Vec::new(),
            warnings: clamped.warnings,
        };

        for phase in MovePhase::ordered(order) {
            self.confirm_phase(phase, clamped.value)?;
            report.confirmed.push(phase);
        }

        info!(target = %report.target, "Move confirmed");
        Ok(report)
    }

    /// Collision-avoiding move to a tag: XY first, then Z
    pub fn move_to_tag(&self, target: Position) -> Result<MoveReport> {
        self.run_phases(target, MoveOrder::XyFirst)
    }

    /// Direct move back to the stored origin
    pub fn return_to_origin(&self, order: MoveOrder) -> Result<MoveReport> {
        self.run_phases(Position::ORIGIN, order)
    }

    fn confirm_phase(&self, phase: MovePhase, target: Position) -> Result<()> {
        let name = phase.to_string();
        self.check_halt(&name)?;
        self.state.transition(MachineState::Moving)?;

        let leg = phase.select(target);
        info!(phase = %phase, target = %target, "Starting move phase");
        self.link.execute(&GrblCommand::RapidMove(leg))?;
        self.axis.lock().record_commanded(leg);

        self.wait_for_arrival(phase, target)
    }

    /// Poll status until the phase's axes are within tolerance of `target`
    pub fn wait_for_arrival(&self, phase: MovePhase, target: Position) -> Result<()> {
        let name = phase.to_string();
        for poll in 1..=self.policy.max_polls {
            self.check_halt(&name)?;
            self.clock.sleep(self.policy.interval);
            self.check_halt(&name)?;

            self.state.transition(MachineState::PollingStatus)?;
            let report = self.link.query_status()?;
            let current = report.machine_position;
            debug!(phase = %phase, poll, state = %report.raw_state, position = %current, "Status");

            if current.within(&target, phase.axes(), self.policy.tolerance) {
                self.axis.lock().apply_axes(target, phase.axes());
                info!(phase = %phase, polls = poll, position = %current, "Arrival confirmed");
                return Ok(());
            }
            if report.is_held() {
                warn!(phase = %phase, poll, "Firmware in feed hold");
            } else if report.is_idle() {
                debug!(phase = %phase, poll, "Idle short of target");
            }
        }

        error!(phase = %phase, polls = self.policy.max_polls, target = %target, "Arrival not confirmed");
        Err(MotionError::Timeout {
            phase: name,
            polls: self.policy.max_polls,
            target,
        }
        .into())
    }

    /// Read one status report and take its position as authoritative.
    ///
    /// A report outside the travel limits is refused and the stored
    /// position is left as it was.
    pub fn refresh(&self) -> Result<Position> {
        let report = self.link.query_status()?;
        let reported = report.machine_position;
        let mut axis = self.axis.lock();
        if !axis.limits().contains(&reported) {
            warn!(position = %reported, "Reported position outside travel");
            return Err(MotionError::OutOfTravel { reported }.into());
        }
        axis.apply(reported);
        Ok(reported)
    }
}
