//! Stage controller facade
//!
//! [`StageController`] owns one connection lifetime at a time and exposes
//! the operations a front end needs: connect, home, move, move to tag,
//! stop, disconnect. All methods take `&self`; the controller is meant to
//! be shared behind an `Arc` so that [`StageController::stop_all`] can be
//! called from one thread while another is inside a confirmed move.
//!
//! At most one request that talks to the firmware runs at a time. A second
//! one fails fast with [`MotionError::Busy`] instead of interleaving frames.
//! `stop_all` and `resume` are real-time bytes and never wait for it.

use crate::axis::AxisState;
use crate::config::ControllerConfig;
use crate::homing::HomingMachine;
use crate::link::CommandLink;
use crate::sequencer::{MotionSequencer, MoveReport};
use crate::state::StateCell;
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use stagekit_communication::{
    GrblCommand, PortOpener, RealtimeCommand, SerialPortOpener, Transport,
};
use stagekit_core::{
    Axis, AxisLimits, Clock, ConnectionError, Error, MachineState, MotionError, PartialPosition,
    Position, Result, SystemClock,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a `go_home` call did
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HomeOutcome {
    /// Full `$H` / `$X` / `G92` sequence; position is the origin
    Homed,
    /// Already homed on this connection; moved back to the stored origin
    /// without re-checking the limit switches
    ReturnedToOrigin(MoveReport),
}

/// Thread-safe controller for one motion stage
pub struct StageController {
    config: ControllerConfig,
    opener: Arc<dyn PortOpener>,
    clock: Arc<dyn Clock>,
    link: RwLock<Option<Arc<CommandLink>>>,
    state: StateCell,
    axis: Mutex<AxisState>,
    homing: Mutex<HomingMachine>,
    in_flight: Mutex<()>,
    halted: AtomicBool,
}

impl StageController {
    /// Create a disconnected controller
    pub fn new(config: ControllerConfig, opener: Arc<dyn PortOpener>, clock: Arc<dyn Clock>) -> Self {
        let axis = AxisState::new(config.limits);
        let homing = HomingMachine::new(config.homing_settle);
        Self {
            config,
            opener,
            clock,
            link: RwLock::new(None),
            state: StateCell::new(),
            axis: Mutex::new(axis),
            homing: Mutex::new(homing),
            in_flight: Mutex::new(()),
            halted: AtomicBool::new(false),
        }
    }

    /// Controller on real serial ports and wall-clock time
    pub fn with_serial(config: ControllerConfig) -> Self {
        Self::new(
            config,
            Arc::new(SerialPortOpener::default()),
            Arc::new(SystemClock),
        )
    }

    /// Configuration in use
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Travel limits
    pub fn limits(&self) -> AxisLimits {
        self.config.limits
    }

    /// Current machine state
    pub fn state(&self) -> MachineState {
        self.state.get()
    }

    /// Last confirmed position
    pub fn position(&self) -> Position {
        self.axis.lock().position()
    }

    /// Last target accepted by the firmware
    pub fn commanded(&self) -> Position {
        self.axis.lock().commanded()
    }

    /// True once homing completed on the current connection
    pub fn home_executed(&self) -> bool {
        self.state.get().is_connected() && self.homing.lock().home_executed()
    }

    /// True between `stop_all` and `resume`
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Name of the open port, if any
    pub fn port_name(&self) -> Option<String> {
        self.link
            .read()
            .as_ref()
            .map(|link| link.transport().port_name().to_string())
    }

    fn link(&self) -> Result<Arc<CommandLink>> {
        self.link
            .read()
            .clone()
            .ok_or_else(|| ConnectionError::NotConnected.into())
    }

    fn sequencer<'a>(&'a self, link: &'a CommandLink) -> MotionSequencer<'a> {
        MotionSequencer::new(
            link,
            &self.axis,
            &self.state,
            self.clock.as_ref(),
            &self.config.poll,
            &self.halted,
        )
    }

    /// Claim the link for one request. Fails fast when another request is
    /// in flight or the state does not accept commands.
    fn begin(&self, operation: &str) -> Result<(MutexGuard<'_, ()>, Arc<CommandLink>)> {
        let guard = self.in_flight.try_lock().ok_or(MotionError::Busy)?;
        let state = self.state.get();
        if state.is_moving() {
            return Err(MotionError::Busy.into());
        }
        if !state.accepts_motion() {
            return Err(MotionError::InvalidState {
                state,
                operation: operation.to_string(),
            }
            .into());
        }
        let link = self.link()?;
        Ok((guard, link))
    }

    /// Map the outcome of a request onto the machine state.
    ///
    /// Serial faults, unconfirmed arrivals and protocol errors that
    /// survived their retries leave the controller in `Error`. A rejected
    /// frame or a feed hold leaves it `Idle`.
    fn finish<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_)
            | Err(Error::Motion(
                MotionError::Rejected { .. }
                | MotionError::Halted { .. }
                | MotionError::InvalidState { .. }
                | MotionError::OutOfTravel { .. },
            )) => {
                if let Err(e) = self.state.transition(MachineState::Idle) {
                    warn!(operation, "Could not return to Idle: {}", e);
                }
            }
            Err(Error::Motion(MotionError::Busy | MotionError::InvalidTarget { .. })) => {}
            Err(e) => {
                error!(operation, "{}", e);
                self.state.fault();
            }
        }
        result
    }

    /// Connect using the configured candidate ports and baud rate
    pub fn connect(&self) -> Result<()> {
        let ports = self.config.ports.clone();
        self.connect_to(&ports, self.config.baud_rate)
    }

    /// Open the first candidate port that accepts a connection, run the
    /// reset handshake and apply the parameter table.
    ///
    /// Starts a fresh connection lifetime: homing has to run again.
    pub fn connect_to(&self, ports: &[String], baud_rate: u32) -> Result<()> {
        let _guard = self.in_flight.try_lock().ok_or(MotionError::Busy)?;
        let current = self.state.get();
        if current.is_connected() && current != MachineState::Error {
            return Err(MotionError::InvalidState {
                state: current,
                operation: "connect".to_string(),
            }
            .into());
        }
        self.drop_link();

        self.state.transition(MachineState::Connecting)?;
        info!(ports = ?ports, baud_rate, "Connecting");
        let transport = match Transport::connect(
            ports,
            baud_rate,
            self.opener.as_ref(),
            self.config.transport,
            self.clock.as_ref(),
        ) {
            Ok(transport) => transport,
            Err(e) => {
                error!("Connect failed: {}", e);
                self.state.reset();
                return Err(e.into());
            }
        };

        self.state.transition(MachineState::Initializing)?;
        let link = Arc::new(CommandLink::new(
            Arc::new(transport),
            self.config.poll.protocol_retries,
        ));
        *self.axis.lock() = AxisState::new(self.config.limits);
        self.homing.lock().reset();
        self.halted.store(false, Ordering::SeqCst);

        if let Err(e) = self.apply_parameters(&link) {
            error!("Initialization failed: {}", e);
            link.transport().disconnect();
            self.state.fault();
            return Err(e);
        }

        info!(port = %link.transport().port_name(), "Controller ready");
        *self.link.write() = Some(link);
        self.state.transition(MachineState::Idle)?;
        Ok(())
    }

    fn apply_parameters(&self, link: &CommandLink) -> Result<()> {
        info!(count = self.config.parameters.len(), "Applying firmware parameters");
        for parameter in &self.config.parameters {
            match link.execute(&parameter.to_command()) {
                Ok(()) => {}
                Err(Error::Motion(MotionError::Rejected { code, message, .. })) => {
                    warn!(id = parameter.id, code, "Parameter rejected: {}", message);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn drop_link(&self) {
        if let Some(link) = self.link.write().take() {
            link.transport().disconnect();
        }
    }

    /// Close the link. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        self.drop_link();
        if self.state.get() != MachineState::Disconnected {
            info!("Controller disconnected");
        }
        self.state.reset();
    }

    /// Start a fresh connection lifetime on the configured ports
    pub fn reconnect(&self) -> Result<()> {
        info!("Reconnecting");
        self.disconnect();
        self.connect()
    }

    /// Home the stage.
    ///
    /// The first call on a connection runs the firmware homing cycle and
    /// zeroes the position. Later calls only move back to the stored
    /// origin in the configured order; the limit switches are not
    /// consulted again, so a stage moved by hand stays out of calibration
    /// until the next reconnect.
    pub fn go_home(&self) -> Result<HomeOutcome> {
        let (_guard, link) = self.begin("home")?;
        if self.is_halted() {
            return Err(MotionError::Halted {
                phase: "home".to_string(),
            }
            .into());
        }

        let executed = self.homing.lock().home_executed();
        if executed {
            info!(order = ?self.config.origin_return, "Already homed, returning to origin");
            let result = self
                .sequencer(&link)
                .return_to_origin(self.config.origin_return);
            return self.finish("home", result).map(HomeOutcome::ReturnedToOrigin);
        }

        self.state.transition(MachineState::Homing)?;
        let result = self
            .homing
            .lock()
            .run(&link, &self.axis, self.clock.as_ref());
        self.finish("home", result).map(|()| HomeOutcome::Homed)
    }

    /// Absolute move over the given axes; waits for `ok`, does not poll
    pub fn move_to(&self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Result<MoveReport> {
        let target = PartialPosition::new(x, y, z);
        check_finite(&target)?;
        let (_guard, link) = self.begin("move")?;
        let result = self.sequencer(&link).dispatch(target);
        self.finish("move", result)
    }

    /// Confirmed two-phase move to a tag location, XY before Z
    pub fn move_to_tag(&self, location: (f64, f64, f64)) -> Result<MoveReport> {
        let target = Position::from(location);
        check_finite(&PartialPosition::from(target))?;
        let (_guard, link) = self.begin("move to tag")?;
        let result = self.sequencer(&link).move_to_tag(target);
        self.finish("move to tag", result)
    }

    /// Move one axis by `delta` from the last commanded position
    pub fn jog(&self, axis: Axis, delta: f64) -> Result<MoveReport> {
        if !delta.is_finite() {
            return Err(MotionError::InvalidTarget { axis, value: delta }.into());
        }
        let (_guard, link) = self.begin("jog")?;
        let mut target = PartialPosition::default();
        target.set(axis, Some(self.commanded().get(axis) + delta));
        let result = self.sequencer(&link).dispatch(target);
        self.finish("jog", result)
    }

    /// Feed hold. Sent out of band; a running confirmed move stops before
    /// its next status poll and no further frames are sent until
    /// [`StageController::resume`].
    pub fn stop_all(&self) -> Result<()> {
        let link = self.link()?;
        self.halted.store(true, Ordering::SeqCst);
        warn!("Feed hold");
        link.realtime(RealtimeCommand::FeedHold)
            .inspect_err(|_| self.state.fault())
    }

    /// Cycle start after a feed hold
    pub fn resume(&self) -> Result<()> {
        let link = self.link()?;
        link.realtime(RealtimeCommand::CycleStart)
            .inspect_err(|_| self.state.fault())?;
        self.halted.store(false, Ordering::SeqCst);
        info!("Resumed");
        Ok(())
    }

    /// De-energize the steppers (`M84`)
    pub fn disable_motors(&self) -> Result<()> {
        let (_guard, link) = self.begin("disable motors")?;
        let result = link.execute(&GrblCommand::DisableMotors);
        self.finish("disable motors", result)
    }

    /// Take the firmware's reported position as authoritative
    pub fn refresh_position(&self) -> Result<Position> {
        let (_guard, link) = self.begin("refresh position")?;
        self.state.transition(MachineState::PollingStatus)?;
        let result = self.sequencer(&link).refresh();
        self.finish("refresh position", result)
    }
}

impl std::fmt::Debug for StageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageController")
            .field("state", &self.state.get())
            .field("port", &self.port_name())
            .field("halted", &self.is_halted())
            .finish()
    }
}

fn check_finite(target: &PartialPosition) -> std::result::Result<(), MotionError> {
    for axis in target.axes() {
        if let Some(value) = target.get(axis) {
            if !value.is_finite() {
                return Err(MotionError::InvalidTarget { axis, value });
            }
        }
    }
    Ok(())
}
