//! # StageKit Core
//!
//! Core types shared by every StageKit crate: stage positions and travel
//! limits, the controller state machine, the error taxonomy, and the
//! injectable clock used for settle intervals and status polling.

pub mod clock;
pub mod data;
pub mod error;

pub use clock::{Clock, ManualClock, SystemClock};

pub use data::{
    Axis, AxisBounds, AxisLimits, MachineState, MoveOrder, PartialPosition, Position,
};

pub use error::{
    BoundsClampedWarning, ConnectionError, Error, MotionError, ProtocolError, Result,
};
