//! # StageKit Motion
//!
//! Axis bounds, homing and move sequencing on top of the serial transport.
//!
//! - [`axis`]: authoritative position, commanded target, saturating clamp
//! - [`homing`]: the once-per-connection `$H` / `$X` / `G92` sequence
//! - [`sequencer`]: confirmed phased moves with bounded status polling
//! - [`controller`]: the thread-safe [`StageController`] facade

pub mod axis;
pub mod config;
pub mod controller;
pub mod homing;
pub mod link;
pub mod sequencer;
pub mod state;

pub use axis::{AxisState, Clamped};
pub use config::{ControllerConfig, PollPolicy};
pub use controller::{HomeOutcome, StageController};
pub use homing::{HomingMachine, HomingPhase};
pub use link::CommandLink;
pub use sequencer::{MotionSequencer, MovePhase, MoveReport};
pub use state::StateCell;
