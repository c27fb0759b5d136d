//! Data models for stage positions, travel limits, and machine state
//!
//! This module provides:
//! - Three-axis position in the absolute machine frame (millimeters)
//! - Per-axis travel limits with saturating clamp
//! - The controller's connection/motion state machine
//! - Move ordering used when a compound move is split into phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage axis identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Lateral X axis
    X,
    /// Lateral Y axis
    Y,
    /// Vertical Z axis (home at 0, travel extends negative)
    Z,
}

impl Axis {
    /// All axes in frame order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// G-code word letter for this axis
    pub fn letter(&self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Absolute stage position in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Machine origin
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Read a single axis
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Write a single axis
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// True when every listed axis of `self` is strictly within `tolerance` of `other`
    pub fn within(&self, other: &Position, axes: &[Axis], tolerance: f64) -> bool {
        axes.iter()
            .all(|axis| (self.get(*axis) - other.get(*axis)).abs() < tolerance)
    }
}

impl From<(f64, f64, f64)> for Position {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

/// Partial target: only axes carrying a value take part in a move
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis target, if any
    pub x: Option<f64>,
    /// Y-axis target, if any
    pub y: Option<f64>,
    /// Z-axis target, if any
    pub z: Option<f64>,
}

impl PartialPosition {
    /// Create a partial position
    pub fn new(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        Self { x, y, z }
    }

    /// Only the X and Y components of `pos`
    pub fn xy(pos: Position) -> Self {
        Self::new(Some(pos.x), Some(pos.y), None)
    }

    /// Only the Z component of `pos`
    pub fn z_only(pos: Position) -> Self {
        Self::new(None, None, Some(pos.z))
    }

    /// Read a single axis
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Write a single axis
    pub fn set(&mut self, axis: Axis, value: Option<f64>) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }

    /// Axes that carry a value, in frame order
    pub fn axes(&self) -> Vec<Axis> {
        Axis::ALL
            .into_iter()
            .filter(|axis| self.get(*axis).is_some())
            .collect()
    }

    /// True when no axis carries a value
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// Fill missing axes from `base`
    pub fn resolve(&self, base: Position) -> Position {
        Position {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            z: self.z.unwrap_or(base.z),
        }
    }
}

impl From<Position> for PartialPosition {
    fn from(pos: Position) -> Self {
        Self::new(Some(pos.x), Some(pos.y), Some(pos.z))
    }
}

/// Travel range of one axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    /// Lowest reachable coordinate
    pub min: f64,
    /// Highest reachable coordinate
    pub max: f64,
}

impl AxisBounds {
    /// Create bounds; callers validate `min <= max`
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Saturate `value` into `[min, max]`
    pub fn clamp(&self, value: f64) -> f64 {
        if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// True when `value` lies in `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// True when the range is well formed
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Travel limits for all three axes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    /// X travel
    pub x: AxisBounds,
    /// Y travel
    pub y: AxisBounds,
    /// Z travel; inverted axis, home at the top
    pub z: AxisBounds,
}

impl AxisLimits {
    /// Bounds of a single axis
    pub fn get(&self, axis: Axis) -> AxisBounds {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// True when `pos` lies within every axis range
    pub fn contains(&self, pos: &Position) -> bool {
        Axis::ALL
            .iter()
            .all(|axis| self.get(*axis).contains(pos.get(*axis)))
    }
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self {
            x: AxisBounds::new(0.0, 200.0),
            y: AxisBounds::new(0.0, 200.0),
            z: AxisBounds::new(-85.0, 0.0),
        }
    }
}

/// Order in which a compound move is split into confirmed phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrder {
    /// Lateral travel first, then Z
    XyFirst,
    /// Z first (retract), then lateral travel
    #[default]
    ZFirst,
}

/// Controller lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineState {
    /// No serial link
    Disconnected,
    /// Trying candidate ports
    Connecting,
    /// Port open, reset handshake and parameter table in progress
    Initializing,
    /// Connected and ready for commands
    Idle,
    /// Homing sequence in progress
    Homing,
    /// A motion frame is in flight
    Moving,
    /// Waiting on a status report to confirm arrival
    PollingStatus,
    /// Fault; only an explicit reconnect leaves this state
    Error,
}

impl MachineState {
    /// Check if this state has an open link
    pub fn is_connected(&self) -> bool {
        !matches!(
            self,
            MachineState::Disconnected | MachineState::Connecting
        )
    }

    /// Check if motion commands may be issued
    pub fn accepts_motion(&self) -> bool {
        matches!(self, MachineState::Idle)
    }

    /// Check if this state indicates active motion
    pub fn is_moving(&self) -> bool {
        matches!(
            self,
            MachineState::Moving | MachineState::PollingStatus | MachineState::Homing
        )
    }

    /// Check if a transition from this state to `target` is valid.
    ///
    /// - Disconnected only goes to Connecting
    /// - Error only leaves through Disconnected or Connecting (reconnect)
    /// - Any state can drop to Disconnected or fault to Error
    pub fn can_transition_to(&self, target: MachineState) -> bool {
        use MachineState::*;
        if *self == target {
            return true;
        }
        match (self, target) {
            (_, Disconnected) => true,
            (Disconnected, Connecting) => true,
            (Disconnected, _) => false,
            (Error, Connecting) => true,
            (Error, _) => false,
            (_, Error) => true,
            (Connecting, Initializing) => true,
            (Initializing, Idle) => true,
            (Idle, Homing | Moving | PollingStatus) => true,
            (Homing, Idle | Moving | PollingStatus) => true,
            (Moving, PollingStatus | Idle) => true,
            (PollingStatus, Moving | Idle | Homing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Idle => write!(f, "Idle"),
            Self::Homing => write!(f, "Homing"),
            Self::Moving => write!(f, "Moving"),
            Self::PollingStatus => write!(f, "PollingStatus"),
            Self::Error => write!(f, "Error"),
        }
    }
}
