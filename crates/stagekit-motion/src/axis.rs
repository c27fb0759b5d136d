//! Axis state and travel limits
//!
//! [`AxisState`] is the single owner of where the stage is. It keeps two
//! positions apart:
//! - `position`: the authoritative one, changed only after a confirmed
//!   arrival or a successful homing zero
//! - `commanded`: the last target handed to the firmware, used as the base
//!   for relative jogs and partial moves

use stagekit_core::{Axis, AxisLimits, BoundsClampedWarning, PartialPosition, Position};
use tracing::warn;

/// A target after clamping, with one warning per saturated axis
#[derive(Debug, Clone, PartialEq)]
pub struct Clamped<T> {
    /// The clamped value
    pub value: T,
    /// Axes that had to be saturated
    pub warnings: Vec<BoundsClampedWarning>,
}

/// Current position and travel limits of the stage
#[derive(Debug, Clone, PartialEq)]
pub struct AxisState {
    limits: AxisLimits,
    position: Position,
    commanded: Position,
}

impl AxisState {
    /// Create state at the origin with the given limits
    pub fn new(limits: AxisLimits) -> Self {
        Self {
            limits,
            position: Position::ORIGIN,
            commanded: Position::ORIGIN,
        }
    }

    /// Travel limits
    pub fn limits(&self) -> &AxisLimits {
        &self.limits
    }

    /// Authoritative position
    pub fn position(&self) -> Position {
        self.position
    }

    /// Last commanded target
    pub fn commanded(&self) -> Position {
        self.commanded
    }

    fn clamp_axis(
        &self,
        axis: Axis,
        requested: f64,
        warnings: &mut Vec<BoundsClampedWarning>,
    ) -> f64 {
        let clamped = self.limits.get(axis).clamp(requested);
        if clamped != requested {
            let warning = BoundsClampedWarning {
                axis,
                requested,
                clamped,
            };
            warn!("{}", warning);
            warnings.push(warning);
        }
        clamped
    }

    /// Saturate every axis of `requested` into its bounds
    pub fn clamp(&self, requested: Position) -> Clamped<Position> {
        let mut warnings = Vec::new();
        let mut value = requested;
        for axis in Axis::ALL {
            value.set(axis, self.clamp_axis(axis, requested.get(axis), &mut warnings));
        }
        Clamped { value, warnings }
    }

    /// Saturate the axes of `requested` that carry a value
    pub fn clamp_partial(&self, requested: PartialPosition) -> Clamped<PartialPosition> {
        let mut warnings = Vec::new();
        let mut value = requested;
        for axis in requested.axes() {
            if let Some(v) = requested.get(axis) {
                value.set(axis, Some(self.clamp_axis(axis, v, &mut warnings)));
            }
        }
        Clamped { value, warnings }
    }

    /// Record a target accepted by the firmware; `position` is untouched
    pub fn record_commanded(&mut self, target: PartialPosition) {
        self.commanded = target.resolve(self.commanded);
    }

    /// Record a confirmed arrival on the given axes
    pub fn apply_axes(&mut self, moved_to: Position, axes: &[Axis]) {
        for axis in axes {
            self.position.set(*axis, moved_to.get(*axis));
            self.commanded.set(*axis, moved_to.get(*axis));
        }
    }

    /// Record a confirmed arrival on all axes
    pub fn apply(&mut self, moved_to: Position) {
        self.apply_axes(moved_to, &Axis::ALL);
    }

    /// Declare the current physical position as the origin
    pub fn zero(&mut self) {
        self.position = Position::ORIGIN;
        self.commanded = Position::ORIGIN;
    }
}
