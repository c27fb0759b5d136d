use proptest::prelude::*;
use stagekit_core::{Axis, AxisBounds, AxisLimits, Position};
use stagekit_motion::AxisState;

fn bounds() -> impl Strategy<Value = AxisBounds> {
    (-500.0f64..500.0, 0.0f64..400.0).prop_map(|(min, span)| AxisBounds::new(min, min + span))
}

fn limits() -> impl Strategy<Value = AxisLimits> {
    (bounds(), bounds(), bounds()).prop_map(|(x, y, z)| AxisLimits { x, y, z })
}

fn position() -> impl Strategy<Value = Position> {
    (-1e6f64..1e6, -1e6f64..1e6, -1e6f64..1e6).prop_map(|(x, y, z)| Position::new(x, y, z))
}

proptest! {
    #[test]
    fn clamp_is_idempotent(limits in limits(), p in position()) {
        let state = AxisState::new(limits);
        let once = state.clamp(p);
        let twice = state.clamp(once.value);
        prop_assert_eq!(twice.value, once.value);
        prop_assert!(twice.warnings.is_empty());
    }

    #[test]
    fn clamp_respects_bounds(limits in limits(), p in position()) {
        let state = AxisState::new(limits);
        let clamped = state.clamp(p).value;
        prop_assert!(limits.contains(&clamped));
        for axis in Axis::ALL {
            let b = limits.get(axis);
            prop_assert!(clamped.get(axis) >= b.min && clamped.get(axis) <= b.max);
        }
    }

    #[test]
    fn in_bounds_targets_are_untouched(p in position()) {
        let state = AxisState::new(AxisLimits::default());
        let clamped = state.clamp(p);
        if AxisLimits::default().contains(&p) {
            prop_assert_eq!(clamped.value, p);
            prop_assert!(clamped.warnings.is_empty());
        } else {
            prop_assert!(!clamped.warnings.is_empty());
        }
    }
}
