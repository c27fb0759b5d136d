use proptest::prelude::*;
use stagekit_core::AxisBounds;

proptest! {
    #[test]
    fn clamp_lands_inside(min in -1000.0f64..1000.0, span in 0.0f64..1000.0, v in -1e9f64..1e9) {
        let bounds = AxisBounds::new(min, min + span);
        let c = bounds.clamp(v);
        prop_assert!(bounds.contains(c));
        prop_assert_eq!(bounds.clamp(c), c);
    }

    #[test]
    fn clamp_keeps_values_inside(min in -1000.0f64..1000.0, span in 0.0f64..1000.0, t in 0.0f64..=1.0) {
        let bounds = AxisBounds::new(min, min + span);
        let v = min + span * t;
        prop_assume!(bounds.contains(v));
        prop_assert_eq!(bounds.clamp(v), v);
    }
}

#[test]
fn test_inverted_bounds_are_invalid() {
    assert!(!AxisBounds::new(0.0, -85.0).is_valid());
    assert!(!AxisBounds::new(f64::NAN, 0.0).is_valid());
    assert!(AxisBounds::new(-85.0, 0.0).is_valid());
}
