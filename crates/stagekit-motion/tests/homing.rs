mod common;

use common::{connected, test_config, HOMING_SETTLE, RESET_SETTLE};
use stagekit_core::{Error, MachineState, MotionError, MoveOrder, Position};
use stagekit_motion::{HomeOutcome, MovePhase};

#[test]
fn test_first_home_runs_full_sequence() {
    let h = connected(test_config());
    let outcome = h.controller.go_home().unwrap();

    assert_eq!(outcome, HomeOutcome::Homed);
    assert_eq!(h.grbl.lines(), vec!["$H", "$X", "G92 X0 Y0 Z0"]);
    assert_eq!(h.controller.position(), Position::ORIGIN);
    assert!(h.controller.home_executed());
    assert_eq!(h.controller.state(), MachineState::Idle);
    assert_eq!(h.clock.sleeps(), vec![RESET_SETTLE, HOMING_SETTLE]);
    assert_eq!(h.grbl.realtime_count('?'), 0);
}

#[test]
fn test_home_zeroes_a_displaced_position() {
    let h = connected(test_config());
    h.controller.move_to_tag((80.0, 60.0, -20.0)).unwrap();
    assert!(!h.controller.home_executed());

    h.controller.go_home().unwrap();
    assert_eq!(h.controller.position(), Position::ORIGIN);
    assert_eq!(h.controller.commanded(), Position::ORIGIN);
}

#[test]
fn test_second_home_moves_to_origin_without_homing_cycle() {
    let h = connected(test_config());
    h.controller.go_home().unwrap();
    h.controller.move_to_tag((150.0, 40.0, -30.0)).unwrap();
    h.grbl.clear_events();

    let outcome = h.controller.go_home().unwrap();

    let lines = h.grbl.lines();
    assert!(!lines.iter().any(|l| l == "$H" || l == "$X" || l.starts_with("G92")));
    assert_eq!(lines, vec!["G0 Z0.000", "G0 X0.000 Y0.000"]);
    match outcome {
        HomeOutcome::ReturnedToOrigin(report) => {
            assert_eq!(report.confirmed, vec![MovePhase::Z, MovePhase::Xy]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(h.controller.position(), Position::ORIGIN);
    assert!(h.controller.home_executed());
}

#[test]
fn test_origin_return_order_is_configurable() {
    let mut config = test_config();
    config.origin_return = MoveOrder::XyFirst;
    let h = connected(config);
    h.controller.go_home().unwrap();
    h.controller.move_to_tag((150.0, 40.0, -30.0)).unwrap();
    h.grbl.clear_events();

    h.controller.go_home().unwrap();
    assert_eq!(h.grbl.motion_frames(), vec!["G0 X0.000 Y0.000", "G0 Z0.000"]);
}

#[test]
fn test_reconnect_requires_homing_again() {
    let h = connected(test_config());
    h.controller.go_home().unwrap();
    assert!(h.controller.home_executed());

    h.controller.reconnect().unwrap();
    assert!(!h.controller.home_executed());
    h.grbl.clear_events();

    assert_eq!(h.controller.go_home().unwrap(), HomeOutcome::Homed);
    assert_eq!(h.grbl.lines(), vec!["$H", "$X", "G92 X0 Y0 Z0"]);
}

#[test]
fn test_failed_unlock_leaves_session_unhomed() {
    let h = connected(test_config());
    h.controller.move_to(Some(30.0), None, None).unwrap();
    h.grbl.reject("$X", 9);

    let err = h.controller.go_home().unwrap_err();
    assert!(matches!(
        err,
        Error::Motion(MotionError::Rejected { code: 9, .. })
    ));
    assert!(!h.controller.home_executed());
    assert_eq!(h.controller.commanded().x, 30.0);
    assert!(!h.grbl.lines().iter().any(|l| l.starts_with("G92")));
    assert_eq!(h.controller.state(), MachineState::Idle);
}

#[test]
fn test_home_refused_while_halted() {
    let h = connected(test_config());
    h.controller.stop_all().unwrap();

    let err = h.controller.go_home().unwrap_err();
    assert!(matches!(err, Error::Motion(MotionError::Halted { .. })));
    assert!(h.grbl.lines().is_empty());
}
