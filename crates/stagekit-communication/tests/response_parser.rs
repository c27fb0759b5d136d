use stagekit_communication::firmware::grbl::response_parser::*;
use stagekit_core::{Position, ProtocolError};

#[test]
fn test_parse_ok() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("ok"), Ok(GrblResponse::Ok));
    assert_eq!(parser.parse("  ok\r\n"), Ok(GrblResponse::Ok));
}

#[test]
fn test_parse_error() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("error:1"), Ok(GrblResponse::Error(1)));
    assert_eq!(parser.parse("error:23"), Ok(GrblResponse::Error(23)));
}

#[test]
fn test_parse_alarm() {
    let parser = GrblResponseParser::new();
    assert_eq!(parser.parse("ALARM:1"), Ok(GrblResponse::Alarm(1)));
    assert_eq!(parser.parse("alarm:6"), Ok(GrblResponse::Alarm(6)));
}

#[test]
fn test_parse_status_report() {
    let parser = GrblResponseParser::new();
    let response = parser.parse("<Idle|MPos:150.000,40.000,-30.000|FS:0,0>");

    match response {
        Ok(GrblResponse::Status(status)) => {
            assert_eq!(status.raw_state, "Idle");
            assert_eq!(status.machine_position, Position::new(150.0, 40.0, -30.0));
        }
        other => panic!("expected status, got {:?}", other),
    }
}

#[test]
fn test_status_without_mpos_is_protocol_error() {
    let parser = GrblResponseParser::new();
    assert!(matches!(
        parser.parse("<Idle|WPos:0.000,0.000,0.000>"),
        Err(ProtocolError::MalformedStatus { .. })
    ));
}

#[test]
fn test_informational_lines_are_messages() {
    let parser = GrblResponseParser::new();
    for line in ["Grbl 1.1h ['$' for help]", "[MSG:Caution: Unlocked]", "$110=4000.000"] {
        assert!(matches!(parser.parse(line), Ok(GrblResponse::Message(_))));
    }
}

#[test]
fn test_garbage_is_unrecognized() {
    let parser = GrblResponseParser::new();
    assert_eq!(
        parser.parse("\u{fffd}\u{fffd}k"),
        Err(ProtocolError::Unrecognized {
            line: "\u{fffd}\u{fffd}k".to_string()
        })
    );
    assert!(matches!(
        parser.parse("error:abc"),
        Err(ProtocolError::Unrecognized { .. })
    ));
    assert!(matches!(parser.parse(""), Err(ProtocolError::Unrecognized { .. })));
}
