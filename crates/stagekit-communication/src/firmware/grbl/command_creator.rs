//! GRBL command frames
//!
//! Builds the outgoing vocabulary: parameter settings, rapid motion,
//! homing/unlock/zero control lines, and real-time single-byte controls.

use stagekit_core::{Axis, PartialPosition};
use std::fmt;

/// Real-time control bytes, processed by the firmware out of band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealtimeCommand {
    /// `?` status report request
    StatusQuery,
    /// `!` feed hold
    FeedHold,
    /// `~` cycle start / resume
    CycleStart,
}

impl RealtimeCommand {
    /// Wire byte
    pub fn as_byte(&self) -> u8 {
        match self {
            RealtimeCommand::StatusQuery => b'?',
            RealtimeCommand::FeedHold => b'!',
            RealtimeCommand::CycleStart => b'~',
        }
    }
}

/// Class of reply a frame is answered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// `ok` or `error:N`
    Acknowledgement,
    /// `<...|MPos:x,y,z|...>`
    StatusReport,
    /// Nothing; the firmware does not answer
    None,
}

/// A line command understood by the firmware
#[derive(Debug, Clone, PartialEq)]
pub enum GrblCommand {
    /// `$<id>=<value>`
    Setting {
        /// Parameter number
        id: u16,
        /// Value exactly as it should appear on the wire
        value: String,
    },
    /// `G0` rapid move over the axes that carry a value
    RapidMove(PartialPosition),
    /// `$H` homing cycle
    Home,
    /// `$X` clear alarm lock
    Unlock,
    /// `G92 X0 Y0 Z0` declare the current position as origin
    ZeroOrigin,
    /// `M84` disable stepper motors
    DisableMotors,
}

impl GrblCommand {
    /// Render the frame without the line terminator
    pub fn to_frame(&self) -> String {
        match self {
            GrblCommand::Setting { id, value } => format!("${}={}", id, value),
            GrblCommand::RapidMove(target) => {
                let mut frame = String::from("G0");
                for axis in Axis::ALL {
                    if let Some(value) = target.get(axis) {
                        frame.push(' ');
                        frame.push(axis.letter());
                        frame.push_str(&format_coordinate(value));
                    }
                }
                frame
            }
            GrblCommand::Home => "$H".to_string(),
            GrblCommand::Unlock => "$X".to_string(),
            GrblCommand::ZeroOrigin => "G92 X0 Y0 Z0".to_string(),
            GrblCommand::DisableMotors => "M84".to_string(),
        }
    }

    /// Reply class the firmware answers this frame with
    pub fn expected_reply(&self) -> ReplyClass {
        ReplyClass::Acknowledgement
    }
}

impl fmt::Display for GrblCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_frame())
    }
}

/// A frame waiting to go out, with the reply it expects
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    /// Rendered frame
    pub frame: String,
    /// Expected reply class
    pub expected: ReplyClass,
}

impl From<&GrblCommand> for PendingCommand {
    fn from(cmd: &GrblCommand) -> Self {
        Self {
            frame: cmd.to_frame(),
            expected: cmd.expected_reply(),
        }
    }
}

impl From<RealtimeCommand> for PendingCommand {
    fn from(cmd: RealtimeCommand) -> Self {
        Self {
            frame: (cmd.as_byte() as char).to_string(),
            expected: match cmd {
                RealtimeCommand::StatusQuery => ReplyClass::StatusReport,
                _ => ReplyClass::None,
            },
        }
    }
}

/// Format a coordinate as a plain decimal with three places
pub fn format_coordinate(value: f64) -> String {
    // Adding 0.0 folds -0.0 into 0.0.
    format!("{:.3}", value + 0.0)
}

/// Build a rapid move; `None` when no axis carries a value
pub fn rapid_move(target: PartialPosition) -> Option<GrblCommand> {
    if target.is_empty() {
        None
    } else {
        Some(GrblCommand::RapidMove(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rapid_move_only_present_axes() {
        let cmd = GrblCommand::RapidMove(PartialPosition::new(Some(150.0), Some(40.0), None));
        assert_eq!(cmd.to_frame(), "G0 X150.000 Y40.000");

        let cmd = GrblCommand::RapidMove(PartialPosition::new(None, None, Some(-30.0)));
        assert_eq!(cmd.to_frame(), "G0 Z-30.000");

        let cmd = GrblCommand::RapidMove(PartialPosition::new(Some(99.8), Some(36.0), Some(0.0)));
        assert_eq!(cmd.to_frame(), "G0 X99.800 Y36.000 Z0.000");
    }

    #[test]
    fn test_negative_zero_is_plain() {
        assert_eq!(format_coordinate(-0.0), "0.000");
        assert_eq!(format_coordinate(-85.0), "-85.000");
    }

    #[test]
    fn test_empty_move_is_not_built() {
        assert!(rapid_move(PartialPosition::default()).is_none());
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(GrblCommand::Home.to_frame(), "$H");
        assert_eq!(GrblCommand::Unlock.to_frame(), "$X");
        assert_eq!(GrblCommand::ZeroOrigin.to_frame(), "G92 X0 Y0 Z0");
        assert_eq!(GrblCommand::DisableMotors.to_frame(), "M84");
        let setting = GrblCommand::Setting {
            id: 11,
            value: "0.010".into(),
        };
        assert_eq!(setting.to_frame(), "$11=0.010");
    }

    #[test]
    fn test_realtime_bytes() {
        assert_eq!(RealtimeCommand::StatusQuery.as_byte(), b'?');
        assert_eq!(RealtimeCommand::FeedHold.as_byte(), b'!');
        assert_eq!(RealtimeCommand::CycleStart.as_byte(), b'~');
        assert_eq!(
            PendingCommand::from(RealtimeCommand::StatusQuery).expected,
            ReplyClass::StatusReport
        );
        assert_eq!(
            PendingCommand::from(RealtimeCommand::FeedHold).expected,
            ReplyClass::None
        );
    }
}
