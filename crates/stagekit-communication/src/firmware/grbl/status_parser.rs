//! GRBL Status Report Parsing
//!
//! A status report is a bracketed line such as
//! `<Idle|MPos:150.000,40.000,-30.000|FS:0,0>`. Only the machine state and
//! the `MPos:` field matter here; both must be present and well formed.

use stagekit_core::{Position, ProtocolError};

/// Decoded real-time status report
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Absolute machine position
    pub machine_position: Position,
    /// Firmware state text (`Idle`, `Run`, `Hold:0`, `Alarm`, ...)
    pub raw_state: String,
}

impl StatusReport {
    /// True when the firmware reports it is not executing motion
    pub fn is_idle(&self) -> bool {
        self.raw_state == "Idle"
    }

    /// True when the firmware is in feed hold
    pub fn is_held(&self) -> bool {
        self.raw_state.starts_with("Hold")
    }
}

/// Status report parser
pub struct StatusParser;

impl StatusParser {
    /// True when `line` has the bracketed status shape
    pub fn is_status_line(line: &str) -> bool {
        let line = line.trim();
        line.len() >= 2 && line.starts_with('<') && line.ends_with('>')
    }

    /// Parse a complete status line.
    ///
    /// Fails with [`ProtocolError::MalformedStatus`] when the brackets are
    /// missing, there is no `MPos:` field, or any of its first three values
    /// is not a number.
    pub fn parse(line: &str) -> Result<StatusReport, ProtocolError> {
        let trimmed = line.trim();
        let malformed = |reason: &str| ProtocolError::MalformedStatus {
            line: trimmed.to_string(),
            reason: reason.to_string(),
        };

        if !Self::is_status_line(trimmed) {
            return Err(malformed("not a bracketed status frame"));
        }
        let body = &trimmed[1..trimmed.len() - 1];

        let raw_state = body.split('|').next().unwrap_or_default().trim();
        if raw_state.is_empty() {
            return Err(malformed("missing machine state"));
        }

        let mpos = Self::extract_field(body, "MPos:").ok_or_else(|| malformed("missing MPos field"))?;
        let machine_position =
            Self::parse_position(mpos).ok_or_else(|| malformed("MPos is not three numbers"))?;

        Ok(StatusReport {
            machine_position,
            raw_state: raw_state.to_string(),
        })
    }

    /// Parse `x,y,z[,...]`; extra axes are ignored, fewer than three fail
    pub fn parse_position(pos_str: &str) -> Option<Position> {
        let mut values = pos_str.split(',').map(|s| s.trim().parse::<f64>());
        let x = values.next()?.ok()?;
        let y = values.next()?.ok()?;
        let z = values.next()?.ok()?;
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return None;
        }
        Some(Position::new(x, y, z))
    }

    /// Value of a `Name:` field, up to the next pipe
    fn extract_field<'a>(body: &'a str, field_prefix: &str) -> Option<&'a str> {
        body.split('|')
            .map(str::trim)
            .find_map(|part| part.strip_prefix(field_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_idle_report() {
        let report = StatusParser::parse("<Idle|MPos:150.000,40.000,-30.000|FS:0,0>").unwrap();
        assert_eq!(report.machine_position, Position::new(150.0, 40.0, -30.0));
        assert_eq!(report.raw_state, "Idle");
        assert!(report.is_idle());
    }

    #[test]
    fn test_parse_grbl_09_style() {
        let report =
            StatusParser::parse("<Run,MPos:1.000,2.000,3.000,WPos:1.000,2.000,3.000>");
        // Comma-separated 0.9 reports have no pipe-delimited MPos field.
        assert!(report.is_err());
    }

    #[test]
    fn test_hold_state_with_substate() {
        let report = StatusParser::parse("<Hold:0|MPos:10.0,5.0,0.0|Bf:15,128>").unwrap();
        assert!(report.is_held());
        assert!(!report.is_idle());
    }

    #[test]
    fn test_extra_axes_are_ignored() {
        let report = StatusParser::parse("<Idle|MPos:1,2,3,4>").unwrap();
        assert_eq!(report.machine_position, Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_malformed_reports_fail() {
        for line in [
            "Idle|MPos:1,2,3",
            "<Idle|WPos:1,2,3>",
            "<Idle|MPos:1,2>",
            "<Idle|MPos:1,abc,3>",
            "<|MPos:1,2,3>",
            "<Idle|MPos:NaN,0,0>",
        ] {
            assert!(
                matches!(
                    StatusParser::parse(line),
                    Err(ProtocolError::MalformedStatus { .. })
                ),
                "expected failure for {line}"
            );
        }
    }
}
