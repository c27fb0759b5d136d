//! GRBL Error and Alarm Code Decoder
//! Converts numeric `error:N` and `ALARM:N` codes to readable text

/// Describe a GRBL 1.1 error code
pub fn decode_error(code: u8) -> &'static str {
    match code {
        1 => "Expected command letter",
        2 => "Bad number format",
        3 => "Invalid '$' system command",
        4 => "Negative value",
        5 => "Homing cycle not enabled",
        6 => "Step pulse must be at least 3 microseconds",
        7 => "EEPROM read failed, defaults restored",
        8 => "'$' command only valid when idle",
        9 => "G-code locked out during alarm or jog",
        10 => "Soft limits require homing to be enabled",
        11 => "Line too long",
        12 => "Step rate exceeds maximum",
        13 => "Safety door open",
        14 => "Startup line too long",
        15 => "Jog target exceeds machine travel",
        16 => "Invalid jog command",
        17 => "Laser mode requires PWM output",
        20 => "Unsupported or invalid g-code command",
        21 => "Modal group violation",
        22 => "Undefined feed rate",
        23 => "Command requires an integer value",
        24 => "More than one command using axis words",
        25 => "Repeated g-code word",
        26 => "Axis words required but missing",
        27 => "Line number out of range",
        28 => "Missing P or L value word",
        29 => "Unsupported work coordinate system",
        30 => "G53 requires G0 or G1 motion mode",
        31 => "Unused axis words with G80 active",
        32 => "Arc has no axis words in the selected plane",
        33 => "Invalid motion target",
        34 => "Arc radius definition error",
        35 => "Arc offset definition missing IJK word",
        36 => "Unused g-code words in block",
        37 => "Tool length offset applied to wrong axis",
        38 => "Tool number above supported maximum",
        _ => "Unknown error",
    }
}

/// Describe a GRBL 1.1 alarm code
pub fn decode_alarm(code: u8) -> &'static str {
    match code {
        1 => "Hard limit triggered; position lost, re-home",
        2 => "Soft limit: target exceeds machine travel",
        3 => "Reset while in motion; position lost, re-home",
        4 => "Probe fail: probe not in expected initial state",
        5 => "Probe fail: no contact within travel",
        6 => "Homing fail: reset during homing cycle",
        7 => "Homing fail: safety door opened during homing",
        8 => "Homing fail: could not clear limit switch on pull-off",
        9 => "Homing fail: limit switch not found within search distance",
        _ => "Unknown alarm",
    }
}

/// Format error message with code and description
pub fn format_error(code: u8) -> String {
    format!("error:{} - {}", code, decode_error(code))
}

/// Format alarm message with code and description
pub fn format_alarm(code: u8) -> String {
    format!("ALARM:{} - {}", code, decode_alarm(code))
}
