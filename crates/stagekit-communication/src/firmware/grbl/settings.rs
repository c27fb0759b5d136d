//! GRBL initialization parameters
//!
//! The controller is configured once per connection by sending a fixed
//! table of `$<id>=<value>` frames. The table is data: it lives in the
//! configuration file and defaults to [`default_parameters`].

use super::command_creator::GrblCommand;
use serde::{Deserialize, Serialize};

/// One firmware parameter assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareParameter {
    /// Parameter number (`$<id>`)
    pub id: u16,
    /// Value, kept as text so the wire form is exactly what was configured
    pub value: String,
}

impl FirmwareParameter {
    /// Create a parameter assignment
    pub fn new(id: u16, value: impl Into<String>) -> Self {
        Self {
            id,
            value: value.into(),
        }
    }

    /// Frame that applies this parameter
    pub fn to_command(&self) -> GrblCommand {
        GrblCommand::Setting {
            id: self.id,
            value: self.value.clone(),
        }
    }

    /// True when the value parses as a number
    pub fn is_numeric(&self) -> bool {
        self.value.trim().parse::<f64>().is_ok()
    }
}

const DEFAULT_TABLE: &[(u16, &str)] = &[
    (0, "10"),
    (1, "255"),
    (2, "0"),
    (3, "1"),
    (4, "0"),
    (5, "0"),
    (6, "0"),
    // MPos reporting; arrival confirmation reads MPos.
    (10, "1"),
    (11, "0.010"),
    (12, "0.002"),
    (13, "0"),
    (20, "0"),
    (21, "0"),
    (22, "1"),
    (23, "3"),
    (24, "100"),
    (25, "2000.000"),
    (26, "250"),
    (27, "2"),
    (30, "1000"),
    (31, "0"),
    (32, "0"),
    (100, "40"),
    (101, "80"),
    (102, "120"),
    (110, "4000.000"),
    (111, "4000.000"),
    (112, "800"),
    (120, "50.000"),
    (121, "50.000"),
    (122, "50.000"),
    (130, "200.000"),
    (131, "200.000"),
    (132, "200.000"),
];

/// Stock parameter table for the calibration stage
pub fn default_parameters() -> Vec<FirmwareParameter> {
    DEFAULT_TABLE
        .iter()
        .map(|(id, value)| FirmwareParameter::new(*id, *value))
        .collect()
}

/// Get setting name from setting number
pub fn get_setting_name(id: u16) -> &'static str {
    match id {
        0 => "Step pulse time",
        1 => "Step idle delay",
        2 => "Step pulse invert mask",
        3 => "Step direction invert mask",
        4 => "Invert step enable pin",
        5 => "Invert limit pins",
        6 => "Invert probe pin",
        10 => "Status report options",
        11 => "Junction deviation",
        12 => "Arc tolerance",
        13 => "Report in inches",
        20 => "Soft limits enable",
        21 => "Hard limits enable",
        22 => "Homing cycle enable",
        23 => "Homing direction invert mask",
        24 => "Homing locate feed rate",
        25 => "Homing search seek rate",
        26 => "Homing switch debounce delay",
        27 => "Homing switch pull-off distance",
        30 => "Maximum spindle speed",
        31 => "Minimum spindle speed",
        32 => "Laser mode enable",
        100 => "X steps/mm",
        101 => "Y steps/mm",
        102 => "Z steps/mm",
        110 => "X max rate",
        111 => "Y max rate",
        112 => "Z max rate",
        120 => "X acceleration",
        121 => "Y acceleration",
        122 => "Z acceleration",
        130 => "X max travel",
        131 => "Y max travel",
        132 => "Z max travel",
        _ => "Unknown setting",
    }
}
