//! Runtime configuration of the stage controller

use serde::{Deserialize, Serialize};
use stagekit_communication::firmware::grbl::{default_parameters, FirmwareParameter};
use stagekit_communication::TransportOptions;
use stagekit_core::{AxisLimits, MoveOrder};
use std::time::Duration;

/// Bounded arrival-confirmation policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Delay before each status query
    pub interval: Duration,
    /// Status queries allowed per move phase
    pub max_polls: u32,
    /// Arrival tolerance per axis in millimeters (strict)
    pub tolerance: f64,
    /// Re-reads allowed after a malformed reply
    pub protocol_retries: u32,
}

impl PollPolicy {
    /// Worst-case wait for one phase, excluding reply latency
    pub fn budget(&self) -> Duration {
        self.interval * self.max_polls
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_polls: 300,
            tolerance: 0.01,
            protocol_retries: 3,
        }
    }
}

/// Everything a [`crate::StageController`] needs to run
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Candidate ports, tried in order
    pub ports: Vec<String>,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Reply timeout and reset settle
    pub transport: TransportOptions,
    /// Travel limits
    pub limits: AxisLimits,
    /// Time allowed for the firmware homing cycle
    pub homing_settle: Duration,
    /// Arrival confirmation
    pub poll: PollPolicy,
    /// Phase order of the return to origin on repeated homing
    pub origin_return: MoveOrder,
    /// Parameter table applied once after each connect
    pub parameters: Vec<FirmwareParameter>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            ports: vec![
                "/dev/ttyUSB0".to_string(),
                "/dev/ttyUSB1".to_string(),
                "/dev/ttyACM0".to_string(),
            ],
            baud_rate: 115_200,
            transport: TransportOptions::default(),
            limits: AxisLimits::default(),
            homing_settle: Duration::from_millis(2000),
            poll: PollPolicy::default(),
            origin_return: MoveOrder::default(),
            parameters: default_parameters(),
        }
    }
}
