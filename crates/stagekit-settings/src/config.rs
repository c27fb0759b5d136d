//! Configuration for StageKit
//!
//! Supports JSON and TOML files, picked by extension. Every section has
//! defaults, so a file only needs the values it changes.
//!
//! Sections:
//! - Connection (candidate ports, baud rate, timing)
//! - Travel bounds per axis
//! - Homing settle time
//! - Motion (poll policy, origin return order, jog step)
//! - Firmware parameter table

use crate::error::{SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use stagekit_communication::firmware::grbl::{default_parameters, FirmwareParameter};
use stagekit_communication::TransportOptions;
use stagekit_core::{Axis, AxisBounds, AxisLimits, MoveOrder};
use stagekit_motion::{ControllerConfig, PollPolicy};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable naming a config file to use instead of the default
pub const CONFIG_ENV: &str = "STAGEKIT_CONFIG";

/// Serial connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Candidate ports, tried in order
    pub ports: Vec<String>,
    /// Baud rate
    pub baud_rate: u32,
    /// Upper bound on waiting for one reply line
    pub reply_timeout_ms: u64,
    /// Delay after the wake-up sequence before input is discarded
    pub reset_settle_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            ports: vec![
                "/dev/ttyUSB0".to_string(),
                "/dev/ttyUSB1".to_string(),
                "/dev/ttyACM0".to_string(),
            ],
            baud_rate: 115_200,
            reply_timeout_ms: 1000,
            reset_settle_ms: 2000,
        }
    }
}

/// Travel bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsSettings {
    /// X travel
    pub x: AxisBounds,
    /// Y travel
    pub y: AxisBounds,
    /// Z is inverted: home at the top, travel extends negative
    pub z: AxisBounds,
}

impl Default for BoundsSettings {
    fn default() -> Self {
        let limits = AxisLimits::default();
        Self {
            x: limits.x,
            y: limits.y,
            z: limits.z,
        }
    }
}

impl From<BoundsSettings> for AxisLimits {
    fn from(bounds: BoundsSettings) -> Self {
        AxisLimits {
            x: bounds.x,
            y: bounds.y,
            z: bounds.z,
        }
    }
}

/// Homing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomingSettings {
    /// Time allowed for the firmware homing cycle
    pub settle_ms: u64,
}

impl Default for HomingSettings {
    fn default() -> Self {
        Self { settle_ms: 2000 }
    }
}

/// Motion settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Delay before each status query
    pub poll_interval_ms: u64,
    /// Status queries allowed per move phase
    pub max_polls: u32,
    /// Arrival tolerance per axis
    pub tolerance_mm: f64,
    /// Re-reads allowed after a malformed reply
    pub protocol_retries: u32,
    /// Phase order of the return to origin on repeated homing
    pub origin_return: MoveOrder,
    /// Distance of one console jog
    pub jog_step_mm: f64,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            max_polls: 300,
            tolerance_mm: 0.01,
            protocol_retries: 3,
            origin_return: MoveOrder::ZFirst,
            jog_step_mm: 20.0,
        }
    }
}

/// Firmware parameter table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirmwareSettings {
    /// Applied in order once per connection
    pub parameters: Vec<FirmwareParameter>,
}

impl Default for FirmwareSettings {
    fn default() -> Self {
        Self {
            parameters: default_parameters(),
        }
    }
}

/// Complete stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StageConfig {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Travel bounds
    pub bounds: BoundsSettings,
    /// Homing
    pub homing: HomingSettings,
    /// Motion
    pub motion: MotionSettings,
    /// Firmware parameters
    pub firmware: FirmwareSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
    }
}

impl StageConfig {
    /// Create config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config_dir>/stagekit/stagekit.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| {
            SettingsError::ConfigDirectory("no configuration directory on this platform".into())
        })?;
        Ok(dir.join("stagekit").join("stagekit.toml"))
    }

    /// Path from `STAGEKIT_CONFIG`, falling back to [`StageConfig::default_path`]
    pub fn resolve_path() -> SettingsResult<PathBuf> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::default_path(),
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let connection = &self.connection;
        if connection.ports.is_empty() {
            return Err(SettingsError::invalid(
                "connection.ports",
                "at least one candidate port is required",
            ));
        }
        if connection.ports.iter().any(|p| p.trim().is_empty()) {
            return Err(SettingsError::invalid(
                "connection.ports",
                "port names must not be empty",
            ));
        }
        if connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }
        if connection.reply_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.reply_timeout_ms",
                "must be > 0",
            ));
        }

        for axis in Axis::ALL {
            let bounds = AxisLimits::from(self.bounds).get(axis);
            if !bounds.is_valid() || bounds.min >= bounds.max {
                return Err(SettingsError::invalid(
                    format!("bounds.{}", axis.letter().to_ascii_lowercase()),
                    format!("min ({}) must be below max ({})", bounds.min, bounds.max),
                ));
            }
        }

        if self.homing.settle_ms == 0 {
            return Err(SettingsError::invalid("homing.settle_ms", "must be > 0"));
        }

        let motion = &self.motion;
        if motion.poll_interval_ms == 0 {
            return Err(SettingsError::invalid("motion.poll_interval_ms", "must be > 0"));
        }
        if motion.max_polls == 0 {
            return Err(SettingsError::invalid("motion.max_polls", "must be > 0"));
        }
        if !(motion.tolerance_mm.is_finite() && motion.tolerance_mm > 0.0) {
            return Err(SettingsError::invalid("motion.tolerance_mm", "must be > 0"));
        }
        if !(motion.jog_step_mm.is_finite() && motion.jog_step_mm > 0.0) {
            return Err(SettingsError::invalid("motion.jog_step_mm", "must be > 0"));
        }

        if let Some(parameter) = self
            .firmware
            .parameters
            .iter()
            .find(|p| p.value.trim().is_empty())
        {
            return Err(SettingsError::invalid(
                format!("firmware.parameters.${}", parameter.id),
                "value must not be empty",
            ));
        }

        Ok(())
    }

    /// Runtime settings for the motion controller
    pub fn to_controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            ports: self.connection.ports.clone(),
            baud_rate: self.connection.baud_rate,
            transport: TransportOptions {
                reply_timeout: Duration::from_millis(self.connection.reply_timeout_ms),
                reset_settle: Duration::from_millis(self.connection.reset_settle_ms),
            },
            limits: self.bounds.into(),
            homing_settle: Duration::from_millis(self.homing.settle_ms),
            poll: PollPolicy {
                interval: Duration::from_millis(self.motion.poll_interval_ms),
                max_polls: self.motion.max_polls,
                tolerance: self.motion.tolerance_mm,
                protocol_retries: self.motion.protocol_retries,
            },
            origin_return: self.motion.origin_return,
            parameters: self.firmware.parameters.clone(),
        }
    }
}
