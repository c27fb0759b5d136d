//! # StageKit
//!
//! Motion controller for a GRBL-driven three-axis calibration stage:
//! - Serial transport with candidate-port discovery and reset handshake
//! - GRBL frame codec, reply and status-report parsing
//! - Bounds clamping, first-time homing, XY-then-Z tag moves confirmed by
//!   status polling
//! - TOML/JSON configuration and a read-only tag catalog
//!
//! ## Architecture
//!
//! 1. **stagekit-core** - Positions, limits, machine state, errors, clock
//! 2. **stagekit-communication** - Serial transport and GRBL codec
//! 3. **stagekit-motion** - Axis state, homing, sequencer, `StageController`
//! 4. **stagekit-settings** - Configuration files and tag catalog
//! 5. **stagekit** - Logging setup and the operator console binary

pub mod console;

pub use stagekit_communication::firmware;
pub use stagekit_core::data;

pub use stagekit_core::{
    Axis, AxisBounds, AxisLimits, BoundsClampedWarning, Clock, ConnectionError, Error,
    MachineState, MotionError, MoveOrder, PartialPosition, Position, ProtocolError, Result,
    SystemClock,
};

pub use stagekit_communication::{list_ports, SerialPortInfo, SerialPortOpener, TransportOptions};

pub use stagekit_motion::{
    ControllerConfig, HomeOutcome, MovePhase, MoveReport, PollPolicy, StageController,
};

pub use stagekit_settings::{SettingsError, StageConfig, TagCatalog, TagLocation, CONFIG_ENV};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Selects the log output format: `json` or anything else for pretty text
pub const LOG_FORMAT_ENV: &str = "STAGEKIT_LOG_FORMAT";

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - stderr output, pretty by default or JSON lines when
///   `STAGEKIT_LOG_FORMAT=json`
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing::Level::INFO.as_str()));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout belongs to the console
    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .pretty();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
