//! StageKit Settings Crate
//!
//! Stage configuration files and the read-only tag catalog.

pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{TagCatalog, TagLocation};
pub use config::{
    BoundsSettings, ConnectionSettings, FirmwareSettings, HomingSettings, MotionSettings,
    StageConfig, CONFIG_ENV,
};
pub use error::{SettingsError, SettingsResult};
