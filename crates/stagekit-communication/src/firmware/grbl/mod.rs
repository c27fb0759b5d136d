//! GRBL protocol codec
//!
//! Frames going out (`command_creator`, `settings`) and replies coming back
//! (`response_parser`, `status_parser`, `error_decoder`).

pub mod command_creator;
pub mod error_decoder;
pub mod response_parser;
pub mod settings;
pub mod status_parser;

pub use command_creator::{
    format_coordinate, rapid_move, GrblCommand, PendingCommand, RealtimeCommand, ReplyClass,
};
pub use response_parser::{GrblResponse, GrblResponseParser};
pub use settings::{default_parameters, get_setting_name, FirmwareParameter};
pub use status_parser::{StatusParser, StatusReport};
