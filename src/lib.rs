// cputemp library - public API

// Re-export error types
pub mod error;
pub use error::{CpuTempError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use crate::core::config::Config;
pub use crate::core::dispatch::{ControlRequest, ControlResult, ControlStatus, Dispatcher};
pub use crate::core::hw::DriverContext;
pub use crate::core::thermal::{CpuVendor, ReadError, TemperatureReading};

// Initialize logging
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
