// Core business logic module

pub mod config;
pub mod dispatch;
pub mod hw;
pub mod protocol;
pub mod thermal;

#[cfg(unix)]
pub mod client;
#[cfg(unix)]
pub mod endpoint;

// Re-export commonly used items
pub use config::Config;
pub use dispatch::{ControlRequest, ControlResult, ControlStatus, Dispatcher};
#[cfg(unix)]
pub use endpoint::{Endpoint, EndpointConfig, ShutdownHandle};
