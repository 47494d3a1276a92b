// Platform-specific code module

pub mod elevation;

pub use elevation::{elevation_hint, is_elevated};
