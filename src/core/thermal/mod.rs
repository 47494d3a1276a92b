//! CPU die temperature acquisition.
//!
//! Two vendor specific paths share this module:
//!
//! - [`msr`]: Intel parts, digital thermal sensor readout from `IA32_THERM_STATUS`
//! - [`smu`]: AMD parts, SMU thermal register behind a PCI BAR
//!
//! [`vendor::detect`] picks which one applies.

use thiserror::Error;

pub mod msr;
pub mod smu;
pub mod vendor;

pub use msr::read_model_register_temp;
pub use smu::read_smu_temp;
pub use vendor::{detect, CpuVendor};

/// Integer degrees Celsius.
pub type TemperatureReading = u32;

/// Why a reader could not produce a temperature.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    #[error("CPU does not support this temperature readout")]
    UnsupportedHardware,

    #[error("insufficient resources to map the thermal registers")]
    ResourceExhausted,
}
