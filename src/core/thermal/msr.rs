//! Digital thermal sensor readout through `IA32_THERM_STATUS`.

use raw_cpuid::CpuId;
pub use x86::msr::IA32_THERM_STATUS;

use super::{ReadError, TemperatureReading};
use crate::core::hw::{CpuIdResult, DriverContext};

/// Junction temperature the sensor readout is measured down from.
///
/// Parts publish their own TjMax in `IA32_TEMPERATURE_TARGET`; this reader uses a
/// flat 100 °C instead, so on parts with a different TjMax the result is off by
/// the difference.
pub const TJ_MAX_DEFAULT: u32 = 100;

/// Converts a raw `IA32_THERM_STATUS` value to degrees Celsius.
///
/// Bits 22:16 hold the distance below TjMax. A readout above TjMax saturates to 0.
pub fn decode_therm_status(raw: u64) -> TemperatureReading {
    let readout = ((raw >> 16) & 0x7F) as u32;
    TJ_MAX_DEFAULT.saturating_sub(readout)
}

pub fn read_model_register_temp(ctx: &DriverContext) -> Result<TemperatureReading, ReadError> {
    let source = ctx.cpuid.as_ref();
    let cpuid = CpuId::with_cpuid_reader(|leaf: u32, subleaf: u32| -> CpuIdResult {
        source.cpuid(leaf, subleaf)
    });

    let has_dts = cpuid
        .get_thermal_power_info()
        .map(|info| info.has_dts())
        .unwrap_or(false);
    if !has_dts {
        log::debug!("CPUID.06H:EAX[0] clear, no digital thermal sensor");
        return Err(ReadError::UnsupportedHardware);
    }

    let raw = ctx.msr.read_msr(IA32_THERM_STATUS).map_err(|fault| {
        log::debug!("{}", fault);
        ReadError::UnsupportedHardware
    })?;

    let temp = decode_therm_status(raw);
    log::debug!("IA32_THERM_STATUS={:#018x} -> {} °C", raw, temp);
    Ok(temp)
}
