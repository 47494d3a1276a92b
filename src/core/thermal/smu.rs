//! AMD SMU thermal register readout.
//!
//! The SMU registers sit behind BAR0 of the host bridge function at
//! `00:18.3`. We confirm the function belongs to AMD, map one page of the BAR
//! uncached and read the reported temperature control value.

use super::{ReadError, TemperatureReading};
use crate::core::hw::{DriverContext, PciAddress, PAGE_SIZE};

pub const AMD_VENDOR_ID: u16 = 0x1022;
pub const SMU_FUNCTION: PciAddress = PciAddress::new(0, 0x18, 3);
pub const SMU_TEMP_OFFSET: usize = 0xA4;

const PCI_VENDOR_ID: u16 = 0x00;
const PCI_BASE_ADDRESS_0: u16 = 0x10;
const BAR_FLAG_MASK: u32 = 0xF;

/// Converts the raw SMU thermal register to degrees Celsius.
///
/// Bits 31:21 are the temperature in 1/8 °C; the fraction is truncated.
pub fn decode_smu_temp(raw: u32) -> TemperatureReading {
    let eighths = (raw >> 21) & 0x7FF;
    eighths >> 3
}

pub fn read_smu_temp(ctx: &DriverContext) -> Result<TemperatureReading, ReadError> {
    let vendor = ctx.pci.read_u16(SMU_FUNCTION, PCI_VENDOR_ID);
    if vendor != Some(AMD_VENDOR_ID) {
        log::debug!("{} vendor id {:04x?}, expected {:04x}", SMU_FUNCTION, vendor, AMD_VENDOR_ID);
        return Err(ReadError::UnsupportedHardware);
    }

    let bar0 = match ctx.pci.read_u32(SMU_FUNCTION, PCI_BASE_ADDRESS_0) {
        Some(bar) if bar != 0 => bar,
        _ => {
            log::debug!("{} BAR0 unreadable or unassigned", SMU_FUNCTION);
            return Err(ReadError::UnsupportedHardware);
        }
    };
    let base = u64::from(bar0 & !BAR_FLAG_MASK);

    // `page` unmaps on drop, on every path out of this function
    let page = ctx.mapper.map(base, PAGE_SIZE).ok_or_else(|| {
        log::debug!("Failed to map SMU page at {:#x}", base);
        ReadError::ResourceExhausted
    })?;

    let raw = page
        .read_u32(SMU_TEMP_OFFSET)
        .ok_or(ReadError::ResourceExhausted)?;
    drop(page);

    let temp = decode_smu_temp(raw);
    log::debug!("SMU thermal {:#010x} -> {} °C", raw, temp);
    Ok(temp)
}
