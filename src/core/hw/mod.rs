//! Hardware access seams.
//!
//! Every privileged operation the thermal readers need goes through one of the
//! traits below. [`DriverContext`] owns one implementation of each and is handed
//! to the dispatcher explicitly, so there is no global device state and tests can
//! substitute doubles for every access.

use std::fmt;

pub use raw_cpuid::CpuIdResult;

#[cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]
pub mod native;

/// Size of the window mapped for memory-mapped register access.
pub const PAGE_SIZE: usize = 0x1000;

/// Executes the CPU identification instruction.
pub trait CpuIdSource: Send + Sync {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> CpuIdResult;
}

/// A privileged register read faulted (the register is not implemented, or the
/// access was refused before it reached the CPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareFault {
    pub msr: u32,
}

impl fmt::Display for HardwareFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hardware fault reading MSR {:#x}", self.msr)
    }
}

impl std::error::Error for HardwareFault {}

/// Reads model-specific registers.
///
/// Implementations are the fault boundary: a read of a register the CPU does
/// not implement must come back as `Err(HardwareFault)`, never as a crash.
pub trait MsrAccess: Send + Sync {
    fn read_msr(&self, msr: u32) -> Result<u64, HardwareFault>;
}

/// Bus/device/function triple locating a PCI function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PciAddress {
    pub bus: u8,
    pub device: u8,
    pub function: u8,
}

impl PciAddress {
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }

    /// Configuration mechanism #1 address for `offset`.
    ///
    /// ```text
    /// Bit 31    : Enable bit
    /// Bits 23-16: Bus number
    /// Bits 15-11: Device number
    /// Bits 10-8 : Function number
    /// Bits 7-2  : Register offset (dword aligned)
    /// ```
    pub fn config_address(&self, offset: u8) -> u32 {
        0x8000_0000
            | (u32::from(self.bus) << 16)
            | (u32::from(self.device & 0x1F) << 11)
            | (u32::from(self.function & 0x07) << 8)
            | u32::from(offset & 0xFC)
    }

    /// Name of the function under `/sys/bus/pci/devices` (segment 0).
    pub fn sysfs_name(&self) -> String {
        format!(
            "0000:{:02x}:{:02x}.{:x}",
            self.bus, self.device, self.function
        )
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}.{}", self.bus, self.device, self.function)
    }
}

/// Reads PCI configuration space.
pub trait PciConfigSpace: Send + Sync {
    /// Fills `buf` from `offset` and returns how many bytes were actually read.
    /// A count short of `buf.len()` means the function is absent or unreadable.
    fn read_config(&self, address: PciAddress, offset: u16, buf: &mut [u8]) -> usize;

    fn read_u16(&self, address: PciAddress, offset: u16) -> Option<u16> {
        let mut buf = [0u8; 2];
        (self.read_config(address, offset, &mut buf) == buf.len())
            .then(|| u16::from_le_bytes(buf))
    }

    fn read_u32(&self, address: PciAddress, offset: u16) -> Option<u32> {
        let mut buf = [0u8; 4];
        (self.read_config(address, offset, &mut buf) == buf.len())
            .then(|| u32::from_le_bytes(buf))
    }
}

/// A live mapping of physical memory. Dropping it releases the mapping.
pub trait MmioRegion {
    /// Volatile 32-bit read at `offset` bytes from the start of the region.
    /// Returns `None` when the read would fall outside the region.
    fn read_u32(&self, offset: usize) -> Option<u32>;
}

/// Maps physical address ranges as non-cached memory.
pub trait PhysicalMapper: Send + Sync {
    /// Returns `None` when the range cannot be mapped.
    fn map(&self, phys: u64, len: usize) -> Option<Box<dyn MmioRegion + '_>>;
}

/// Device state threaded through the dispatcher: one implementation of each
/// hardware seam.
pub struct DriverContext {
    pub cpuid: Box<dyn CpuIdSource>,
    pub msr: Box<dyn MsrAccess>,
    pub pci: Box<dyn PciConfigSpace>,
    pub mapper: Box<dyn PhysicalMapper>,
}

impl DriverContext {
    pub fn new(
        cpuid: Box<dyn CpuIdSource>,
        msr: Box<dyn MsrAccess>,
        pci: Box<dyn PciConfigSpace>,
        mapper: Box<dyn PhysicalMapper>,
    ) -> Self {
        Self {
            cpuid,
            msr,
            pci,
            mapper,
        }
    }

    /// Context backed by the running machine.
    #[cfg(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64")))]
    pub fn native(config: &crate::core::config::Config) -> crate::error::Result<Self> {
        Ok(Self::new(
            Box::new(native::NativeCpuId),
            Box::new(native::DevMsr::new(config.msr_cpu)),
            Box::new(native::SysfsPciConfig::default()),
            Box::new(native::DevMemMapper::default()),
        ))
    }

    #[cfg(not(all(target_os = "linux", any(target_arch = "x86", target_arch = "x86_64"))))]
    pub fn native(_config: &crate::core::config::Config) -> crate::error::Result<Self> {
        Err(crate::error::CpuTempError::unsupported_platform(
            "native hardware access requires Linux on x86/x86_64",
        ))
    }
}

impl fmt::Debug for DriverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverContext").finish_non_exhaustive()
    }
}
