use std::fmt;

use raw_cpuid::CpuId;

use crate::core::hw::{CpuIdResult, CpuIdSource};

const INTEL_SIGNATURE: &str = "GenuineIntel";
const AMD_SIGNATURE: &str = "AuthenticAMD";

/// Which temperature readout strategy applies to the running CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuVendor {
    Unknown,
    Intel,
    Amd,
}

impl fmt::Display for CpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuVendor::Unknown => "Unknown",
            CpuVendor::Intel => "Intel",
            CpuVendor::Amd => "AMD",
        };
        f.write_str(name)
    }
}

// Extract vendor from CPUID leaf 0
pub fn detect(source: &dyn CpuIdSource) -> CpuVendor {
    let cpuid = CpuId::with_cpuid_reader(|leaf: u32, subleaf: u32| -> CpuIdResult {
        source.cpuid(leaf, subleaf)
    });

    cpuid
        .get_vendor_info()
        .map(|v| match v.as_str() {
            INTEL_SIGNATURE => CpuVendor::Intel,
            AMD_SIGNATURE => CpuVendor::Amd,
            _ => CpuVendor::Unknown,
        })
        .unwrap_or(CpuVendor::Unknown)
}
