// Test doubles for the hardware seams

use cputemp::core::hw::{
    CpuIdResult, CpuIdSource, DriverContext, HardwareFault, MmioRegion, MsrAccess, PciAddress,
    PciConfigSpace, PhysicalMapper,
};
use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared bookkeeping for every access the doubles see.
#[derive(Debug, Default)]
pub struct Counters {
    pub accesses: AtomicUsize,
    pub maps: AtomicUsize,
    pub unmaps: AtomicUsize,
    pub open_mappings: AtomicIsize,
}

impl Counters {
    pub fn accesses(&self) -> usize {
        self.accesses.load(Ordering::SeqCst)
    }

    pub fn maps(&self) -> usize {
        self.maps.load(Ordering::SeqCst)
    }

    pub fn unmaps(&self) -> usize {
        self.unmaps.load(Ordering::SeqCst)
    }

    pub fn open_mappings(&self) -> isize {
        self.open_mappings.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.accesses.fetch_add(1, Ordering::SeqCst);
    }
}

/// Describes the machine the doubles pretend to be.
#[derive(Debug, Clone)]
pub struct FakeHardware {
    pub signature: [u8; 12],
    /// Highest basic leaf reported by CPUID leaf 0
    pub max_basic_leaf: u32,
    pub dts: bool,
    /// `None` makes the MSR read fault
    pub therm_status: Option<u64>,
    pub pci_vendor: Option<u16>,
    pub bar0: Option<u32>,
    pub map_fails: bool,
    pub smu_register: u32,
    pub counters: Arc<Counters>,
}

impl FakeHardware {
    pub fn intel(readout: u64) -> Self {
        Self {
            signature: *b"GenuineIntel",
            max_basic_leaf: 0x16,
            dts: true,
            therm_status: Some(0x8800_0000 | (readout << 16)),
            pci_vendor: Some(0x8086),
            bar0: Some(0),
            map_fails: false,
            smu_register: 0,
            counters: Arc::default(),
        }
    }

    pub fn amd(eighths: u32) -> Self {
        Self {
            signature: *b"AuthenticAMD",
            max_basic_leaf: 0x10,
            dts: false,
            therm_status: None,
            pci_vendor: Some(0x1022),
            bar0: Some(0xFEB0_0004),
            map_fails: false,
            smu_register: eighths << 21,
            counters: Arc::default(),
        }
    }

    pub fn unknown() -> Self {
        Self {
            signature: *b"CentaurHauls",
            ..Self::intel(25)
        }
    }

    pub fn context(&self) -> DriverContext {
        DriverContext::new(
            Box::new(FakeCpuId {
                signature: self.signature,
                max_basic_leaf: self.max_basic_leaf,
                dts: self.dts,
                counters: Arc::clone(&self.counters),
            }),
            Box::new(FakeMsr {
                therm_status: self.therm_status,
                counters: Arc::clone(&self.counters),
            }),
            Box::new(FakePci {
                vendor: self.pci_vendor,
                bar0: self.bar0,
                counters: Arc::clone(&self.counters),
            }),
            Box::new(FakeMapper {
                fails: self.map_fails,
                register: self.smu_register,
                counters: Arc::clone(&self.counters),
            }),
        )
    }
}

struct FakeCpuId {
    signature: [u8; 12],
    max_basic_leaf: u32,
    dts: bool,
    counters: Arc<Counters>,
}

impl CpuIdSource for FakeCpuId {
    fn cpuid(&self, leaf: u32, _subleaf: u32) -> CpuIdResult {
        self.counters.touch();
        let word = |i: usize| {
            u32::from_le_bytes([
                self.signature[i],
                self.signature[i + 1],
                self.signature[i + 2],
                self.signature[i + 3],
            ])
        };
        match leaf {
            0 => CpuIdResult {
                eax: self.max_basic_leaf,
                ebx: word(0),
                edx: word(4),
                ecx: word(8),
            },
            6 => CpuIdResult {
                eax: u32::from(self.dts) | 0x4,
                ebx: 0x2,
                ecx: 0x9,
                edx: 0,
            },
            _ => CpuIdResult {
                eax: 0,
                ebx: 0,
                ecx: 0,
                edx: 0,
            },
        }
    }
}

struct FakeMsr {
    therm_status: Option<u64>,
    counters: Arc<Counters>,
}

impl MsrAccess for FakeMsr {
    fn read_msr(&self, msr: u32) -> Result<u64, HardwareFault> {
        self.counters.touch();
        match (msr, self.therm_status) {
            (0x19C, Some(value)) => Ok(value),
            _ => Err(HardwareFault { msr }),
        }
    }
}

struct FakePci {
    vendor: Option<u16>,
    bar0: Option<u32>,
    counters: Arc<Counters>,
}

impl PciConfigSpace for FakePci {
    fn read_config(&self, address: PciAddress, offset: u16, buf: &mut [u8]) -> usize {
        self.counters.touch();
        if address != PciAddress::new(0, 0x18, 3) {
            return 0;
        }
        let bytes = match offset {
            0x00 => self.vendor.map(|v| u32::from(v) | 0x1450_0000),
            0x10 => self.bar0,
            _ => None,
        };
        match bytes {
            Some(value) => {
                let le = value.to_le_bytes();
                let n = buf.len().min(le.len());
                buf[..n].copy_from_slice(&le[..n]);
                n
            }
            None => 0,
        }
    }
}

struct FakeMapper {
    fails: bool,
    register: u32,
    counters: Arc<Counters>,
}

impl PhysicalMapper for FakeMapper {
    fn map(&self, _phys: u64, _len: usize) -> Option<Box<dyn MmioRegion + '_>> {
        self.counters.touch();
        if self.fails {
            return None;
        }
        self.counters.maps.fetch_add(1, Ordering::SeqCst);
        self.counters.open_mappings.fetch_add(1, Ordering::SeqCst);
        Some(Box::new(FakeRegion {
            register: self.register,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeRegion {
    register: u32,
    counters: Arc<Counters>,
}

impl MmioRegion for FakeRegion {
    fn read_u32(&self, offset: usize) -> Option<u32> {
        self.counters.touch();
        (offset == 0xA4).then_some(self.register)
    }
}

impl Drop for FakeRegion {
    fn drop(&mut self) {
        self.counters.unmaps.fetch_add(1, Ordering::SeqCst);
        self.counters.open_mappings.fetch_sub(1, Ordering::SeqCst);
    }
}
