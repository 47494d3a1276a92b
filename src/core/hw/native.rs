//! Linux backend for the hardware seams.
//!
//! * CPUID executes directly on the calling core.
//! * MSRs are read through the `msr` driver (`/dev/cpu/<n>/msr`). The kernel
//!   performs the `rdmsr` under its exception table and reports a faulting
//!   register as `EIO`, which is what gives us the fault boundary.
//! * PCI configuration space comes from sysfs `config` files.
//! * Physical pages are mapped from `/dev/mem` with `O_SYNC`, which the kernel
//!   maps uncached.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::ptr::NonNull;

use raw_cpuid::{CpuIdReader, CpuIdReaderNative};

use super::{
    CpuIdResult, CpuIdSource, HardwareFault, MmioRegion, MsrAccess, PciAddress, PciConfigSpace,
    PhysicalMapper, PAGE_SIZE,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCpuId;

impl CpuIdSource for NativeCpuId {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> CpuIdResult {
        CpuIdReaderNative.cpuid2(leaf, subleaf)
    }
}

/// MSR reads pinned to one logical CPU through its `msr` device node.
#[derive(Debug, Clone)]
pub struct DevMsr {
    path: PathBuf,
}

impl DevMsr {
    pub fn new(cpu: u32) -> Self {
        Self {
            path: PathBuf::from(format!("/dev/cpu/{}/msr", cpu)),
        }
    }
}

impl MsrAccess for DevMsr {
    fn read_msr(&self, msr: u32) -> Result<u64, HardwareFault> {
        let read = || -> io::Result<u64> {
            let file = File::open(&self.path)?;
            let mut buf = [0u8; 8];
            file.read_exact_at(&mut buf, u64::from(msr))?;
            Ok(u64::from_le_bytes(buf))
        };

        read().map_err(|e| {
            log::debug!("rdmsr {:#x} via {:?} failed: {}", msr, self.path, e);
            HardwareFault { msr }
        })
    }
}

/// PCI configuration reads from `/sys/bus/pci/devices/<addr>/config`.
#[derive(Debug, Clone)]
pub struct SysfsPciConfig {
    root: PathBuf,
}

impl Default for SysfsPciConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/sys/bus/pci/devices"),
        }
    }
}

impl PciConfigSpace for SysfsPciConfig {
    fn read_config(&self, address: PciAddress, offset: u16, buf: &mut [u8]) -> usize {
        let path = self.root.join(address.sysfs_name()).join("config");
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                log::debug!("Cannot open {:?}: {}", path, e);
                return 0;
            }
        };

        let mut filled = 0;
        while filled < buf.len() {
            match file.read_at(&mut buf[filled..], u64::from(offset) + filled as u64) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("Config read at {:#x} of {} failed: {}", offset, address, e);
                    break;
                }
            }
        }
        filled
    }
}

/// Physical memory mappings through `/dev/mem`.
#[derive(Debug, Clone)]
pub struct DevMemMapper {
    path: PathBuf,
}

impl Default for DevMemMapper {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/dev/mem"),
        }
    }
}

impl PhysicalMapper for DevMemMapper {
    fn map(&self, phys: u64, len: usize) -> Option<Box<dyn MmioRegion + '_>> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_SYNC)
            .open(&self.path)
            .map_err(|e| log::debug!("Cannot open {:?}: {}", self.path, e))
            .ok()?;

        // mmap wants a page aligned offset; keep the remainder as an in-page delta
        let page_mask = PAGE_SIZE as u64 - 1;
        let aligned = phys & !page_mask;
        let delta = (phys & page_mask) as usize;
        let map_len = (delta + len + PAGE_SIZE - 1) & !(PAGE_SIZE - 1);
        let offset = libc::off_t::try_from(aligned).ok()?;

        // SAFETY: a fresh shared mapping of the device file; the kernel validates
        // the range and we never hand out references into it.
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                offset,
            )
        };
        if addr == libc::MAP_FAILED {
            log::debug!(
                "mmap of {:#x}+{:#x} failed: {}",
                phys,
                len,
                io::Error::last_os_error()
            );
            return None;
        }

        let base = NonNull::new(addr.cast::<u8>())?;
        Some(Box::new(DevMemRegion {
            base,
            map_len,
            delta,
            len,
        }))
    }
}

struct DevMemRegion {
    base: NonNull<u8>,
    map_len: usize,
    delta: usize,
    len: usize,
}

impl MmioRegion for DevMemRegion {
    fn read_u32(&self, offset: usize) -> Option<u32> {
        if offset % 4 != 0 || offset.checked_add(4)? > self.len {
            return None;
        }
        // SAFETY: bounds and alignment checked above, the mapping is live for
        // the lifetime of `self`.
        let value = unsafe {
            std::ptr::read_volatile(self.base.as_ptr().add(self.delta + offset).cast::<u32>())
        };
        Some(value)
    }
}

impl Drop for DevMemRegion {
    fn drop(&mut self) {
        // SAFETY: `base`/`map_len` are exactly what mmap returned and this is the
        // only place that unmaps them.
        let rc = unsafe { libc::munmap(self.base.as_ptr().cast(), self.map_len) };
        if rc != 0 {
            log::warn!("munmap failed: {}", io::Error::last_os_error());
        }
    }
}
