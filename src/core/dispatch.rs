//! Control request dispatch.
//!
//! [`Dispatcher::handle`] is the single entry point for a request: it validates
//! the operation code and output buffer, detects the CPU vendor and runs exactly
//! one vendor readout path.

use std::fmt;

use parking_lot::Mutex;

use crate::core::hw::DriverContext;
use crate::core::thermal::{self, CpuVendor, ReadError, TemperatureReading};

/// Operation code for "get CPU temperature".
///
/// Laid out like a device I/O control code: device type `0x22`, read+write
/// access, function `0x800`, buffered transfer.
pub const IOCTL_GET_CPU_TEMP: u32 = ctl_code(0x22, 0x800, 0, 0x3);

/// Bytes of output a successful request produces.
pub const TEMPERATURE_PAYLOAD_LEN: u32 = 4;

const fn ctl_code(device_type: u32, function: u32, method: u32, access: u32) -> u32 {
    (device_type << 16) | (access << 14) | (function << 2) | method
}

/// Outcome of a control request, with its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlStatus {
    Success,
    BufferTooSmall,
    UnsupportedHardware,
    ResourceExhausted,
    InvalidRequest,
}

impl ControlStatus {
    pub const fn code(self) -> u32 {
        match self {
            ControlStatus::Success => 0x0000_0000,
            ControlStatus::InvalidRequest => 0xC000_0010,
            ControlStatus::BufferTooSmall => 0xC000_0023,
            ControlStatus::ResourceExhausted => 0xC000_009A,
            ControlStatus::UnsupportedHardware => 0xC000_00BB,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        [
            ControlStatus::Success,
            ControlStatus::InvalidRequest,
            ControlStatus::BufferTooSmall,
            ControlStatus::ResourceExhausted,
            ControlStatus::UnsupportedHardware,
        ]
        .into_iter()
        .find(|status| status.code() == code)
    }

    pub fn is_success(self) -> bool {
        self == ControlStatus::Success
    }

    /// Short human-readable explanation, used by the client.
    pub fn description(self) -> &'static str {
        match self {
            ControlStatus::Success => "success",
            ControlStatus::BufferTooSmall => "output buffer is smaller than 4 bytes",
            ControlStatus::UnsupportedHardware => {
                "CPU not supported (unknown vendor or no usable thermal sensor)"
            }
            ControlStatus::ResourceExhausted => "could not map the thermal registers",
            ControlStatus::InvalidRequest => "unrecognized control code",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:#010x})", self.description(), self.code())
    }
}

impl From<ReadError> for ControlStatus {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::UnsupportedHardware => ControlStatus::UnsupportedHardware,
            ReadError::ResourceExhausted => ControlStatus::ResourceExhausted,
        }
    }
}

/// A request as delivered by the endpoint. Carries no input payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRequest {
    pub code: u32,
    pub output_len: u32,
}

impl ControlRequest {
    pub fn new(code: u32, output_len: u32) -> Self {
        Self { code, output_len }
    }

    /// The one supported request, with a 4-byte output buffer.
    pub fn get_cpu_temp() -> Self {
        Self::new(IOCTL_GET_CPU_TEMP, TEMPERATURE_PAYLOAD_LEN)
    }
}

/// Status plus, on success only, the 4-byte little-endian temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlResult {
    status: ControlStatus,
    payload: Option<[u8; 4]>,
}

impl ControlResult {
    pub fn success(temp: TemperatureReading) -> Self {
        Self {
            status: ControlStatus::Success,
            payload: Some(temp.to_le_bytes()),
        }
    }

    /// A failed result. `ControlStatus::Success` is rejected; use [`success`].
    ///
    /// [`success`]: ControlResult::success
    pub fn failure(status: ControlStatus) -> Option<Self> {
        (!status.is_success()).then_some(Self {
            status,
            payload: None,
        })
    }

    pub fn status(&self) -> ControlStatus {
        self.status
    }

    pub fn payload(&self) -> Option<&[u8; 4]> {
        self.payload.as_ref()
    }

    /// Bytes written to the output buffer.
    pub fn information(&self) -> u32 {
        if self.payload.is_some() {
            TEMPERATURE_PAYLOAD_LEN
        } else {
            0
        }
    }

    pub fn temperature(&self) -> Option<TemperatureReading> {
        self.payload.map(u32::from_le_bytes)
    }

    fn fail(status: ControlStatus) -> Self {
        debug_assert!(!status.is_success());
        Self {
            status,
            payload: None,
        }
    }
}

impl From<Result<TemperatureReading, ReadError>> for ControlResult {
    fn from(result: Result<TemperatureReading, ReadError>) -> Self {
        match result {
            Ok(temp) => ControlResult::success(temp),
            Err(err) => ControlResult::fail(err.into()),
        }
    }
}

/// Single entry point for control requests.
pub struct Dispatcher {
    ctx: DriverContext,
    serialize: bool,
    msr_lock: Mutex<()>,
    smu_lock: Mutex<()>,
}

impl Dispatcher {
    /// Dispatcher that serializes each vendor path.
    pub fn new(ctx: DriverContext) -> Self {
        Self::with_serialization(ctx, true)
    }

    pub fn with_serialization(ctx: DriverContext, serialize: bool) -> Self {
        Self {
            ctx,
            serialize,
            msr_lock: Mutex::new(()),
            smu_lock: Mutex::new(()),
        }
    }

    pub fn handle(&self, request: &ControlRequest) -> ControlResult {
        if request.code != IOCTL_GET_CPU_TEMP {
            log::debug!("Rejecting control code {:#010x}", request.code);
            return ControlResult::fail(ControlStatus::InvalidRequest);
        }

        // checked before any hardware is touched
        if request.output_len < TEMPERATURE_PAYLOAD_LEN {
            return ControlResult::fail(ControlStatus::BufferTooSmall);
        }

        let result = match thermal::detect(self.ctx.cpuid.as_ref()) {
            CpuVendor::Intel => {
                let _guard = self.serialize.then(|| self.msr_lock.lock());
                thermal::read_model_register_temp(&self.ctx)
            }
            CpuVendor::Amd => {
                let _guard = self.serialize.then(|| self.smu_lock.lock());
                thermal::read_smu_temp(&self.ctx)
            }
            CpuVendor::Unknown => Err(ReadError::UnsupportedHardware),
        };

        result.into()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("serialize", &self.serialize)
            .finish_non_exhaustive()
    }
}
