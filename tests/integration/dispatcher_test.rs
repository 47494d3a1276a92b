use super::support::FakeHardware;
use cputemp::core::dispatch::{IOCTL_GET_CPU_TEMP, TEMPERATURE_PAYLOAD_LEN};
use cputemp::{ControlRequest, ControlStatus, Dispatcher};

fn dispatch(hw: &FakeHardware, request: ControlRequest) -> cputemp::ControlResult {
    Dispatcher::new(hw.context()).handle(&request)
}

#[test]
fn test_intel_success_in_plausible_range() {
    let hw = FakeHardware::intel(38);
    let result = dispatch(&hw, ControlRequest::get_cpu_temp());

    assert_eq!(result.status(), ControlStatus::Success);
    assert_eq!(result.payload(), Some(&62u32.to_le_bytes()));
    assert!((0..=150).contains(&result.temperature().unwrap()));
}

#[test]
fn test_amd_success_in_plausible_range() {
    let hw = FakeHardware::amd(45 * 8 + 3);
    let result = dispatch(&hw, ControlRequest::get_cpu_temp());

    assert_eq!(result.status(), ControlStatus::Success);
    assert_eq!(result.temperature(), Some(45));
    assert_eq!(result.information(), TEMPERATURE_PAYLOAD_LEN);
}

#[test]
fn test_buffer_too_small_touches_no_hardware() {
    for hw in [
        FakeHardware::intel(25),
        FakeHardware::amd(640),
        FakeHardware::unknown(),
    ] {
        for len in 0..TEMPERATURE_PAYLOAD_LEN {
            let result = dispatch(&hw, ControlRequest::new(IOCTL_GET_CPU_TEMP, len));
            assert_eq!(result.status(), ControlStatus::BufferTooSmall);
            assert!(result.payload().is_none());
        }
        assert_eq!(hw.counters.accesses(), 0);
    }
}

#[test]
fn test_larger_output_buffer_is_accepted() {
    let hw = FakeHardware::intel(25);
    let result = dispatch(&hw, ControlRequest::new(IOCTL_GET_CPU_TEMP, 64));
    assert_eq!(result.temperature(), Some(75));
    assert_eq!(result.information(), 4);
}

#[test]
fn test_unknown_code_is_invalid_request() {
    let hw = FakeHardware::intel(25);
    for code in [0, IOCTL_GET_CPU_TEMP + 4, IOCTL_GET_CPU_TEMP - 1, u32::MAX] {
        let result = dispatch(&hw, ControlRequest::new(code, 4));
        assert_eq!(result.status(), ControlStatus::InvalidRequest);
        assert!(result.payload().is_none());
    }
    // invalid codes are rejected even with a short buffer
    let result = dispatch(&hw, ControlRequest::new(0x1234, 0));
    assert_eq!(result.status(), ControlStatus::InvalidRequest);
    assert_eq!(hw.counters.accesses(), 0);
}

#[test]
fn test_unknown_vendor_is_unsupported() {
    let hw = FakeHardware::unknown();
    let result = dispatch(&hw, ControlRequest::get_cpu_temp());
    assert_eq!(result.status(), ControlStatus::UnsupportedHardware);
    assert!(result.payload().is_none());
}

#[test]
fn test_no_fallback_between_vendor_paths() {
    // Intel signature without a sensor must not try the SMU path
    let mut hw = FakeHardware::intel(25);
    hw.dts = false;
    hw.pci_vendor = Some(0x1022);
    hw.bar0 = Some(0xFEB0_0000);
    hw.smu_register = 640 << 21;

    let result = dispatch(&hw, ControlRequest::get_cpu_temp());
    assert_eq!(result.status(), ControlStatus::UnsupportedHardware);
    assert_eq!(hw.counters.maps(), 0);
}

#[test]
fn test_requests_are_independent() {
    let hw = FakeHardware::amd(640);
    let dispatcher = Dispatcher::new(hw.context());

    let first = dispatcher.handle(&ControlRequest::get_cpu_temp());
    let _ = dispatcher.handle(&ControlRequest::new(IOCTL_GET_CPU_TEMP, 1));
    let second = dispatcher.handle(&ControlRequest::get_cpu_temp());
    assert_eq!(first, second);
}

#[test]
fn test_concurrent_requests_share_dispatcher() {
    let hw = FakeHardware::amd(640);
    let dispatcher = Dispatcher::new(hw.context());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..25 {
                    let result = dispatcher.handle(&ControlRequest::get_cpu_temp());
                    assert_eq!(result.temperature(), Some(80));
                }
            });
        }
    });

    assert_eq!(hw.counters.maps(), 200);
    assert_eq!(hw.counters.open_mappings(), 0);
}
