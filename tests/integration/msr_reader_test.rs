use super::support::FakeHardware;
use cputemp::core::thermal::{read_model_register_temp, ReadError};

#[test]
fn test_readout_25_is_75_degrees() {
    let hw = FakeHardware::intel(25);
    assert_eq!(read_model_register_temp(&hw.context()), Ok(75));
}

#[test]
fn test_missing_sensor_skips_register_read() {
    let mut hw = FakeHardware::intel(25);
    hw.dts = false;

    assert_eq!(
        read_model_register_temp(&hw.context()),
        Err(ReadError::UnsupportedHardware)
    );
}

#[test]
fn test_thermal_leaf_beyond_max_basic_leaf_is_unsupported() {
    let mut hw = FakeHardware::intel(25);
    // leaf 6 still answers with the sensor bit, but leaf 0 says it does not exist
    hw.max_basic_leaf = 5;

    assert_eq!(
        read_model_register_temp(&hw.context()),
        Err(ReadError::UnsupportedHardware)
    );
}

#[test]
fn test_register_fault_is_unsupported() {
    let mut hw = FakeHardware::intel(25);
    hw.therm_status = None;

    assert_eq!(
        read_model_register_temp(&hw.context()),
        Err(ReadError::UnsupportedHardware)
    );
}

#[test]
fn test_same_bits_same_result() {
    let hw = FakeHardware::intel(60);
    let ctx = hw.context();
    let first = read_model_register_temp(&ctx);
    for _ in 0..10 {
        assert_eq!(read_model_register_temp(&ctx), first);
    }
    assert_eq!(first, Ok(40));
}
