use std::time::Duration;

use pzemlink_core::{
    DeviceAddress, EmulatedMeter, Fault, Pzem, PzemConfig, PzemError, Reading, StepClock,
    Transport, TransportError,
};

const ADDR: DeviceAddress = DeviceAddress::new([192, 168, 1, 1]);

fn reading() -> Reading {
    Reading::new(230.5, 1.25, 288.0, 300.0)
}

fn driver(meter: EmulatedMeter) -> Pzem<EmulatedMeter, StepClock> {
    Pzem::with_config(meter, StepClock::new(1), PzemConfig::default())
}

#[test]
fn reads_every_measurement() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    assert_eq!(pzem.voltage(ADDR).unwrap(), 230.5);
    assert_eq!(pzem.current(ADDR).unwrap(), 1.25);
    assert_eq!(pzem.power(ADDR).unwrap(), 288.0);
    assert_eq!(pzem.energy(ADDR).unwrap(), 300.0);
}

#[test]
fn read_all_collects_snapshot() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    assert_eq!(pzem.read_all(ADDR).unwrap(), reading());
}

#[test]
fn startup_zero_is_tolerated() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()).with_leading_zero());
    assert_eq!(pzem.read_all(ADDR).unwrap(), reading());
}

#[test]
fn wrong_address_times_out() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    let err = pzem.voltage(DeviceAddress::new([192, 168, 1, 2])).unwrap_err();
    assert!(matches!(err, PzemError::Timeout { timeout_ms: 1000 }));
}

#[test]
fn configured_timeout_is_reported() {
    let config = PzemConfig {
        timeout: Duration::from_millis(250),
    };
    let meter = EmulatedMeter::new(ADDR, reading());
    let mut pzem = Pzem::with_config(meter, StepClock::new(1), config);
    let err = pzem.power(DeviceAddress::new([1, 1, 1, 1])).unwrap_err();
    assert!(matches!(err, PzemError::Timeout { timeout_ms: 250 }));
}

#[test]
fn corrupted_reply_is_checksum_error_and_next_request_recovers() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    pzem.transport_mut().inject_fault(Fault::CorruptChecksum);
    assert!(matches!(
        pzem.voltage(ADDR),
        Err(PzemError::Checksum { .. })
    ));
    assert_eq!(pzem.voltage(ADDR).unwrap(), 230.5);
}

#[test]
fn cross_talk_reply_is_tag_mismatch() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    pzem.transport_mut().inject_fault(Fault::WrongTag(0xA1));
    assert!(matches!(
        pzem.voltage(ADDR),
        Err(PzemError::TagMismatch {
            expected: 0xA0,
            actual: 0xA1
        })
    ));
}

#[test]
fn truncated_reply_returns_no_partial_data() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    pzem.transport_mut().inject_fault(Fault::Truncate(3));
    let err = pzem.energy(ADDR).unwrap_err();
    assert!(matches!(
        err,
        PzemError::Framing {
            received: 3,
            expected: 6
        }
    ));
}

#[test]
fn read_all_stops_at_first_failure() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    pzem.transport_mut().inject_fault(Fault::Silent);
    assert!(pzem.read_all(ADDR).unwrap_err().is_no_response());
    assert_eq!(pzem.transport().commands_seen(), 1);
}

#[test]
fn set_address_then_read_at_new_address() {
    let new_addr = DeviceAddress::new([10, 0, 0, 5]);
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    assert!(pzem.set_address(new_addr).unwrap());
    assert_eq!(pzem.transport().address(), new_addr);
    assert!(pzem.voltage(ADDR).is_err());
    assert_eq!(pzem.voltage(new_addr).unwrap(), 230.5);
}

#[test]
fn set_power_alarm_is_acknowledged() {
    let mut pzem = driver(EmulatedMeter::new(ADDR, reading()));
    assert!(pzem.set_power_alarm(ADDR, 20).unwrap());
    assert_eq!(pzem.transport().power_alarm(), Some(20));
}

/// Several meters wired to the same pair of lines: every meter sees every
/// command, only the addressed one answers.
struct SharedBus {
    meters: Vec<EmulatedMeter>,
}

impl Transport for SharedBus {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        for meter in &mut self.meters {
            meter.write(bytes)?;
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize, TransportError> {
        let mut total = 0;
        for meter in &mut self.meters {
            total += meter.available()?;
        }
        Ok(total)
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        for meter in &mut self.meters {
            if meter.available()? > 0 {
                return meter.read_byte();
            }
        }
        Err(TransportError::Empty)
    }
}

#[test]
fn addressing_selects_one_meter_on_shared_bus() {
    let kitchen = DeviceAddress::new([192, 168, 1, 1]);
    let garage = DeviceAddress::new([192, 168, 1, 2]);
    let bus = SharedBus {
        meters: vec![
            EmulatedMeter::new(kitchen, Reading::new(230.0, 0.5, 115.0, 1000.0)),
            EmulatedMeter::new(garage, Reading::new(228.3, 8.0, 1826.0, 54321.0)),
        ],
    };
    let mut pzem = Pzem::with_config(bus, StepClock::new(1), PzemConfig::default());

    assert_eq!(pzem.voltage(kitchen).unwrap(), 230.0);
    assert_eq!(pzem.voltage(garage).unwrap(), 228.3);
    assert_eq!(pzem.energy(garage).unwrap(), 54321.0);
    assert_eq!(pzem.power(kitchen).unwrap(), 115.0);
}
