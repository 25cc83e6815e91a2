//! Measurement decoding.
//!
//! Every reading uses the first three data bytes; the fourth is reserved by
//! the meter and ignored. Voltage and current split into an integer part
//! (big-endian `u16`) and a fractional byte scaled by 10 and 100. Power is a
//! plain `u16` and energy a 24-bit big-endian counter.
//!
//! The `encode_*` helpers are the inverse used on the meter side. They emit
//! the canonical fractional digit range (0-9 for tenths, 0-99 for
//! hundredths) and saturate at the largest value the field can carry.

use std::fmt;

use super::command::Command;
use super::layout::RESPONSE_DATA_LEN;

pub type ResponseData = [u8; RESPONSE_DATA_LEN];

const ENERGY_MAX_WH: u32 = 0x00FF_FFFF;

/// The four readable measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Voltage,
    Current,
    Power,
    Energy,
}

impl Quantity {
    pub const ALL: [Quantity; 4] = [
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Power,
        Quantity::Energy,
    ];

    pub const fn command(self) -> Command {
        match self {
            Quantity::Voltage => Command::Voltage,
            Quantity::Current => Command::Current,
            Quantity::Power => Command::Power,
            Quantity::Energy => Command::Energy,
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Quantity::Voltage => "V",
            Quantity::Current => "A",
            Quantity::Power => "W",
            Quantity::Energy => "Wh",
        }
    }

    /// Number of decimals the meter resolves for this quantity.
    pub const fn precision(self) -> usize {
        match self {
            Quantity::Voltage => 1,
            Quantity::Current => 2,
            Quantity::Power | Quantity::Energy => 0,
        }
    }

    pub fn from_command(command: Command) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.command() == command)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command().name())
    }
}

fn high_word(data: &ResponseData) -> f64 {
    f64::from(u16::from_be_bytes([data[0], data[1]]))
}

/// # Examples
/// ```
/// use pzemlink_core::protocol::decode_voltage;
///
/// assert_eq!(decode_voltage(&[0x00, 0xE6, 0x05, 0x00]), 230.5);
/// ```
pub fn decode_voltage(data: &ResponseData) -> f64 {
    high_word(data) + f64::from(data[2]) / 10.0
}

pub fn decode_current(data: &ResponseData) -> f64 {
    high_word(data) + f64::from(data[2]) / 100.0
}

pub fn decode_power(data: &ResponseData) -> f64 {
    high_word(data)
}

pub fn decode_energy(data: &ResponseData) -> f64 {
    f64::from(u32::from_be_bytes([0, data[0], data[1], data[2]]))
}

/// Acknowledgements carry no payload: reaching this point with a validated
/// frame is the success signal.
pub fn decode_ack(_data: &ResponseData) -> bool {
    true
}

pub fn decode_quantity(quantity: Quantity, data: &ResponseData) -> f64 {
    match quantity {
        Quantity::Voltage => decode_voltage(data),
        Quantity::Current => decode_current(data),
        Quantity::Power => decode_power(data),
        Quantity::Energy => decode_energy(data),
    }
}

fn split_scaled(value: f64, scale: u32) -> ResponseData {
    let max = u32::from(u16::MAX) * scale + (scale - 1);
    // `as` saturates: negative and NaN inputs become 0.
    let scaled = ((value * f64::from(scale)).round() as u32).min(max);
    let [hi, lo] = ((scaled / scale) as u16).to_be_bytes();
    [hi, lo, (scaled % scale) as u8, 0]
}

pub fn encode_voltage(volts: f64) -> ResponseData {
    split_scaled(volts, 10)
}

pub fn encode_current(amps: f64) -> ResponseData {
    split_scaled(amps, 100)
}

pub fn encode_power(watts: f64) -> ResponseData {
    split_scaled(watts, 1)
}

pub fn encode_energy(watt_hours: f64) -> ResponseData {
    let value = (watt_hours.round() as u32).min(ENERGY_MAX_WH);
    let [_, b0, b1, b2] = value.to_be_bytes();
    [b0, b1, b2, 0]
}

pub fn encode_quantity(quantity: Quantity, value: f64) -> ResponseData {
    match quantity {
        Quantity::Voltage => encode_voltage(value),
        Quantity::Current => encode_current(value),
        Quantity::Power => encode_power(value),
        Quantity::Energy => encode_energy(value),
    }
}
