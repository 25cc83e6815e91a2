//! pzemlink core library: serial protocol driver for PZEM-004T energy meters.
//!
//! The meter answers fixed-length request frames with fixed-length response
//! frames over a 9600 baud serial line. Several meters can share one bus;
//! each request carries a 4-byte device address. This crate implements the
//! wire protocol (layout/reader/command/response/decode), a blocking driver
//! that assembles responses from a byte-at-a-time stream under a timeout,
//! and two in-process transports for tests and dry runs. Opening a real
//! serial port is left to the caller.
//!
//! Invariants:
//! - Command frames are 7 bytes, response frames 6 bytes, each ending with
//!   the 8-bit additive checksum of the preceding bytes.
//! - A response is only decoded once its length, checksum and tag are valid.
//! - One request is in flight per driver at any time.
//!
//! Version française (résumé):
//! Cette crate implémente le protocole série des compteurs PZEM-004T :
//! trames de commande (7 octets) et de réponse (6 octets) avec somme de
//! contrôle additive sur 8 bits, lecture bornée par un délai, décodage des
//! mesures. L'ouverture du port série reste à la charge de l'appelant.
//!
//! # Examples
//! ```no_run
//! use pzemlink_core::{DeviceAddress, MemoryTransport, Pzem};
//!
//! let mut pzem = Pzem::new(MemoryTransport::new());
//! let volts = pzem.voltage(DeviceAddress::new([192, 168, 1, 1]))?;
//! println!("{volts:.1} V");
//! # Ok::<(), pzemlink_core::PzemError>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod clock;
mod driver;
mod error;
pub mod protocol;
pub mod transport;

pub use clock::{Clock, MonotonicClock, StepClock};
pub use driver::{Pzem, PzemConfig};
pub use error::PzemError;
pub use protocol::{Command, CommandFrame, DeviceAddress, Quantity, ResponseFrame};
pub use transport::{EmulatedMeter, Fault, MemoryTransport, Transport, TransportError};

/// Line speed the meter is fixed at (8N1).
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// How long a request waits for its response by default.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// One snapshot of all four measurements.
///
/// # Examples
/// ```
/// use pzemlink_core::{Quantity, Reading};
///
/// let reading = Reading::new(230.5, 1.25, 288.0, 300.0);
/// assert_eq!(reading.get(Quantity::Energy), 300.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Volts, 0.1 V resolution.
    pub voltage: f64,
    /// Amps, 0.01 A resolution.
    pub current: f64,
    /// Watts.
    pub power: f64,
    /// Watt-hours, 24-bit counter.
    pub energy: f64,
}

impl Reading {
    pub fn new(voltage: f64, current: f64, power: f64, energy: f64) -> Self {
        Self {
            voltage,
            current,
            power,
            energy,
        }
    }

    pub fn get(&self, quantity: Quantity) -> f64 {
        match quantity {
            Quantity::Voltage => self.voltage,
            Quantity::Current => self.current,
            Quantity::Power => self.power,
            Quantity::Energy => self.energy,
        }
    }
}
