pub mod direct;
pub mod lcd;
pub mod link;
pub mod pwm;

#[cfg(test)]
pub(crate) mod testutil;

use std::fmt::Debug;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum BusError {
    #[error("pin {0} is not configured as an output")]
    PinNotConfigured(u16),
    #[error("display has not been initialized")]
    NotInitialized,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("unknown operation tag {0}")]
    UnknownOp(u8),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for BusError {
    fn from(err: std::io::Error) -> Self {
        BusError::Io(err.kind())
    }
}

pub type BusResult<T> = Result<T, BusError>;

/// Direction a pin is configured for.
///
/// The display bus is write-only, so [PinMode::Input] only ever appears when a
/// pin is being released.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinMode {
    Input,
    Output,
}

impl PinMode {
    /// Decodes the wire representation: `0` is input, anything else output.
    pub fn from_wire(value: u16) -> Self {
        if value == 0 {
            PinMode::Input
        } else {
            PinMode::Output
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            PinMode::Input => 0,
            PinMode::Output => 1,
        }
    }
}

/// Logic level driven onto a pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PinLevel {
    Low,
    High,
}

impl PinLevel {
    /// Decodes the wire representation: `0` is low, anything else high.
    pub fn from_wire(value: u16) -> Self {
        if value == 0 {
            PinLevel::Low
        } else {
            PinLevel::High
        }
    }

    pub fn to_wire(self) -> u16 {
        match self {
            PinLevel::Low => 0,
            PinLevel::High => 1,
        }
    }

    pub fn is_high(self) -> bool {
        self == PinLevel::High
    }
}

impl From<bool> for PinLevel {
    fn from(value: bool) -> Self {
        if value { PinLevel::High } else { PinLevel::Low }
    }
}

/// The vocabulary of primitive operations needed to drive an HD44780-class
/// bus, and the only surface the display controller depends on.
///
/// Two implementations exist: [direct::DirectBusDriver] executes each
/// operation against physical I/O immediately, and
/// [link::ForwardingBusDriver] serializes each operation into a fixed binary
/// frame on an output stream, to be replayed elsewhere by a
/// [link::LinkReceiver]. The controller is oblivious to which one it holds.
///
/// Every operation is fire-and-forget at the protocol level; the `Result`
/// only carries host-side I/O failures. There is no way to learn whether the
/// display actually reacted.
pub trait BusDriver: Debug {
    /// Configures a pin as input or output.
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> BusResult<()>;

    /// Drives a pin high or low.
    fn set_pin_level(&mut self, pin: u16, level: PinLevel) -> BusResult<()>;

    /// Waits for the given number of microseconds.
    ///
    /// The interval must be honored as given; the controller's inter-command
    /// settle times are minimums, not hints.
    fn delay_us(&mut self, us: u16) -> BusResult<()>;

    /// Pulses the enable line: low, ≥1 µs, high, ≥1 µs, low, then a settle
    /// delay long enough for the controller to latch the data lines.
    fn pulse_enable(&mut self, pin: u16) -> BusResult<()>;

    /// Sets the backlight intensity as a 0–100 percentage.
    fn set_brightness(&mut self, pin: u16, percent: u16) -> BusResult<()>;
}

impl<T: BusDriver + ?Sized> BusDriver for Box<T> {
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> BusResult<()> {
        (**self).set_pin_mode(pin, mode)
    }

    fn set_pin_level(&mut self, pin: u16, level: PinLevel) -> BusResult<()> {
        (**self).set_pin_level(pin, level)
    }

    fn delay_us(&mut self, us: u16) -> BusResult<()> {
        (**self).delay_us(us)
    }

    fn pulse_enable(&mut self, pin: u16) -> BusResult<()> {
        (**self).pulse_enable(pin)
    }

    fn set_brightness(&mut self, pin: u16, percent: u16) -> BusResult<()> {
        (**self).set_brightness(pin, percent)
    }
}

/// Spins until the given duration has elapsed.
///
/// The enable pulse and the inter-command settle windows are shorter than
/// what the scheduler can guarantee with a sleep, so timing-critical waits
/// must not yield.
pub fn busy_wait(duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}

/// [busy_wait] for a microsecond count as carried on the bus.
pub fn busy_wait_us(us: u16) {
    busy_wait(Duration::from_micros(us as u64));
}
