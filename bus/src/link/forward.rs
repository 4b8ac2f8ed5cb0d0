//! Bus driver that forwards every operation over a byte stream.

use crate::link::OpFrame;
use crate::{BusDriver, BusResult, PinLevel, PinMode};
use log::trace;
use std::fmt::{Debug, Formatter};
use std::io::Write;

/// Serializes each bus operation into one [OpFrame] and writes it to the
/// owned output stream, to be replayed by a
/// [LinkReceiver](crate::link::LinkReceiver) on the other end.
///
/// Delays are forwarded as frames too, never slept locally: the sender cannot
/// assume the remote side executes at its own rate, so every delay the
/// replayed sequence needs must travel as data.
///
/// No batching and no flow control; a frame either writes fully or the
/// stream's own failure surfaces as an error.
pub struct ForwardingBusDriver<W: Write> {
    out: W,
}

impl<W: Write> ForwardingBusDriver<W> {
    pub fn new(out: W) -> Self {
        ForwardingBusDriver { out }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, frame: OpFrame) -> BusResult<()> {
        trace!("forwarding {:?}", frame);
        self.out.write_all(&frame.encode())?;
        Ok(())
    }
}

impl<W: Write> Debug for ForwardingBusDriver<W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ForwardingBusDriver")
    }
}

impl<W: Write> BusDriver for ForwardingBusDriver<W> {
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> BusResult<()> {
        self.emit(OpFrame::set_pin_mode(pin, mode))
    }

    fn set_pin_level(&mut self, pin: u16, level: PinLevel) -> BusResult<()> {
        self.emit(OpFrame::set_pin_level(pin, level))
    }

    fn delay_us(&mut self, us: u16) -> BusResult<()> {
        self.emit(OpFrame::wait_us(us))
    }

    fn pulse_enable(&mut self, pin: u16) -> BusResult<()> {
        self.emit(OpFrame::pulse_enable(pin))
    }

    fn set_brightness(&mut self, pin: u16, percent: u16) -> BusResult<()> {
        self.emit(OpFrame::set_brightness(pin, percent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operation_becomes_one_frame() {
        let mut driver = ForwardingBusDriver::new(Vec::new());
        driver.set_pin_mode(4, PinMode::Output).unwrap();
        driver.set_pin_level(7, PinLevel::High).unwrap();
        driver.delay_us(4500).unwrap();
        driver.pulse_enable(4).unwrap();
        driver.set_brightness(10, 55).unwrap();

        let bytes = driver.into_inner();
        assert_eq!(
            bytes,
            vec![
                0x01, 0x04, 0x00, 0x01, 0x00, // mode
                0x02, 0x07, 0x00, 0x01, 0x00, // level
                0x03, 0x94, 0x11, 0x00, 0x00, // wait 4500
                0x04, 0x04, 0x00, 0x00, 0x00, // pulse
                0x05, 0x0A, 0x00, 0x37, 0x00, // brightness 55
            ],
        );
    }

    #[test]
    fn frames_are_fixed_width_and_contiguous() {
        let mut driver = ForwardingBusDriver::new(Vec::new());
        for pin in 0..10u16 {
            driver.pulse_enable(pin).unwrap();
        }
        assert_eq!(driver.into_inner().len(), 10 * crate::link::FRAME_LEN);
    }
}
