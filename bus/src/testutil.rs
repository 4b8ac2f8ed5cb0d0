//! Software stand-ins and decoding helpers shared by the unit tests.

use crate::link::{OpFrame, OpKind};
use crate::{BusDriver, BusResult, PinLevel, PinMode};
use std::collections::HashMap;

/// Records every bus operation as the frame it would produce on the wire,
/// without touching hardware or sleeping.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    pub ops: Vec<OpFrame>,
}

impl BusDriver for RecordingDriver {
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> BusResult<()> {
        self.ops.push(OpFrame::set_pin_mode(pin, mode));
        Ok(())
    }

    fn set_pin_level(&mut self, pin: u16, level: PinLevel) -> BusResult<()> {
        self.ops.push(OpFrame::set_pin_level(pin, level));
        Ok(())
    }

    fn delay_us(&mut self, us: u16) -> BusResult<()> {
        self.ops.push(OpFrame::wait_us(us));
        Ok(())
    }

    fn pulse_enable(&mut self, pin: u16) -> BusResult<()> {
        self.ops.push(OpFrame::pulse_enable(pin));
        Ok(())
    }

    fn set_brightness(&mut self, pin: u16, percent: u16) -> BusResult<()> {
        self.ops.push(OpFrame::set_brightness(pin, percent));
        Ok(())
    }
}

/// Replays recorded pin levels and samples the data pins at every enable
/// pulse, yielding each latched value (LSb-first over `data_pins`) together
/// with the register-select level at that moment.
pub fn pulsed_writes(ops: &[OpFrame], data_pins: &[u16], rs_pin: u16) -> Vec<(u8, bool)> {
    let mut levels: HashMap<u16, u16> = HashMap::new();
    let mut writes = Vec::new();
    for op in ops {
        match op.kind {
            OpKind::SetPinLevel => {
                levels.insert(op.p1, op.p2);
            }
            OpKind::PulseEnable => {
                let mut value = 0u8;
                for (i, pin) in data_pins.iter().enumerate() {
                    if levels.get(pin).copied().unwrap_or(0) != 0 {
                        value |= 1 << i;
                    }
                }
                let rs = levels.get(&rs_pin).copied().unwrap_or(0) != 0;
                writes.push((value, rs));
            }
            _ => {}
        }
    }
    writes
}

/// Recombines nibble writes (high nibble first) into full bytes.
pub fn bytes_from_nibble_writes(writes: &[(u8, bool)]) -> Vec<(u8, bool)> {
    writes
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| ((pair[0].0 << 4) | (pair[1].0 & 0x0F), pair[0].1))
        .collect()
}

/// The wait durations issued, in order.
pub fn waits(ops: &[OpFrame]) -> Vec<u16> {
    ops.iter()
        .filter(|op| op.kind == OpKind::WaitMicros)
        .map(|op| op.p1)
        .collect()
}

pub fn pulse_count(ops: &[OpFrame]) -> usize {
    ops.iter().filter(|op| op.kind == OpKind::PulseEnable).count()
}
