//! Frame encoding and decoding for the forwarding channel.
//!
//! Frame layout, little-endian, no padding:
//! - KIND (1 byte): operation tag, see [OpKind]
//! - P1 (2 bytes): pin number, or the wait duration for [OpKind::WaitMicros]
//! - P2 (2 bytes): mode/level/brightness value; 0 when unused
//!
//! The layout is a wire contract shared with independently built receivers,
//! so it is spelled out field by field here rather than derived from any
//! in-memory representation.

use crate::{BusError, BusResult, PinLevel, PinMode};

/// Size of one encoded frame on the wire.
pub const FRAME_LEN: usize = 5;

/// Operation tag carried in the first frame byte.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum OpKind {
    SetPinMode = 1,
    SetPinLevel = 2,
    WaitMicros = 3,
    PulseEnable = 4,
    SetBrightness = 5,
}

impl OpKind {
    pub fn from_u8(tag: u8) -> BusResult<Self> {
        match tag {
            1 => Ok(OpKind::SetPinMode),
            2 => Ok(OpKind::SetPinLevel),
            3 => Ok(OpKind::WaitMicros),
            4 => Ok(OpKind::PulseEnable),
            5 => Ok(OpKind::SetBrightness),
            _ => Err(BusError::UnknownOp(tag)),
        }
    }
}

/// One bus operation as exchanged on the forwarding channel.
///
/// Constructed transiently per bus call, written, and discarded; the receiver
/// reconstructs it from raw bytes, consumes it, and discards it. Frames are
/// never persisted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OpFrame {
    pub kind: OpKind,
    pub p1: u16,
    pub p2: u16,
}

impl OpFrame {
    pub fn set_pin_mode(pin: u16, mode: PinMode) -> Self {
        OpFrame {
            kind: OpKind::SetPinMode,
            p1: pin,
            p2: mode.to_wire(),
        }
    }

    pub fn set_pin_level(pin: u16, level: PinLevel) -> Self {
        OpFrame {
            kind: OpKind::SetPinLevel,
            p1: pin,
            p2: level.to_wire(),
        }
    }

    pub fn wait_us(us: u16) -> Self {
        OpFrame {
            kind: OpKind::WaitMicros,
            p1: us,
            p2: 0,
        }
    }

    pub fn pulse_enable(pin: u16) -> Self {
        OpFrame {
            kind: OpKind::PulseEnable,
            p1: pin,
            p2: 0,
        }
    }

    pub fn set_brightness(pin: u16, percent: u16) -> Self {
        OpFrame {
            kind: OpKind::SetBrightness,
            p1: pin,
            p2: percent,
        }
    }

    /// Encodes the frame into its fixed wire representation.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let p1 = self.p1.to_le_bytes();
        let p2 = self.p2.to_le_bytes();
        [self.kind as u8, p1[0], p1[1], p2[0], p2[1]]
    }

    /// Decodes one frame from its wire representation.
    ///
    /// Fails with [BusError::UnknownOp] when the tag byte is not a known
    /// operation.
    pub fn decode(bytes: &[u8; FRAME_LEN]) -> BusResult<Self> {
        let kind = OpKind::from_u8(bytes[0])?;
        let p1 = u16::from_le_bytes([bytes[1], bytes[2]]);
        let p2 = u16::from_le_bytes([bytes[3], bytes[4]]);
        Ok(OpFrame { kind, p1, p2 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_pin_level_golden_bytes() {
        let frame = OpFrame::set_pin_level(7, PinLevel::High);
        assert_eq!(frame.encode(), [0x02, 0x07, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn parameters_encode_little_endian() {
        let frame = OpFrame::wait_us(0x1234);
        assert_eq!(frame.encode(), [0x03, 0x34, 0x12, 0x00, 0x00]);

        let frame = OpFrame::set_brightness(0x0102, 0xABCD);
        assert_eq!(frame.encode(), [0x05, 0x02, 0x01, 0xCD, 0xAB]);
    }

    #[test]
    fn unused_parameter_is_zero() {
        assert_eq!(OpFrame::pulse_enable(9).encode(), [0x04, 0x09, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn roundtrip_every_kind() {
        let frames = [
            OpFrame::set_pin_mode(3, PinMode::Output),
            OpFrame::set_pin_level(7, PinLevel::Low),
            OpFrame::wait_us(4500),
            OpFrame::pulse_enable(11),
            OpFrame::set_brightness(6, 80),
        ];
        for frame in frames {
            assert_eq!(OpFrame::decode(&frame.encode()).unwrap(), frame);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = OpFrame::decode(&[0x09, 0x01, 0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, crate::BusError::UnknownOp(9));

        let err = OpFrame::decode(&[0x00, 0x00, 0x00, 0x00, 0x00]).unwrap_err();
        assert_eq!(err, crate::BusError::UnknownOp(0));
    }

    proptest! {
        #[test]
        fn roundtrip_arbitrary_frames(tag in 1u8..=5, p1 in any::<u16>(), p2 in any::<u16>()) {
            let frame = OpFrame {
                kind: OpKind::from_u8(tag).unwrap(),
                p1,
                p2,
            };
            prop_assert_eq!(OpFrame::decode(&frame.encode()).unwrap(), frame);
        }
    }
}
