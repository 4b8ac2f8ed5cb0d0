//! Receiver side of the forwarding channel.

use crate::link::{LinkPort, OpFrame, OpKind, FRAME_LEN};
use crate::{BusDriver, BusError, BusResult, PinLevel, PinMode};
use log::{trace, warn};
use std::thread;
use std::time::Duration;

/// Outcome of one [LinkReceiver::poll] tick.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Poll {
    /// A full frame was read and replayed.
    Replayed(OpFrame),
    /// Fewer than [FRAME_LEN] bytes were read; they were discarded.
    ShortFrame(usize),
    /// A frame with an unrecognized tag was read and skipped.
    Unknown(u8),
    /// Nothing available; the idle interval was slept.
    Idle,
}

/// Decodes frames off an input stream and replays each operation against the
/// owned bus driver, one frame per poll tick.
///
/// Short reads are discarded wholesale: the receiver keeps no buffer across
/// ticks, so a frame split over two reads loses its leading bytes and the
/// trailing bytes are then dropped as another short read. Senders write whole
/// frames at once, which keeps this from occurring on links that preserve
/// write boundaries; on links that do not, a split frame is lost (and only
/// that frame).
///
/// Unrecognized operation tags are reported and skipped; they are not fatal.
pub struct LinkReceiver<D: BusDriver, P: LinkPort> {
    driver: D,
    port: P,
    idle_wait: Duration,
}

impl<D: BusDriver, P: LinkPort> LinkReceiver<D, P> {
    pub fn new(driver: D, port: P) -> Self {
        LinkReceiver {
            driver,
            port,
            idle_wait: Duration::from_millis(100),
        }
    }

    /// Sets the interval slept when a poll finds the stream empty.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Processes at most one frame. Call once per tick of the control loop.
    pub fn poll(&mut self) -> BusResult<Poll> {
        if self.port.available()? == 0 {
            thread::sleep(self.idle_wait);
            return Ok(Poll::Idle);
        }

        let mut buf = [0u8; FRAME_LEN];
        let count = self.port.read(&mut buf)?;
        if count < FRAME_LEN {
            warn!("short read of {} bytes, dropping", count);
            return Ok(Poll::ShortFrame(count));
        }

        let frame = match OpFrame::decode(&buf) {
            Ok(frame) => frame,
            Err(BusError::UnknownOp(tag)) => {
                warn!("unknown operation tag {}, skipping", tag);
                return Ok(Poll::Unknown(tag));
            }
            Err(err) => return Err(err),
        };

        trace!("replaying {:?}", frame);
        self.replay(frame)?;
        Ok(Poll::Replayed(frame))
    }

    fn replay(&mut self, frame: OpFrame) -> BusResult<()> {
        match frame.kind {
            OpKind::SetPinMode => self
                .driver
                .set_pin_mode(frame.p1, PinMode::from_wire(frame.p2)),
            OpKind::SetPinLevel => self
                .driver
                .set_pin_level(frame.p1, PinLevel::from_wire(frame.p2)),
            OpKind::WaitMicros => self.driver.delay_us(frame.p1),
            OpKind::PulseEnable => self.driver.pulse_enable(frame.p1),
            OpKind::SetBrightness => self.driver.set_brightness(frame.p1, frame.p2),
        }
    }

    /// Polls forever.
    pub fn run(&mut self) -> BusResult<()> {
        loop {
            self.poll()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::{ForwardingBusDriver, MemoryLink};
    use crate::testutil::RecordingDriver;
    use std::io::Write;

    fn receiver(link: MemoryLink) -> LinkReceiver<RecordingDriver, MemoryLink> {
        LinkReceiver::new(RecordingDriver::default(), link).with_idle_wait(Duration::ZERO)
    }

    #[test]
    fn golden_frame_replays_one_pin_write() {
        let mut link = MemoryLink::new();
        link.write_all(&[0x02, 0x07, 0x00, 0x01, 0x00]).unwrap();

        let mut receiver = receiver(link);
        let outcome = receiver.poll().unwrap();

        assert_eq!(
            outcome,
            Poll::Replayed(OpFrame::set_pin_level(7, PinLevel::High)),
        );
        assert_eq!(
            receiver.driver_mut().ops,
            vec![OpFrame::set_pin_level(7, PinLevel::High)],
        );
    }

    #[test]
    fn split_frame_is_discarded_not_reassembled() {
        let frame = OpFrame::set_pin_level(7, PinLevel::High).encode();

        let mut link = MemoryLink::new();
        link.write_all(&frame[..3]).unwrap();
        let mut receiver = receiver(link);

        // First tick sees only 3 bytes and throws them away.
        assert_eq!(receiver.poll().unwrap(), Poll::ShortFrame(3));

        // The rest of the frame arrives, but its first bytes are gone; the
        // remainder is dropped as another short read.
        receiver.port.write_all(&frame[3..]).unwrap();
        assert_eq!(receiver.poll().unwrap(), Poll::ShortFrame(2));

        assert!(receiver.driver_mut().ops.is_empty());
    }

    #[test]
    fn unknown_tag_is_skipped_and_processing_continues() {
        let mut link = MemoryLink::new();
        link.write_all(&[0x09, 0x01, 0x00, 0x02, 0x00]).unwrap();
        link.write_all(&OpFrame::pulse_enable(4).encode()).unwrap();

        let mut receiver = receiver(link);
        assert_eq!(receiver.poll().unwrap(), Poll::Unknown(9));
        assert_eq!(
            receiver.poll().unwrap(),
            Poll::Replayed(OpFrame::pulse_enable(4)),
        );
        assert_eq!(receiver.driver_mut().ops, vec![OpFrame::pulse_enable(4)]);
    }

    #[test]
    fn empty_stream_is_an_idle_tick() {
        let mut receiver = receiver(MemoryLink::new());
        assert_eq!(receiver.poll().unwrap(), Poll::Idle);
        assert!(receiver.driver_mut().ops.is_empty());
    }

    #[test]
    fn forwarded_sequence_replays_in_order() {
        let mut sender = ForwardingBusDriver::new(MemoryLink::new());
        sender.set_pin_mode(12, PinMode::Output).unwrap();
        sender.set_pin_level(12, PinLevel::High).unwrap();
        sender.delay_us(150).unwrap();
        sender.pulse_enable(8).unwrap();
        sender.set_brightness(5, 100).unwrap();

        let mut receiver = receiver(sender.into_inner());
        for _ in 0..5 {
            assert!(matches!(receiver.poll().unwrap(), Poll::Replayed(_)));
        }
        assert_eq!(receiver.poll().unwrap(), Poll::Idle);

        assert_eq!(
            receiver.driver_mut().ops,
            vec![
                OpFrame::set_pin_mode(12, PinMode::Output),
                OpFrame::set_pin_level(12, PinLevel::High),
                OpFrame::wait_us(150),
                OpFrame::pulse_enable(8),
                OpFrame::set_brightness(5, 100),
            ],
        );
    }
}
