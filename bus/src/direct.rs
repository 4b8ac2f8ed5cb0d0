//! Bus driver with direct output to physical pins.

use crate::pwm::SysfsPwmPin;
use crate::{busy_wait_us, BusDriver, BusError, BusResult, PinLevel, PinMode};
use log::{trace, warn};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

/// Brightness output range: 0 % maps to the low end, 100 % to the high end.
/// Values below 20 leave most backlights visibly dark.
const BRIGHTNESS_MIN: u32 = 20;
const BRIGHTNESS_MAX: u32 = 225;

/// Maps a 0–100 percentage linearly into the 8-bit output range.
pub(crate) fn map_percent(percent: u16) -> u32 {
    let percent = percent.min(100) as u32;
    BRIGHTNESS_MIN + percent * (BRIGHTNESS_MAX - BRIGHTNESS_MIN) / 100
}

/// Executes every bus operation immediately against the GPIO character
/// device, with backlight intensity going out through a sysfs PWM channel.
///
/// Output lines are requested lazily on [BusDriver::set_pin_mode] and cached
/// per pin number. Pin numbers are line offsets on the owned chip; wiring
/// them to the wrong lines is not detectable here.
pub struct DirectBusDriver {
    chip: gpiod::Chip,
    outputs: HashMap<u16, gpiod::Lines<gpiod::Output>>,
    backlights: HashMap<u16, SysfsPwmPin>,
}

impl DirectBusDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        DirectBusDriver {
            chip,
            outputs: HashMap::new(),
            backlights: HashMap::new(),
        }
    }

    /// Registers a PWM channel as the analog output behind `pin`.
    ///
    /// [BusDriver::set_brightness] calls for unregistered pins are dropped
    /// with a warning.
    pub fn attach_backlight(&mut self, pin: u16, pwm: SysfsPwmPin) {
        self.backlights.insert(pin, pwm);
    }
}

impl Debug for DirectBusDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DirectBusDriver({})", self.chip.name())
    }
}

impl BusDriver for DirectBusDriver {
    fn set_pin_mode(&mut self, pin: u16, mode: PinMode) -> BusResult<()> {
        // Backlight pins belong to the PWM subsystem, not to gpiod.
        if self.backlights.contains_key(&pin) {
            return Ok(());
        }

        match mode {
            PinMode::Output => {
                if !self.outputs.contains_key(&pin) {
                    let line = self.chip.request_lines(
                        gpiod::Options::output([pin as u32])
                            .consumer(env!("CARGO_PKG_NAME")),
                    )?;
                    self.outputs.insert(pin, line);
                }
            }
            PinMode::Input => {
                // Write-only bus: releasing the line is all "input" means.
                self.outputs.remove(&pin);
            }
        }
        Ok(())
    }

    fn set_pin_level(&mut self, pin: u16, level: PinLevel) -> BusResult<()> {
        trace!("pin {} -> {:?}", pin, level);
        let line = self
            .outputs
            .get(&pin)
            .ok_or(BusError::PinNotConfigured(pin))?;
        line.set_values([level.is_high()])?;
        Ok(())
    }

    fn delay_us(&mut self, us: u16) -> BusResult<()> {
        busy_wait_us(us);
        Ok(())
    }

    fn pulse_enable(&mut self, pin: u16) -> BusResult<()> {
        self.set_pin_level(pin, PinLevel::Low)?;
        busy_wait_us(1);
        self.set_pin_level(pin, PinLevel::High)?;
        busy_wait_us(1); // enable pulse must be >450 ns
        self.set_pin_level(pin, PinLevel::Low)?;
        busy_wait_us(100); // commands need >37 µs to settle
        Ok(())
    }

    fn set_brightness(&mut self, pin: u16, percent: u16) -> BusResult<()> {
        let Some(pwm) = self.backlights.get_mut(&pin) else {
            warn!("brightness for pin {} with no PWM channel attached", pin);
            return Ok(());
        };
        let value = map_percent(percent);
        let period = pwm.period_ns()?;
        let duty = (period as u64 * value as u64 / 255) as u32;
        trace!("backlight pin {} -> {} % (duty {} ns)", pin, percent, duty);
        pwm.set_duty_ns(duty)?;
        pwm.enable()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_endpoints_hit_range_bounds() {
        assert_eq!(map_percent(0), 20);
        assert_eq!(map_percent(100), 225);
    }

    #[test]
    fn percent_above_full_scale_clamps() {
        assert_eq!(map_percent(101), 225);
        assert_eq!(map_percent(u16::MAX), 225);
    }

    #[test]
    fn percent_mapping_is_monotonic() {
        let mut last = 0;
        for percent in 0..=100 {
            let value = map_percent(percent);
            assert!(value >= last, "map_percent({}) regressed", percent);
            last = value;
        }
    }
}
