//! Sysfs PWM access for the backlight channel.
//!
//! The direct bus driver maps brightness percentages onto a PWM duty cycle;
//! this module is the `/sys/class/pwm` plumbing underneath it.

use crate::{BusError, BusResult};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

pub struct SysfsPwmChip {
    base_path: PathBuf,
}

impl SysfsPwmChip {
    pub fn get_chip(index: usize) -> BusResult<Self> {
        let path = Path::new("/sys/class/pwm");
        let chip_path = path.join(format!("pwmchip{}", index));
        if !chip_path.exists() {
            return Err(BusError::InvalidArgument);
        }
        Ok(SysfsPwmChip {
            base_path: chip_path,
        })
    }

    pub fn channels(&self) -> BusResult<usize> {
        let path = self.base_path.join("npwm");
        let content = std::fs::read_to_string(&path)
            .map_err(|_| BusError::Other("reading PWM channel count failed".to_string()))?;
        let count: usize = content
            .trim()
            .parse()
            .map_err(|_| BusError::Other("parsing PWM channel count failed".to_string()))?;
        Ok(count)
    }

    /// Exports the channel and returns a handle to it.
    pub fn get_channel(&self, index: usize) -> BusResult<SysfsPwmPin> {
        let export_path = self.base_path.join("export");
        std::fs::write(&export_path, index.to_string())
            .map_err(|_| BusError::Other("exporting PWM channel failed".to_string()))?;
        let path = self.base_path.join(format!("pwm{}", index));
        if !path.exists() {
            return Err(BusError::InvalidArgument);
        }
        Ok(SysfsPwmPin { base_path: path })
    }
}

impl Debug for SysfsPwmChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmChip({:?})", self.base_path)
    }
}

pub struct SysfsPwmPin {
    base_path: PathBuf,
}

impl Debug for SysfsPwmPin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SysfsPwmPin({:?})", self.base_path)
    }
}

impl SysfsPwmPin {
    pub fn period_ns(&self) -> BusResult<u32> {
        let path = self.base_path.join("period");
        let content = std::fs::read_to_string(&path)?;
        let period: u32 = content
            .trim()
            .parse()
            .map_err(|_| BusError::Other("parsing PWM period failed".to_string()))?;
        Ok(period)
    }

    pub fn set_period_ns(&mut self, period_ns: u32) -> BusResult<()> {
        let path = self.base_path.join("period");
        std::fs::write(&path, period_ns.to_string())?;
        Ok(())
    }

    pub fn duty_ns(&self) -> BusResult<u32> {
        let path = self.base_path.join("duty_cycle");
        let content = std::fs::read_to_string(&path)?;
        let duty: u32 = content
            .trim()
            .parse()
            .map_err(|_| BusError::Other("parsing PWM duty cycle failed".to_string()))?;
        Ok(duty)
    }

    pub fn set_duty_ns(&mut self, duty_ns: u32) -> BusResult<()> {
        let path = self.base_path.join("duty_cycle");
        std::fs::write(&path, duty_ns.to_string())?;
        Ok(())
    }

    pub fn enable(&mut self) -> BusResult<()> {
        let path = self.base_path.join("enable");
        std::fs::write(&path, "1")?;
        Ok(())
    }

    pub fn disable(&mut self) -> BusResult<()> {
        let path = self.base_path.join("enable");
        std::fs::write(&path, "0")?;
        Ok(())
    }
}
