mod port;

use crate::port::SerialLinkPort;
use dotenv::dotenv;
use lcdlink_bus::direct::DirectBusDriver;
use lcdlink_bus::link::LinkReceiver;
use lcdlink_bus::pwm::SysfsPwmChip;
use log::{debug, info};
use std::env::var;
use std::path::Path;
use std::time::Duration;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    info!("lcdlink remote agent starting...");

    let device = var("LCDLINK_REMOTE_DEV").unwrap_or_else(|_| "/dev/ttyAMA0".to_string());
    let chip_path = var("LCDLINK_GPIOCHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let idle_ms: u64 = match var("LCDLINK_IDLE_MS") {
        Ok(value) => value.parse()?,
        Err(_) => 100,
    };

    info!("replaying {} onto {}", device, chip_path);

    debug!("Initializing GPIO driver...");
    let chip = gpiod::Chip::new(&chip_path)?;
    let mut driver = DirectBusDriver::new(chip);
    debug!("{:?} initialized.", driver);

    if let Ok(pin) = var("LCDLINK_BACKLIGHT_PIN") {
        let pin: u16 = pin.parse()?;
        let pwm_chip: usize = match var("LCDLINK_PWM_CHIP") {
            Ok(value) => value.parse()?,
            Err(_) => 0,
        };
        let channel: usize = match var("LCDLINK_PWM_CHANNEL") {
            Ok(value) => value.parse()?,
            Err(_) => 0,
        };
        let pwm = SysfsPwmChip::get_chip(pwm_chip)?;
        driver.attach_backlight(pin, pwm.get_channel(channel)?);
        info!("backlight on pin {} via pwmchip{} channel {}", pin, pwm_chip, channel);
    }

    let port = SerialLinkPort::open(Path::new(&device))?;
    let mut receiver =
        LinkReceiver::new(driver, port).with_idle_wait(Duration::from_millis(idle_ms));

    info!("lcdlink remote agent ready.");
    receiver.run()?;
    Ok(())
}
