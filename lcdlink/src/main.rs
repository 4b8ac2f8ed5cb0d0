mod config;

use crate::config::{Config, Output};
use dotenv::dotenv;
use lcdlink_bus::direct::DirectBusDriver;
use lcdlink_bus::lcd::bargraph::BarGraph;
use lcdlink_bus::lcd::hd44780::{Font, Hd44780};
use lcdlink_bus::link::ForwardingBusDriver;
use lcdlink_bus::pwm::SysfsPwmChip;
use lcdlink_bus::BusDriver;
use log::{debug, info};
use std::fs::OpenOptions;
use std::thread;
use std::time::Duration;
use sysinfo::System;

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("lcdlink starting...");
    info!(
        "Host {} ({})",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    debug!("Trying to load config...");
    let config = if let Some(config) = Config::try_load() {
        info!("Config loaded.");
        config
    } else {
        info!("Config not found. Using default");
        let config = Config::default();
        config.save()?;
        info!("Default config saved.");
        config
    };

    let driver: Box<dyn BusDriver> = match &config.output {
        Output::Direct => {
            debug!("Initializing GPIO driver on {}...", config.gpiochip);
            let chip = gpiod::Chip::new(&config.gpiochip)?;
            let mut driver = DirectBusDriver::new(chip);
            if let (Some(pin), Some(pwm_chip)) = (config.backlight_pin, config.pwm_chip) {
                let pwm = SysfsPwmChip::get_chip(pwm_chip)?;
                let channel = config.pwm_channel.unwrap_or(0);
                driver.attach_backlight(pin, pwm.get_channel(channel)?);
                info!("backlight on pin {} via pwmchip{} channel {}", pin, pwm_chip, channel);
            }
            Box::new(driver)
        }
        Output::Forward { device } => {
            debug!("Forwarding to {}...", device);
            let out = OpenOptions::new().write(true).open(device)?;
            Box::new(ForwardingBusDriver::new(out))
        }
    };

    debug!("Initializing display...");
    let mut lcd = Hd44780::new(driver, config.pins()?);
    lcd.begin(config.cols, config.rows, Font::Dots5x8)?;
    lcd.set_brightness(config.brightness)?;
    debug!("Display initialized.");

    let mut bar = BarGraph::new(&mut lcd, config.cols, 0, 1)?;
    lcd.set_cursor(0, 0)?;
    lcd.print("CPU load")?;

    info!("Starting main loop...");

    let mut sys = System::new();
    loop {
        sys.refresh_cpu_usage();
        let usage = sys.global_cpu_usage().round() as u32;
        bar.draw(&mut lcd, usage.min(100), 100)?;

        thread::sleep(Duration::from_millis(500));
    }
}
