use lcdlink_bus::lcd::hd44780::{DataPins, Pins};
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;

/// Where the encoded bus operations go.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Output {
    /// Drive local pins through the GPIO character device.
    Direct,
    /// Forward frames to a remote agent over the given device.
    Forward { device: String },
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub output: Output,
    pub gpiochip: String,
    pub rs_pin: u16,
    pub rw_pin: Option<u16>,
    pub enable_pin: u16,
    pub data_pins: Vec<u16>,
    pub backlight_pin: Option<u16>,
    pub pwm_chip: Option<usize>,
    pub pwm_channel: Option<usize>,
    pub cols: u8,
    pub rows: u8,
    pub brightness: u8,
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let file = std::fs::File::create(Path::new(config_str))?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// The configured pin assignment; `data_pins` must list 4 or 8 pins.
    pub fn pins(&self) -> eyre::Result<Pins> {
        let data = match self.data_pins.as_slice() {
            &[a, b, c, d] => DataPins::Four([a, b, c, d]),
            &[a, b, c, d, e, f, g, h] => DataPins::Eight([a, b, c, d, e, f, g, h]),
            _ => return Err(eyre::eyre!("data_pins must list 4 or 8 pins")),
        };
        Ok(Pins {
            rs: self.rs_pin,
            rw: self.rw_pin,
            enable: self.enable_pin,
            data,
            backlight: self.backlight_pin,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output: Output::Direct,
            gpiochip: "/dev/gpiochip0".to_string(),
            rs_pin: 22,
            rw_pin: Some(27),
            enable_pin: 17,
            data_pins: vec![26, 16, 20, 21],
            backlight_pin: None,
            pwm_chip: None,
            pwm_channel: None,
            cols: 16,
            rows: 2,
            brightness: 80,
        }
    }
}
