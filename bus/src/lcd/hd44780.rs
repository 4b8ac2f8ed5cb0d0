//! HD44780 character display controller.
//!
//! Owns the bus-timing knowledge: the power-up synchronization sequence,
//! 4-bit vs 8-bit transfers, and command/data framing. Everything physical
//! goes through the injected [BusDriver], so the same controller drives local
//! pins or a forwarded stream without knowing which.

use crate::{BusDriver, BusError, BusResult, PinLevel, PinMode};
use log::{trace, warn};

// Commands.
const CMD_CLEAR: u8 = 0b00000001;
const CMD_HOME: u8 = 0b00000010;
const CMD_ENTRY_MODE: u8 = 0b00000100;
const CMD_DISPLAY_CONTROL: u8 = 0b00001000;
const CMD_SHIFT: u8 = 0b00010000;
const CMD_FUNCTION_SET: u8 = 0b00100000;
const CMD_SET_CGRAM_ADDR: u8 = 0b01000000;
const CMD_SET_DDRAM_ADDR: u8 = 0b10000000;

// Entry mode flags.
const ENTRY_INCREMENT: u8 = 0b00000010;
const ENTRY_AUTOSCROLL: u8 = 0b00000001;

// Display control flags.
const CONTROL_DISPLAY_ON: u8 = 0b00000100;
const CONTROL_CURSOR_ON: u8 = 0b00000010;
const CONTROL_BLINK_ON: u8 = 0b00000001;

// Shift flags.
const SHIFT_DISPLAY: u8 = 0b00001000;
const SHIFT_RIGHT: u8 = 0b00000100;

// Function set flags.
const FUNCTION_8BIT: u8 = 0b00010000;
const FUNCTION_2LINE: u8 = 0b00001000;
const FUNCTION_5X10: u8 = 0b00000100;

// The datasheet wants >40 ms after Vcc rises above 2.7 V; the host can be up
// long before the display is, and a host reset does not reset the display.
const POWER_ON_WAIT_US: u16 = 50_000;
// Width-negotiation settle times: >4.1 ms twice, then >100 µs.
const SYNC_WAIT_LONG_US: u16 = 4_500;
const SYNC_WAIT_SHORT_US: u16 = 150;
// Clear and home are slow commands.
const SLOW_COMMAND_WAIT_US: u16 = 2_000;

/// Data line assignment; picking a variant fixes the transfer width for the
/// controller's whole life.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataPins {
    Four([u16; 4]),
    Eight([u16; 8]),
}

impl DataPins {
    pub fn is_eight_bit(&self) -> bool {
        matches!(self, DataPins::Eight(_))
    }

    fn pins(&self) -> &[u16] {
        match self {
            DataPins::Four(pins) => pins,
            DataPins::Eight(pins) => pins,
        }
    }
}

/// Pin assignment for one display.
///
/// `rw` may be left unwired (the bus is then write-only, saving a pin);
/// `backlight` points at an analog-capable pin when brightness control is
/// wanted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Pins {
    pub rs: u16,
    pub rw: Option<u16>,
    pub enable: u16,
    pub data: DataPins,
    pub backlight: Option<u16>,
}

/// Character font selection; 5×10 only exists on some one-line displays.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Font {
    #[default]
    Dots5x8,
    Dots5x10,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextDirection {
    LeftToRight,
    RightToLeft,
}

/// One HD44780-class display, parameterized by the bus driver executing its
/// primitive operations.
///
/// The controller must complete [Hd44780::begin] before anything else; every
/// command or data path rejects with [BusError::NotInitialized] until then.
/// Past that point there is no runtime failure signal from the display
/// itself: a miswired or absent controller silently shows garbage. That is a
/// property of the write-only bus, not something this layer can detect.
pub struct Hd44780<D: BusDriver> {
    driver: D,
    pins: Pins,
    row_offsets: [u8; 4],
    lines: u8,
    function: u8,
    control: u8,
    entry_mode: u8,
    initialized: bool,
}

impl<D: BusDriver> Hd44780<D> {
    pub fn new(driver: D, pins: Pins) -> Self {
        let mut function = 0;
        if pins.data.is_eight_bit() {
            function |= FUNCTION_8BIT;
        }
        Hd44780 {
            driver,
            pins,
            row_offsets: [0; 4],
            lines: 1,
            function,
            control: 0,
            entry_mode: 0,
            initialized: false,
        }
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Runs the power-up sequence and leaves the display on, cleared, and in
    /// left-to-right entry mode.
    ///
    /// The steps are strictly sequential, each with its minimum settle time:
    /// power-on wait, three width-negotiation writes (recovering bus
    /// synchronization from whatever state the controller was left in), the
    /// final width select, function set, display on, clear, entry mode.
    /// Interrupting the sequence leaves the controller in an undefined
    /// synchronization state, so there is no partial form of this call.
    pub fn begin(&mut self, cols: u8, lines: u8, font: Font) -> BusResult<()> {
        if lines > 1 {
            self.function |= FUNCTION_2LINE;
        }
        self.lines = lines;
        self.row_offsets = [0x00, 0x40, cols, 0x40 + cols];

        // Some one-line displays support a 10-dot-high font.
        if font == Font::Dots5x10 && lines == 1 {
            self.function |= FUNCTION_5X10;
        }

        self.driver.set_pin_mode(self.pins.rs, PinMode::Output)?;
        if let Some(rw) = self.pins.rw {
            self.driver.set_pin_mode(rw, PinMode::Output)?;
        }
        self.driver.set_pin_mode(self.pins.enable, PinMode::Output)?;
        for &pin in self.pins.data.pins() {
            self.driver.set_pin_mode(pin, PinMode::Output)?;
        }
        if let Some(backlight) = self.pins.backlight {
            self.driver.set_pin_mode(backlight, PinMode::Output)?;
        }

        self.driver.delay_us(POWER_ON_WAIT_US)?;

        // Both RS and R/W low to begin commands.
        self.driver.set_pin_level(self.pins.rs, PinLevel::Low)?;
        self.driver.set_pin_level(self.pins.enable, PinLevel::Low)?;
        if let Some(rw) = self.pins.rw {
            self.driver.set_pin_level(rw, PinLevel::Low)?;
        }

        match self.pins.data {
            DataPins::Four(pins) => {
                // The controller wakes in 8-bit mode in an unknown sync
                // state; three 8-bit function-set nibbles resynchronize it,
                // then one more nibble drops it to 4-bit.
                self.write_bits(&pins, 0x03)?;
                self.driver.delay_us(SYNC_WAIT_LONG_US)?;
                self.write_bits(&pins, 0x03)?;
                self.driver.delay_us(SYNC_WAIT_LONG_US)?;
                self.write_bits(&pins, 0x03)?;
                self.driver.delay_us(SYNC_WAIT_SHORT_US)?;
                self.write_bits(&pins, 0x02)?;
            }
            DataPins::Eight(_) => {
                self.raw_command(CMD_FUNCTION_SET | self.function)?;
                self.driver.delay_us(SYNC_WAIT_LONG_US)?;
                self.raw_command(CMD_FUNCTION_SET | self.function)?;
                self.driver.delay_us(SYNC_WAIT_LONG_US)?;
                self.raw_command(CMD_FUNCTION_SET | self.function)?;
                self.driver.delay_us(SYNC_WAIT_SHORT_US)?;
            }
        }

        // Latch width, line count, and font.
        self.raw_command(CMD_FUNCTION_SET | self.function)?;

        self.control = CONTROL_DISPLAY_ON;
        self.raw_command(CMD_DISPLAY_CONTROL | self.control)?;

        self.raw_command(CMD_CLEAR)?;
        self.driver.delay_us(SLOW_COMMAND_WAIT_US)?;

        self.entry_mode = ENTRY_INCREMENT;
        self.raw_command(CMD_ENTRY_MODE | self.entry_mode)?;

        self.initialized = true;
        Ok(())
    }

    /// Sends a command byte.
    pub fn command(&mut self, value: u8) -> BusResult<()> {
        self.ensure_ready()?;
        self.raw_command(value)
    }

    /// Sends a data byte at the current cursor position.
    pub fn write_byte(&mut self, value: u8) -> BusResult<()> {
        self.ensure_ready()?;
        self.send(value, PinLevel::High)
    }

    /// Writes a string, replacing anything outside ASCII with `'?'`.
    pub fn print(&mut self, s: &str) -> BusResult<()> {
        for c in s.chars() {
            if c.is_ascii() {
                self.write_byte(c as u8)?;
            } else {
                warn!("non-ASCII character: {}", c);
                self.write_byte(b'?')?;
            }
        }
        Ok(())
    }

    /// Clears the display and homes the cursor.
    pub fn clear(&mut self) -> BusResult<()> {
        self.command(CMD_CLEAR)?;
        self.driver.delay_us(SLOW_COMMAND_WAIT_US)?;
        Ok(())
    }

    /// Homes the cursor without clearing.
    pub fn home(&mut self) -> BusResult<()> {
        self.command(CMD_HOME)?;
        self.driver.delay_us(SLOW_COMMAND_WAIT_US)?;
        Ok(())
    }

    /// Moves the cursor; the row is clamped to the configured line count.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> BusResult<()> {
        let max_row = (self.row_offsets.len() as u8 - 1).min(self.lines.saturating_sub(1));
        let row = row.min(max_row);
        self.command(CMD_SET_DDRAM_ADDR | (col + self.row_offsets[row as usize]))
    }

    pub fn set_display(&mut self, on: bool) -> BusResult<()> {
        self.set_control_flag(CONTROL_DISPLAY_ON, on)
    }

    pub fn set_cursor_visible(&mut self, on: bool) -> BusResult<()> {
        self.set_control_flag(CONTROL_CURSOR_ON, on)
    }

    pub fn set_blink(&mut self, on: bool) -> BusResult<()> {
        self.set_control_flag(CONTROL_BLINK_ON, on)
    }

    pub fn set_text_direction(&mut self, direction: TextDirection) -> BusResult<()> {
        match direction {
            TextDirection::LeftToRight => self.entry_mode |= ENTRY_INCREMENT,
            TextDirection::RightToLeft => self.entry_mode &= !ENTRY_INCREMENT,
        }
        self.command(CMD_ENTRY_MODE | self.entry_mode)
    }

    pub fn set_autoscroll(&mut self, on: bool) -> BusResult<()> {
        if on {
            self.entry_mode |= ENTRY_AUTOSCROLL;
        } else {
            self.entry_mode &= !ENTRY_AUTOSCROLL;
        }
        self.command(CMD_ENTRY_MODE | self.entry_mode)
    }

    /// Scrolls the whole display one cell left without touching DDRAM.
    pub fn scroll_left(&mut self) -> BusResult<()> {
        self.command(CMD_SHIFT | SHIFT_DISPLAY)
    }

    /// Scrolls the whole display one cell right without touching DDRAM.
    pub fn scroll_right(&mut self) -> BusResult<()> {
        self.command(CMD_SHIFT | SHIFT_DISPLAY | SHIFT_RIGHT)
    }

    /// Defines one of the 8 CGRAM glyphs; `location` wraps into 0–7.
    ///
    /// Leaves the address counter in CGRAM; reposition with
    /// [Hd44780::set_cursor] before writing text.
    pub fn create_char(&mut self, location: u8, glyph: [u8; 8]) -> BusResult<()> {
        let location = location & 0x7;
        self.command(CMD_SET_CGRAM_ADDR | (location << 3))?;
        for row in glyph {
            self.write_byte(row)?;
        }
        Ok(())
    }

    /// Sets backlight intensity (0–100). A no-op when no backlight pin is
    /// wired.
    pub fn set_brightness(&mut self, percent: u8) -> BusResult<()> {
        let Some(backlight) = self.pins.backlight else {
            warn!("brightness with no backlight pin wired");
            return Ok(());
        };
        self.driver.set_brightness(backlight, percent as u16)
    }

    fn ensure_ready(&self) -> BusResult<()> {
        if !self.initialized {
            return Err(BusError::NotInitialized);
        }
        Ok(())
    }

    fn raw_command(&mut self, value: u8) -> BusResult<()> {
        self.send(value, PinLevel::Low)
    }

    fn set_control_flag(&mut self, flag: u8, on: bool) -> BusResult<()> {
        if on {
            self.control |= flag;
        } else {
            self.control &= !flag;
        }
        self.command(CMD_DISPLAY_CONTROL | self.control)
    }

    /// Writes one byte through the active bus width: one latch in 8-bit
    /// mode, high nibble then low nibble in 4-bit mode.
    fn send(&mut self, value: u8, rs: PinLevel) -> BusResult<()> {
        trace!("sending {:08b}, RS {:?}", value, rs);

        self.driver.set_pin_level(self.pins.rs, rs)?;
        if let Some(rw) = self.pins.rw {
            self.driver.set_pin_level(rw, PinLevel::Low)?;
        }

        match self.pins.data {
            DataPins::Eight(pins) => self.write_bits(&pins, value)?,
            DataPins::Four(pins) => {
                self.write_bits(&pins, value >> 4)?;
                self.write_bits(&pins, value & 0x0F)?;
            }
        }
        Ok(())
    }

    /// Puts `value` on the given data lines (LSb first) and latches it with
    /// one enable pulse.
    fn write_bits(&mut self, pins: &[u16], value: u8) -> BusResult<()> {
        for (i, &pin) in pins.iter().enumerate() {
            self.driver
                .set_pin_level(pin, PinLevel::from((value >> i) & 0x01 != 0))?;
        }
        self.driver.pulse_enable(self.pins.enable)
    }
}
