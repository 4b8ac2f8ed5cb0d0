//! Horizontal bar-graph widget for analog-style values.
//!
//! Draws through the public display API only: custom glyphs give the bar a
//! 5-steps-per-cell resolution, and the previous frame is cached so an
//! unchanged value redraws nothing.

use crate::lcd::hd44780::Hd44780;
use crate::{BusDriver, BusError, BusResult};

// Glyph 0 is the filled cell; glyphs 1–4 carry that many columns.
const GLYPHS: [[u8; 8]; 5] = [
    [0b11111; 8],
    [0b10000; 8],
    [0b11000; 8],
    [0b11100; 8],
    [0b11110; 8],
];

/// A bar drawn from `start_col` over `cols` cells of row `row`.
pub struct BarGraph {
    cols: u8,
    start_col: u8,
    row: u8,
    prev_value: Option<u32>,
    last_cells: u8,
}

impl BarGraph {
    /// Registers the segment glyphs and clears the display (which also puts
    /// the controller back into DDRAM addressing).
    pub fn new<D: BusDriver>(
        lcd: &mut Hd44780<D>,
        cols: u8,
        start_col: u8,
        row: u8,
    ) -> BusResult<Self> {
        for (location, glyph) in GLYPHS.iter().enumerate() {
            lcd.create_char(location as u8, *glyph)?;
        }
        lcd.clear()?;
        Ok(BarGraph {
            cols,
            start_col,
            row,
            prev_value: None,
            last_cells: 0,
        })
    }

    /// Draws `value` out of `max` as a bar, blanking whatever the previous
    /// frame drew beyond the new length. Unchanged values are skipped
    /// entirely to avoid flicker.
    pub fn draw<D: BusDriver>(
        &mut self,
        lcd: &mut Hd44780<D>,
        value: u32,
        max: u32,
    ) -> BusResult<()> {
        if max == 0 {
            return Err(BusError::InvalidArgument);
        }
        let value = value.min(max);

        let full_cells = (value as u64 * self.cols as u64 / max as u64) as u8;
        let fraction = ((value as u64 * self.cols as u64 * 5 / max as u64) % 5) as u8;

        let normalized = full_cells as u32 * 5 + fraction as u32;
        if self.prev_value == Some(normalized) {
            return Ok(());
        }

        lcd.set_cursor(self.start_col, self.row)?;

        for _ in 0..full_cells {
            lcd.write_byte(0)?;
        }

        let mut cells = full_cells;
        if fraction > 0 {
            lcd.write_byte(fraction)?;
            cells += 1;
        }

        for _ in cells..self.last_cells {
            lcd.write_byte(b' ')?;
        }

        self.last_cells = cells;
        self.prev_value = Some(normalized);
        Ok(())
    }
}
