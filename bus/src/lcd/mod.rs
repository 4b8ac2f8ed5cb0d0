//! Character LCD layer: the HD44780 controller and widgets built on its
//! public API.

pub mod bargraph;
pub mod hd44780;
