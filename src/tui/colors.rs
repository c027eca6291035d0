//! Fixed colour constants for the calendar interface.
//!
//! Occurrence colours are computed per render in `crate::color`; these
//! constants cover the chrome around them.

use ratatui::style::Color;

/// Day header for today's row.
pub const TODAY_ACCENT: Color = Color::Rgb(255, 215, 0);
/// Day headers for every other day.
pub const DAY_HEADER: Color = Color::Rgb(130, 130, 130);
/// Background of the selected occurrence row.
pub const SELECTION_BG: Color = Color::Rgb(40, 40, 60);
/// Status line text.
pub const STATUS: Color = Color::Rgb(170, 170, 170);
