//! Terminal palette and glyphs for the grid.

use std::fmt::Display;

const RESET: &str = "\x1b[0m";

// Foreground colors
pub const HEADER: &str = "\x1b[1;36m";
pub const MUTED: &str = "\x1b[2m";
pub const SUCCESS: &str = "\x1b[32m";
pub const INFO: &str = "\x1b[34m";
pub const WARNING: &str = "\x1b[33m";
pub const ERROR: &str = "\x1b[1;31m";
/// Cells edited in the grid but not yet saved.
pub const PENDING: &str = "\x1b[35m";

pub const CHECKED: &str = "[x]";
pub const UNCHECKED: &str = "[ ]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    color: bool,
}

impl Theme {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn paint(&self, text: impl Display, color: &str) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn checkbox(&self, on: bool, pending: bool) -> String {
        let glyph = if on { CHECKED } else { UNCHECKED };
        if pending {
            // Keep the marker visible without color.
            let marked = format!("{glyph}*");
            self.paint(marked, PENDING)
        } else {
            format!("{glyph} ")
        }
    }
}
