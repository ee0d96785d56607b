//! ANSI color codes for diagnostic output.
//!
//! One semantic palette, no RGB — matches what a plain VT100-ish terminal
//! supports, disabled entirely when output isn't a tty or when the caller
//! asks for it explicitly.

/// ANSI color palette for the diagnostic printer.
#[derive(Clone, Copy, Debug)]
pub struct Colors {
    pub red: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub dim: &'static str,
    pub bold: &'static str,
    pub reset: &'static str,
}

impl Default for Colors {
    fn default() -> Self {
        Self::OFF
    }
}

impl Colors {
    pub const ON: Self = Self {
        red: "\x1b[31m",
        yellow: "\x1b[33m",
        blue: "\x1b[34m",
        dim: "\x1b[2m",
        bold: "\x1b[1m",
        reset: "\x1b[0m",
    };

    pub const OFF: Self = Self {
        red: "",
        yellow: "",
        blue: "",
        dim: "",
        bold: "",
        reset: "",
    };

    pub fn new(enabled: bool) -> Self {
        if enabled { Self::ON } else { Self::OFF }
    }

    pub fn is_enabled(&self) -> bool {
        !self.red.is_empty()
    }
}
