//! Terminal output layer
//!
//! Capability probing for stderr, the output backends for ANSI, legacy and
//! non-interactive consoles, and the inline `§` markup decoder.

mod backend;
mod markup;
mod probe;

pub(crate) use backend::{detect, ConsoleBackend, SilentBackend};
pub(crate) use markup::process_codes;

#[cfg(test)]
pub(crate) use backend::{CaptureBackend, Op};

use std::fs::File;
use std::io::Write;

use crate::level::Paint;

/// Legacy console attribute bits (Windows text-attribute layout)
pub(crate) mod attr {
    pub const BLUE: u16 = 0x0001;
    pub const GREEN: u16 = 0x0002;
    pub const RED: u16 = 0x0004;
    pub const BRIGHT: u16 = 0x0008;
    pub const REVERSE: u16 = 0x4000;
    pub const UNDERLINE: u16 = 0x8000;

    /// Default console text color (grey on black)
    pub const DEFAULT: u16 = RED | GREEN | BLUE;
}

/// Sink for one rendered line: the console backend plus, while file logging
/// is healthy, the current log file.
///
/// Text goes to both sides; color changes only ever reach the console. The
/// two sides borrow independently, so the renderer can move the file half
/// out and keep driving the console afterwards.
pub(crate) struct LineOutput<'c, 'f> {
    pub console: &'c mut dyn ConsoleBackend,
    pub file: Option<&'f mut File>,
}

impl LineOutput<'_, '_> {
    /// Write plain text to the console and mirror it to the log file
    pub fn text(&mut self, text: &str) {
        self.console.put_text(text);
        if let Some(file) = self.file.as_mut() {
            let _ = file.write_all(text.as_bytes());
        }
    }

    /// Switch the console color
    pub fn color(&mut self, paint: Paint) {
        self.console.put_color(paint);
    }

    /// Legacy attribute the console is currently set to
    pub fn current_attr(&self) -> u16 {
        self.console.current_attr()
    }
}
