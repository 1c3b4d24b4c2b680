//! Console output backends
//!
//! One backend per terminal family: ANSI escapes, legacy consoles driven
//! through crossterm commands, and a silent backend for non-interactive
//! runs. The worker picks one at startup and owns it for its lifetime.

use std::io::{self, Write};

use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;

use crate::level::Paint;

use super::{attr, probe};

/// Sink for one console line; colors apply as they arrive and the entry is
/// terminated by [`end_line`](ConsoleBackend::end_line)
pub(crate) trait ConsoleBackend: Send {
    /// Return the cursor to column zero, overwriting any status line
    fn begin_line(&mut self);
    /// Append plain text to the current line
    fn put_text(&mut self, text: &str);
    /// Switch the text color or style
    fn put_color(&mut self, paint: Paint);
    /// Legacy attribute currently in effect
    fn current_attr(&self) -> u16;
    /// Blank the rest of the line and drop back to the default attribute
    fn clear_to_end(&mut self);
    /// Terminate the entry and push it to the terminal
    fn end_line(&mut self);
}

/// Pick the backend matching the probed stderr capabilities
pub(crate) fn detect() -> Box<dyn ConsoleBackend> {
    let caps = probe::stderr_caps();
    if !caps.interactive {
        Box::new(SilentBackend)
    } else if caps.ansi {
        Box::new(AnsiBackend::new(io::stderr()))
    } else {
        Box::new(LegacyBackend::new(io::stderr()))
    }
}

/// Backend for ANSI-capable terminals.
///
/// The whole entry is assembled in a line buffer and written in a single
/// call, so only complete lines ever reach the stream.
pub(crate) struct AnsiBackend<W: Write + Send> {
    out: W,
    line: String,
    attr: u16,
}

impl<W: Write + Send> AnsiBackend<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            line: String::new(),
            attr: attr::DEFAULT,
        }
    }
}

impl<W: Write + Send> ConsoleBackend for AnsiBackend<W> {
    fn begin_line(&mut self) {
        self.line.push('\r');
    }

    fn put_text(&mut self, text: &str) {
        self.line.push_str(text);
    }

    fn put_color(&mut self, paint: Paint) {
        self.line.push_str(paint.ansi);
        self.attr = paint.attr;
    }

    fn current_attr(&self) -> u16 {
        self.attr
    }

    fn clear_to_end(&mut self) {
        self.line.push_str("\x1b[0m\x1b[K");
        self.attr = attr::DEFAULT;
    }

    fn end_line(&mut self) {
        self.line.push('\n');
        let _ = self.out.write_all(self.line.as_bytes());
        let _ = self.out.flush();
        self.line.clear();
    }
}

/// Backend for interactive consoles without ANSI support (older Windows).
///
/// Output goes through crossterm commands, which translate to console
/// attribute calls on such terminals.
pub(crate) struct LegacyBackend<W: Write + Send> {
    out: W,
    attr: u16,
}

impl<W: Write + Send> LegacyBackend<W> {
    pub(crate) fn new(out: W) -> Self {
        Self {
            out,
            attr: attr::DEFAULT,
        }
    }

    /// Crossterm color for the low four attribute bits
    fn color_of(word: u16) -> Color {
        match word & 0xF {
            0x0 => Color::Black,
            0x1 => Color::DarkBlue,
            0x2 => Color::DarkGreen,
            0x3 => Color::DarkCyan,
            0x4 => Color::DarkRed,
            0x5 => Color::DarkMagenta,
            0x6 => Color::DarkYellow,
            0x7 => Color::Grey,
            0x8 => Color::DarkGrey,
            0x9 => Color::Blue,
            0xA => Color::Green,
            0xB => Color::Cyan,
            0xC => Color::Red,
            0xD => Color::Magenta,
            0xE => Color::Yellow,
            _ => Color::White,
        }
    }
}

impl<W: Write + Send> ConsoleBackend for LegacyBackend<W> {
    fn begin_line(&mut self) {
        let _ = self.out.queue(Print("\r"));
    }

    fn put_text(&mut self, text: &str) {
        let _ = self.out.queue(Print(text));
    }

    fn put_color(&mut self, paint: Paint) {
        let _ = self.out.queue(SetAttribute(Attribute::Reset));
        let _ = self.out.queue(SetForegroundColor(Self::color_of(paint.attr)));
        if paint.attr & attr::REVERSE != 0 {
            let _ = self.out.queue(SetAttribute(Attribute::Reverse));
        }
        if paint.attr & attr::UNDERLINE != 0 {
            let _ = self.out.queue(SetAttribute(Attribute::Underlined));
        }
        self.attr = paint.attr;
    }

    fn current_attr(&self) -> u16 {
        self.attr
    }

    fn clear_to_end(&mut self) {
        let _ = self.out.queue(SetAttribute(Attribute::Reset));
        let _ = self.out.queue(Clear(ClearType::UntilNewLine));
        self.attr = attr::DEFAULT;
    }

    fn end_line(&mut self) {
        let _ = self.out.queue(Print("\n"));
        let _ = self.out.flush();
    }
}

/// Backend for non-interactive runs; console output is skipped entirely
pub(crate) struct SilentBackend;

impl ConsoleBackend for SilentBackend {
    fn begin_line(&mut self) {}

    fn put_text(&mut self, _text: &str) {}

    fn put_color(&mut self, _paint: Paint) {}

    fn current_attr(&self) -> u16 {
        attr::DEFAULT
    }

    fn clear_to_end(&mut self) {}

    fn end_line(&mut self) {}
}

/// Test backend recording every operation it receives
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct CaptureBackend {
    pub ops: Vec<Op>,
    attr: u16,
}

/// One recorded backend operation
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Op {
    Begin,
    Text(String),
    Color(u16, &'static str),
    Clear,
    End,
}

#[cfg(test)]
impl CaptureBackend {
    pub(crate) fn new() -> Self {
        Self {
            ops: Vec::new(),
            attr: attr::DEFAULT,
        }
    }

    /// Concatenated text operations
    pub(crate) fn text(&self) -> String {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of completed lines
    pub(crate) fn lines(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::End)).count()
    }
}

#[cfg(test)]
impl ConsoleBackend for CaptureBackend {
    fn begin_line(&mut self) {
        self.ops.push(Op::Begin);
    }

    fn put_text(&mut self, text: &str) {
        self.ops.push(Op::Text(text.to_string()));
    }

    fn put_color(&mut self, paint: Paint) {
        self.ops.push(Op::Color(paint.attr, paint.ansi));
        self.attr = paint.attr;
    }

    fn current_attr(&self) -> u16 {
        self.attr
    }

    fn clear_to_end(&mut self) {
        self.ops.push(Op::Clear);
        self.attr = attr::DEFAULT;
    }

    fn end_line(&mut self) {
        self.ops.push(Op::End);
    }
}
