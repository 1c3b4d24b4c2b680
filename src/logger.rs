//! Logger façade
//!
//! A [`Logger`] is a lightweight value: a display name plus a handle to its
//! dispatcher. The four severity methods render the message to text and
//! enqueue it; everything else, timestamps included, happens later on the
//! worker thread.

use std::fmt::{self, Write};
use std::sync::Arc;

use crate::dispatch::{self, LogTask, Shared};
use crate::level::Level;

/// Handle for emitting log entries under one display name.
///
/// Cloning is cheap and clones share the underlying dispatcher. The name
/// may itself carry `§` color codes; they are decoded when the header is
/// rendered.
#[derive(Clone)]
pub struct Logger {
    name: String,
    shared: Arc<Shared>,
}

impl Logger {
    /// Logger on the process-global dispatcher.
    ///
    /// The first call spawns the global worker thread, which runs until the
    /// process exits. Pass an empty name for an unnamed logger; use
    /// [`Dispatcher::logger`](crate::Dispatcher::logger) to bind to an
    /// explicitly configured dispatcher instead.
    pub fn new(name: impl Into<String>) -> Self {
        dispatch::global().logger(name)
    }

    pub(crate) fn with_shared(name: String, shared: Arc<Shared>) -> Self {
        Self {
            name: sanitize_name(&name),
            shared,
        }
    }

    /// The display name, empty for unnamed loggers
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Log a message at INFO
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Level::Info, message);
    }

    /// Log a message at WARN
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Level::Warn, message);
    }

    /// Log a message at ERROR
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Level::Error, message);
    }

    /// Log a message at FATAL
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Level::Fatal, message);
    }

    fn log(&self, level: Level, message: impl fmt::Display) {
        self.shared.enqueue(LogTask {
            name: self.name.clone(),
            message: render_message(message),
            level,
        });
    }
}

impl Default for Logger {
    /// Unnamed logger on the process-global dispatcher
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Display for Logger {
    /// Diagnostic form, usable inside other log messages
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            f.write_str("Logger{name=<empty>}")
        } else {
            write!(f, "Logger{{name={}}}", self.name)
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Drop everything up to the last CR or LF; a name must never break out of
/// the line header it is printed in
fn sanitize_name(name: &str) -> String {
    match name.rfind(['\r', '\n']) {
        Some(pos) => name[pos + 1..].to_string(),
        None => name.to_string(),
    }
}

/// Render a message to text. A `Display` implementation that reports an
/// error yields whatever it wrote plus an inline diagnostic, never an error
/// to the logging caller.
fn render_message(message: impl fmt::Display) -> String {
    let mut text = String::new();
    if write!(text, "{message}").is_err() {
        text.push_str("§8§o (formatting error)");
    }
    text
}
