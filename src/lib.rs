//! Asynchronous terminal logger with inline color markup, plain-text file
//! mirroring and dated rotation.
//!
//! Log calls never block on I/O: they render the message to text, append it
//! to a queue and return. A single background worker drains the queue in
//! order, writes each line to stderr with colors and mirrors it, stripped
//! of all markup, into `logs/latest.log` next to the executable. When the
//! calendar date changes the previous file is archived as
//! `YYYY-MM-DD-N.log` and a fresh `latest.log` is started.
//!
//! Messages may carry Minecraft-style `§` color codes (`§a`, `§c`, …,
//! toggles `§k`–`§o`, reset `§r`). They are translated to ANSI escapes on
//! capable terminals, to console attributes on legacy Windows consoles, and
//! decoded away everywhere else, so a redirected stderr and the log file
//! stay plain text.
//!
//! ```no_run
//! use tintlog::Logger;
//!
//! let logger = Logger::new("net");
//! logger.info("listening on §a0.0.0.0:4000§r");
//! tintlog::warn!(logger, "peer {} is slow", "10.0.0.7");
//!
//! // Flush pending lines before exiting
//! tintlog::wait();
//! ```
//!
//! [`Logger::new`] binds to a process-global dispatcher with default
//! configuration. Embedders and tests can instead build their own
//! [`Dispatcher`] to pick the logs directory or disable either output;
//! dropping it drains the queue and stops its worker.

mod console;
mod dispatch;
mod level;
mod logger;
mod render;
mod rotate;

pub use dispatch::{Builder, Dispatcher};
pub use level::Level;
pub use logger::Logger;

/// Block until the process-global queue has fully drained.
///
/// Returns immediately when the global dispatcher has not been used yet.
/// There is no timeout: if other threads keep logging, this waits for them
/// too.
pub fn wait() {
    if let Some(dispatcher) = dispatch::try_global() {
        dispatcher.wait();
    }
}

/// Register the process-global per-line callback.
///
/// The callback receives each rendered line twice, as the original text and
/// as a copy with all `§` codes stripped. It runs on the worker thread; see
/// [`Dispatcher::set_on_log`] for the reentrancy caveat.
pub fn set_on_log(callback: impl Fn(&str, &str) + Send + Sync + 'static) {
    dispatch::global().set_on_log(callback);
}

/// Log at INFO through [`format_args!`], avoiding an intermediate
/// allocation at the call site.
///
/// ```no_run
/// # let logger = tintlog::Logger::new("demo");
/// tintlog::info!(logger, "loaded {} entries", 42);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(::core::format_args!($($arg)*))
    };
}

/// Log at WARN through [`format_args!`]
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(::core::format_args!($($arg)*))
    };
}

/// Log at ERROR through [`format_args!`]
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(::core::format_args!($($arg)*))
    };
}

/// Log at FATAL through [`format_args!`]
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)*) => {
        $logger.fatal(::core::format_args!($($arg)*))
    };
}
