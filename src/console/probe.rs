//! Terminal capability probe
//!
//! Stderr is probed once per process and the answer is cached; a stream
//! redirected mid-run keeps the capabilities it started with.

use std::io;
use std::sync::OnceLock;

use crossterm::tty::IsTty;

/// What the terminal attached to stderr, if any, can do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TermCaps {
    /// Stderr is attached to an interactive terminal
    pub interactive: bool,
    /// The terminal understands ANSI escape sequences
    pub ansi: bool,
}

static CAPS: OnceLock<TermCaps> = OnceLock::new();

/// Probe stderr, caching the result for all later calls
pub(crate) fn stderr_caps() -> TermCaps {
    *CAPS.get_or_init(|| {
        let interactive = io::stderr().is_tty();
        TermCaps {
            interactive,
            ansi: interactive && ansi_supported(),
        }
    })
}

/// Checks for ANSI support and tries to enable virtual terminal processing;
/// consoles where that fails get the legacy attribute path.
#[cfg(windows)]
fn ansi_supported() -> bool {
    crossterm::ansi_support::supports_ansi()
}

#[cfg(not(windows))]
fn ansi_supported() -> bool {
    true
}
