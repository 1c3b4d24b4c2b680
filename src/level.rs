//! Log severities and their console styling
//!
//! Each severity carries two colors: one for the level tag inside the header
//! and one for the message body. Every color is kept in both forms the
//! terminal layer understands, a legacy console attribute and an ANSI escape.

use std::fmt;

use crate::console::attr;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Get the display name for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Colors used when rendering entries of this level
    pub(crate) fn style(&self) -> &'static LevelStyle {
        match self {
            Level::Info => &INFO_STYLE,
            Level::Warn => &WARN_STYLE,
            Level::Error => &ERROR_STYLE,
            Level::Fatal => &FATAL_STYLE,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A console color in both legacy attribute and ANSI escape form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Paint {
    /// Legacy console attribute word
    pub attr: u16,
    /// Equivalent ANSI escape sequence
    pub ansi: &'static str,
}

/// Tag and body colors for one severity
#[derive(Debug)]
pub(crate) struct LevelStyle {
    /// Color of the level tag inside the header
    pub tag: Paint,
    /// Color the message body starts in, restored by the `r` code
    pub body: Paint,
}

/// Cyan used for the `[HH:MM:SS LEVEL]` header and the name brackets
pub(crate) const HEADER_PAINT: Paint = Paint {
    attr: attr::BLUE | attr::GREEN,
    ansi: "\x1b[0;36m",
};

static INFO_STYLE: LevelStyle = LevelStyle {
    tag: Paint {
        attr: attr::GREEN | attr::BRIGHT,
        ansi: "\x1b[0;92m",
    },
    body: Paint {
        attr: attr::DEFAULT,
        ansi: "\x1b[0;37m",
    },
};

static WARN_STYLE: LevelStyle = LevelStyle {
    tag: Paint {
        attr: attr::RED | attr::GREEN,
        ansi: "\x1b[0;33m",
    },
    body: Paint {
        attr: attr::RED | attr::GREEN | attr::BRIGHT,
        ansi: "\x1b[0;93m",
    },
};

static ERROR_STYLE: LevelStyle = LevelStyle {
    tag: Paint {
        attr: attr::RED,
        ansi: "\x1b[0;31m",
    },
    body: Paint {
        attr: attr::RED | attr::BRIGHT,
        ansi: "\x1b[0;91m",
    },
};

static FATAL_STYLE: LevelStyle = LevelStyle {
    tag: Paint {
        attr: attr::UNDERLINE | attr::RED,
        ansi: "\x1b[2;31m",
    },
    body: Paint {
        attr: attr::RED,
        ansi: "\x1b[0;31m",
    },
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_display_names() {
        assert_eq!(Level::Info.as_str(), "INFO");
        assert_eq!(Level::Warn.as_str(), "WARN");
        assert_eq!(Level::Error.as_str(), "ERROR");
        assert_eq!(Level::Fatal.as_str(), "FATAL");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_level_style_attributes() {
        assert_eq!(Level::Info.style().tag.attr, 10);
        assert_eq!(Level::Info.style().body.attr, 7);
        assert_eq!(Level::Warn.style().tag.attr, 6);
        assert_eq!(Level::Warn.style().body.attr, 14);
        assert_eq!(Level::Error.style().tag.attr, 4);
        assert_eq!(Level::Error.style().body.attr, 12);
        assert_eq!(Level::Fatal.style().tag.attr, attr::UNDERLINE | attr::RED);
        assert_eq!(Level::Fatal.style().body.attr, 4);
    }

    #[test]
    fn test_header_paint_is_cyan() {
        assert_eq!(HEADER_PAINT.attr, 3);
        assert_eq!(HEADER_PAINT.ansi, "\x1b[0;36m");
    }
}
