//! Inline color markup decoder
//!
//! Messages may carry `§` followed by one code character: `0`-`9` and
//! `a`-`f` pick one of sixteen palette colors, `k`-`o` toggle display
//! styles, `r` restores the baseline color of the current segment. Codes
//! style the console rendering only and are decoded away from the file and
//! callback copies.

use crate::level::Paint;

use super::attr;
use super::LineOutput;

/// Marker character introducing a color code
const MARKER: char = '§';

/// ANSI escapes for the sixteen palette colors, indexed by legacy attribute
const PALETTE_ANSI: [&str; 16] = [
    "\x1b[30m",
    "\x1b[0;34m",
    "\x1b[0;32m",
    "\x1b[0;36m",
    "\x1b[0;31m",
    "\x1b[0;35m",
    "\x1b[0;33m",
    "\x1b[0;37m",
    "\x1b[0;90m",
    "\x1b[0;94m",
    "\x1b[0;92m",
    "\x1b[0;96m",
    "\x1b[0;91m",
    "\x1b[0;95m",
    "\x1b[0;93m",
    "\x1b[0;97m",
];

/// Decode `text`: plain runs are written through `out` and each code's
/// style is applied to the console as a side effect.
///
/// `reset` is the color the `r` code restores. When `strip` is set the
/// plain runs are also collected and returned; otherwise the returned
/// string is empty.
pub(crate) fn process_codes(
    text: &str,
    reset: Paint,
    out: &mut LineOutput<'_, '_>,
    strip: bool,
) -> String {
    let mut stripped = String::new();
    // Markers at the end of the text have no code attached and are dropped
    let mut rest = text.trim_end_matches(MARKER);

    while let Some(pos) = rest.find(MARKER) {
        let plain = &rest[..pos];
        if !plain.is_empty() {
            out.text(plain);
            if strip {
                stripped.push_str(plain);
            }
        }
        let after = &rest[pos + MARKER.len_utf8()..];
        match after.chars().next() {
            Some(code) => {
                apply_code(code, reset, out);
                rest = &after[code.len_utf8()..];
            }
            None => break,
        }
    }

    if !rest.is_empty() {
        out.text(rest);
        if strip {
            stripped.push_str(rest);
        }
    }
    stripped
}

/// Apply one code character to the console; unknown codes are consumed
/// without effect
fn apply_code(code: char, reset: Paint, out: &mut LineOutput<'_, '_>) {
    let paint = match code {
        '0'..='9' => palette(code as u16 - '0' as u16),
        'a'..='f' => palette(code as u16 - 'a' as u16 + 10),
        'k' => Paint {
            attr: out.current_attr() | attr::REVERSE,
            ansi: "\x1b[5m",
        },
        'l' => Paint {
            attr: out.current_attr(),
            ansi: "\x1b[21m",
        },
        'm' => Paint {
            attr: out.current_attr(),
            ansi: "\x1b[9m",
        },
        'n' => Paint {
            attr: out.current_attr() | attr::UNDERLINE,
            ansi: "\x1b[4m",
        },
        'o' => Paint {
            attr: out.current_attr(),
            ansi: "\x1b[3m",
        },
        'r' => reset,
        _ => return,
    };
    out.color(paint);
}

/// Palette color for a legacy attribute in `0..16`
fn palette(index: u16) -> Paint {
    Paint {
        attr: index,
        ansi: PALETTE_ANSI[index as usize],
    }
}
