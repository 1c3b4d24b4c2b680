//! Rendering of queued tasks into console and file lines
//!
//! A task may expand to several entries: its message is split on CR and LF
//! and every non-empty segment gets its own header, decoded body, callback
//! invocation and file line.

use std::fs::File;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Local;

use crate::console::{process_codes, ConsoleBackend, LineOutput};
use crate::dispatch::{LogTask, OnLog};
use crate::level::HEADER_PAINT;

/// Render every line of one task
pub(crate) fn render_task(
    task: &LogTask,
    console: &mut dyn ConsoleBackend,
    mut file: Option<&mut File>,
    callback: Option<&Arc<OnLog>>,
) {
    for line in task.message.split(['\r', '\n']) {
        // CRLF leaves an empty segment between the two; blank lines are
        // dropped entirely
        if line.is_empty() {
            continue;
        }
        render_line(task, line, console, file.as_deref_mut(), callback);
    }
}

/// Render one `[HH:MM:SS LEVEL] [name] message` entry
fn render_line(
    task: &LogTask,
    line: &str,
    console: &mut dyn ConsoleBackend,
    file: Option<&mut File>,
    callback: Option<&Arc<OnLog>>,
) {
    let style = task.level.style();

    // The carriage return lets an entry overwrite an in-progress status
    // line; it never reaches the file
    console.begin_line();

    let mut out = LineOutput {
        console: &mut *console,
        file,
    };
    out.color(HEADER_PAINT);
    out.text("[");
    out.text(&Local::now().format("%H:%M:%S ").to_string());
    out.color(style.tag);
    out.text(task.level.as_str());
    out.color(HEADER_PAINT);
    out.text("] ");

    if !task.name.is_empty() {
        out.text("[");
        process_codes(&task.name, HEADER_PAINT, &mut out, false);
        out.color(HEADER_PAINT);
        out.text("] ");
    }

    out.color(style.body);
    let stripped = process_codes(line, style.body, &mut out, callback.is_some());

    let LineOutput { file, .. } = out;

    if let Some(callback) = callback {
        let _ = panic::catch_unwind(AssertUnwindSafe(|| (**callback)(line, &stripped)));
    }

    console.clear_to_end();
    console.end_line();

    if let Some(file) = file {
        let _ = file.write_all(b"\n");
        let _ = file.flush();
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom};
    use std::sync::Mutex;

    use crate::console::{CaptureBackend, Op};
    use crate::level::Level;

    use super::*;

    fn task(name: &str, message: &str, level: Level) -> LogTask {
        LogTask {
            name: name.to_string(),
            message: message.to_string(),
            level,
        }
    }

    fn render_captured(task: &LogTask) -> CaptureBackend {
        let mut console = CaptureBackend::new();
        render_task(task, &mut console, None, None);
        console
    }

    #[test]
    fn test_single_line_layout() {
        let console = render_captured(&task("", "hello", Level::Info));

        assert_eq!(console.lines(), 1);
        let text = console.text();
        assert!(text.starts_with('['));
        assert!(text.contains(" INFO] "), "unexpected text: {text}");
        assert!(text.ends_with("hello"));
        assert_eq!(console.ops.first(), Some(&Op::Begin));

        let colors: Vec<u16> = console
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Color(attr, _) => Some(*attr),
                _ => None,
            })
            .collect();
        // Header, tag, header again, body
        assert_eq!(colors, vec![3, 10, 3, 7]);
    }

    #[test]
    fn test_named_logger_renders_name_segment() {
        let console = render_captured(&task("core", "ready", Level::Warn));
        assert!(console.text().contains("] [core] "));
    }

    #[test]
    fn test_name_codes_use_header_baseline() {
        let console = render_captured(&task("a§rb", "x", Level::Info));

        let colors: Vec<u16> = console
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Color(attr, _) => Some(*attr),
                _ => None,
            })
            .collect();
        // The reset inside the name restores header cyan, not the body color
        assert_eq!(colors, vec![3, 10, 3, 3, 3, 7]);
    }

    #[test]
    fn test_multiline_message_renders_two_entries() {
        let console = render_captured(&task("", "line1\nline2\r\n", Level::Info));

        assert_eq!(console.lines(), 2);
        let text = console.text();
        assert!(text.contains("line1"));
        assert!(text.contains("line2"));
    }

    #[test]
    fn test_blank_message_renders_nothing() {
        let console = render_captured(&task("", "\r\n\n", Level::Info));
        assert_eq!(console.lines(), 0);
        assert!(console.ops.is_empty());
    }

    #[test]
    fn test_callback_gets_original_and_stripped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Arc<OnLog> = Arc::new(move |original: &str, stripped: &str| {
            sink.lock()
                .unwrap()
                .push((original.to_string(), stripped.to_string()));
        });

        let mut console = CaptureBackend::new();
        render_task(
            &task("", "x§1y\nplain", Level::Error),
            &mut console,
            None,
            Some(&callback),
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("x§1y".to_string(), "xy".to_string()));
        assert_eq!(seen[1], ("plain".to_string(), "plain".to_string()));
    }

    #[test]
    fn test_callback_panic_is_contained() {
        let callback: Arc<OnLog> = Arc::new(|_: &str, _: &str| panic!("callback bug"));

        let mut console = CaptureBackend::new();
        render_task(
            &task("", "still rendered", Level::Info),
            &mut console,
            None,
            Some(&callback),
        );

        assert_eq!(console.lines(), 1);
        assert!(console.text().ends_with("still rendered"));
    }

    #[test]
    fn test_file_mirror_is_plain_text() {
        let mut file = tempfile::tempfile().unwrap();
        let mut console = CaptureBackend::new();

        render_task(
            &task("net§2io", "up §aok§r\nsecond", Level::Info),
            &mut console,
            Some(&mut file),
            None,
        );

        let mut contents = String::new();
        file.seek(SeekFrom::Start(0)).unwrap();
        file.read_to_string(&mut contents).unwrap();

        let lines: Vec<&str> = contents.split_terminator('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] [netio] up ok"));
        assert!(lines[1].ends_with("] [netio] second"));
        assert!(!contents.contains('§'));
        assert!(!contents.contains('\r'));
        assert!(!contents.contains('\x1b'));
    }
}
