//! The queue block: a cursor-centred, wrapped slice of the play queue.

use mpd_proto::config::DisplayConfig;
use mpd_proto::protocol::Record;

use super::window::window;
use super::wrap::wrap_line;
use crate::metadata::{MULTI_VALUE_SEPARATOR, UNKNOWN};
use crate::theme::{paint, ESC, SGR_CURRENT_ENTRY};

fn digit_width(n: usize) -> usize {
    n.to_string().len()
}

/// Configured fields joined by the separator, or the file's last path
/// component when none of them is set.
fn entry_text(entry: &Record, display: &DisplayConfig) -> String {
    let parts: Vec<String> = display
        .fields
        .iter()
        .filter_map(|field| entry.joined(field, MULTI_VALUE_SEPARATOR))
        .filter(|value| !value.is_empty())
        .collect();
    if !parts.is_empty() {
        return parts.join(&display.field_separator);
    }
    entry
        .get("file")
        .and_then(|path| path.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// `  <index>  <text>` with the index right-justified to `digits` columns.
/// The current entry swaps its first column for `>` and is painted bold.
fn format_entry(entry: &Record, index: usize, digits: usize, current: bool, display: &DisplayConfig) -> String {
    let line = format!("  {:>digits$}  {}", index + 1, entry_text(entry, display));
    if current {
        paint(&format!(">{}", &line[1..]), SGR_CURRENT_ENTRY)
    } else {
        line
    }
}

/// At most `height` display lines for `queue`, keeping the entry at
/// `current` on screen. Long entries wrap with a hanging indent.
pub fn queue_lines(
    queue: &[Record],
    current: Option<usize>,
    width: usize,
    height: usize,
    display: &DisplayConfig,
) -> Vec<String> {
    if queue.is_empty() || height == 0 {
        return Vec::new();
    }
    let current = current.filter(|&c| c < queue.len());
    let digits = digit_width(queue.len());
    let indent = " ".repeat(4 + digits);

    let wrapped: Vec<String> = window(height, queue.len(), current.unwrap_or(0))
        .flat_map(|i| {
            let line = format_entry(&queue[i], i, digits, Some(i) == current, display);
            wrap_line(&line, width, &indent)
        })
        .collect();

    // Wrapping may have grown the slice past `height`; window again over the
    // wrapped lines, centred on the painted current entry.
    let cursor = wrapped
        .iter()
        .position(|line| line.starts_with(ESC))
        .unwrap_or(0);
    wrapped[window(height, wrapped.len(), cursor)].to_vec()
}
