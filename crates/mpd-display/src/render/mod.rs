//! Frame composition: now-playing block on top, queue block below, padded to
//! the terminal height.

pub mod now_playing;
pub mod queue;
pub mod window;
pub mod wrap;

use mpd_proto::config::DisplayConfig;
use mpd_proto::protocol::RawSnapshot;

use crate::metadata::DisplayMetadata;
use crate::terminal::TermSize;

/// One complete screenful, exactly `height` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    lines: Vec<String>,
}

impl Frame {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Text for a single write: a leading newline scrolls the previous frame
    /// away, then every line of this one.
    pub fn to_output(&self) -> String {
        format!("\n{}", self.lines.join("\n"))
    }
}

pub fn render_frame(
    meta: &DisplayMetadata,
    snapshot: &RawSnapshot,
    size: TermSize,
    display: &DisplayConfig,
    debug_summary: Option<&str>,
) -> Frame {
    let mut lines: Vec<String> = now_playing::now_playing_lines(meta, debug_summary)
        .iter()
        .flat_map(|line| wrap::wrap_line(line, size.width, ""))
        .collect();
    lines.truncate(size.height);

    let remaining = size.height - lines.len();
    lines.extend(queue::queue_lines(
        &snapshot.queue,
        snapshot.current_position(),
        size.width,
        remaining,
        display,
    ));
    lines.resize(size.height, String::new());

    Frame { lines }
}
