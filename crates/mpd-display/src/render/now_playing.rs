//! The "now playing" block: track, status and options lines.

use crate::metadata::DisplayMetadata;
use crate::theme::{paint, SGR_ALBUM_PROGRESS, SGR_ARTIST, SGR_NOT_PLAYING, SGR_PLAYING, SGR_TITLE};

/// `m:ss`
fn clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Unwrapped now-playing lines. `debug_summary`, when present, is appended
/// to the last line.
///
/// ```text
/// EarthBound 'Battling Organs' OC ReMix
/// Mazedude (#1371/3697)
/// |> 14/69: 0:27/2:51, 15%
/// ERsc, 70%
/// ```
pub fn now_playing_lines(meta: &DisplayMetadata, debug_summary: Option<&str>) -> Vec<String> {
    let album_progress = format!("#{}/{}", meta.album_track_index, meta.album_track_total);
    let track_line = format!(
        "{} ({})",
        paint(&meta.artist, SGR_ARTIST),
        paint(&album_progress, SGR_ALBUM_PROGRESS)
    );

    let playing = meta.play_state.is_playing();
    let status_sgr = if playing { SGR_PLAYING } else { SGR_NOT_PLAYING };
    let time = format!(
        "{} {}/{}: {}/{}, {}%",
        if playing { "|>" } else { "||" },
        meta.queue_position,
        meta.queue_length,
        clock(meta.elapsed_seconds),
        clock(meta.duration_seconds),
        meta.percent_elapsed,
    );

    let mut options = format!("{}, {}%", meta.flag_summary, meta.volume_percent);
    if meta.crossfade_seconds > 0 {
        options.push_str(&format!(" (x: {})", meta.crossfade_seconds));
    }

    // Each line is painted on its own so wrapping never carries a colour
    // across a line break.
    let mut lines = vec![
        paint(&meta.title, SGR_TITLE),
        track_line,
        paint(&time, status_sgr),
        paint(&options, status_sgr),
    ];
    if let (Some(summary), Some(last)) = (debug_summary, lines.last_mut()) {
        last.push_str(summary);
    }
    lines
}
