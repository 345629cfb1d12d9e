//! SGR color codes and the helper that paints a string with them.
//!
//! Each painted span resets at its end, so a span never bleeds into text
//! that follows it on the same line.

pub const ESC: char = '\u{1b}';

// ── Palette (SGR parameters) ─────────────────────────────────────────────────

pub const SGR_TITLE: &str = "1;34";
pub const SGR_ARTIST: &str = "1;36";
pub const SGR_ALBUM_PROGRESS: &str = "32";
pub const SGR_PLAYING: &str = "32";
pub const SGR_NOT_PLAYING: &str = "31";
pub const SGR_CURRENT_ENTRY: &str = "1";
pub const SGR_RESET: &str = "0";

pub fn paint(text: &str, sgr: &str) -> String {
    format!("{ESC}[{sgr}m{text}{ESC}[{SGR_RESET}m")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_and_resets() {
        assert_eq!(paint("hi", SGR_TITLE), "\u{1b}[1;34mhi\u{1b}[0m");
    }
}
