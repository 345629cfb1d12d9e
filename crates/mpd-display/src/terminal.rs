//! The output surface: size queries and whole-frame writes.

use std::io::{self, Write};

use crossterm::{cursor, execute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub width: usize,
    pub height: usize,
}

impl TermSize {
    /// Used when the size query fails (e.g. stdout is not a tty).
    pub const FALLBACK: TermSize = TermSize {
        width: 80,
        height: 24,
    };

    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

/// Where frames go. Implementations must write each frame in one piece so a
/// reader of the terminal never sees half of one.
pub trait Terminal: Send + Sync + 'static {
    fn size(&self) -> io::Result<TermSize>;
    fn write_frame(&self, frame: &str) -> io::Result<()>;
    fn set_cursor_visible(&self, visible: bool) -> io::Result<()>;
}

/// The process's real stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutTerminal;

impl Terminal for StdoutTerminal {
    fn size(&self) -> io::Result<TermSize> {
        let (width, height) = crossterm::terminal::size()?;
        Ok(TermSize::new(width as usize, height as usize))
    }

    fn write_frame(&self, frame: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(frame.as_bytes())?;
        out.flush()
    }

    fn set_cursor_visible(&self, visible: bool) -> io::Result<()> {
        let mut out = io::stdout();
        if visible {
            execute!(out, cursor::Show)
        } else {
            execute!(out, cursor::Hide)
        }
    }
}
