//! Word wrapping that understands ANSI escape sequences.
//!
//! Escape sequences are atomic and zero-width: they are never split across
//! output lines and never count toward a line's visible width. Column widths
//! of visible characters come from `unicode-width`, so wide glyphs occupy
//! two cells.

use unicode_width::UnicodeWidthChar;

use crate::theme::ESC;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Atom<'a> {
    /// A complete escape sequence (CSI or two-character form).
    Escape(&'a str),
    /// A visible character and its column width.
    Glyph(&'a str, usize),
}

enum Chunk<'a> {
    Word { atoms: Vec<Atom<'a>>, width: usize },
    Gap(usize),
}

/// Split `line` into words (runs of non-whitespace, escapes included) and
/// gaps (runs of whitespace, measured in columns).
fn chunks(line: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut word: Vec<Atom<'_>> = Vec::new();
    let mut word_width = 0;
    let mut iter = line.char_indices().peekable();

    while let Some((start, ch)) = iter.next() {
        if ch == ESC {
            let mut end = start + ch.len_utf8();
            if let Some(&(i, '[')) = iter.peek() {
                iter.next();
                end = i + 1;
                // CSI: parameters and intermediates up to the final byte.
                for (i, c) in iter.by_ref() {
                    end = i + c.len_utf8();
                    if ('\u{40}'..='\u{7e}').contains(&c) {
                        break;
                    }
                }
            } else if let Some((i, c)) = iter.next() {
                end = i + c.len_utf8();
            }
            word.push(Atom::Escape(&line[start..end]));
        } else if ch.is_whitespace() {
            if !word.is_empty() {
                out.push(Chunk::Word {
                    atoms: std::mem::take(&mut word),
                    width: std::mem::take(&mut word_width),
                });
            }
            match out.last_mut() {
                Some(Chunk::Gap(n)) => *n += 1,
                _ => out.push(Chunk::Gap(1)),
            }
        } else {
            let w = ch.width().unwrap_or(0);
            word.push(Atom::Glyph(&line[start..start + ch.len_utf8()], w));
            word_width += w;
        }
    }
    if !word.is_empty() {
        out.push(Chunk::Word {
            atoms: word,
            width: word_width,
        });
    }
    out
}

/// Number of terminal columns `text` occupies once escapes are interpreted.
pub fn visible_width(text: &str) -> usize {
    chunks(text)
        .iter()
        .map(|c| match c {
            Chunk::Word { width, .. } => *width,
            Chunk::Gap(n) => *n,
        })
        .sum()
}

struct LineBuilder<'i> {
    width: usize,
    indent: &'i str,
    indent_width: usize,
    lines: Vec<String>,
    current: String,
    current_width: usize,
}

impl<'i> LineBuilder<'i> {
    fn capacity(&self) -> usize {
        if self.lines.is_empty() {
            self.width
        } else {
            self.width.saturating_sub(self.indent_width).max(1)
        }
    }

    fn continuation_capacity(&self) -> usize {
        self.width.saturating_sub(self.indent_width).max(1)
    }

    fn break_line(&mut self) {
        let done = std::mem::replace(&mut self.current, self.indent.to_string());
        self.lines.push(done);
        self.current_width = 0;
    }

    fn push_gap(&mut self, n: usize) {
        self.current.extend(std::iter::repeat(' ').take(n));
        self.current_width += n;
    }

    fn push_atom(&mut self, atom: Atom<'_>) {
        match atom {
            Atom::Escape(seq) => self.current.push_str(seq),
            Atom::Glyph(g, w) => {
                if self.current_width > 0 && self.current_width + w > self.capacity() {
                    self.break_line();
                }
                self.current.push_str(g);
                self.current_width += w;
            }
        }
    }

    fn push_word(&mut self, atoms: &[Atom<'_>], width: usize, gap: usize) {
        let at_line_start = self.current_width == 0;
        // Leading whitespace survives only at the very start of the input;
        // after a break it is dropped, as is trailing whitespace.
        let gap = if at_line_start && !self.lines.is_empty() {
            0
        } else {
            gap
        };

        if self.current_width + gap + width <= self.capacity() {
            self.push_gap(gap);
            atoms.iter().for_each(|a| self.push_atom(*a));
            return;
        }

        if !at_line_start && width <= self.continuation_capacity() {
            self.break_line();
            atoms.iter().for_each(|a| self.push_atom(*a));
            return;
        }

        // Longer than a whole line: fill what is left, then break per glyph.
        if !at_line_start {
            if self.current_width + gap < self.capacity() {
                self.push_gap(gap);
            } else {
                self.break_line();
            }
        }
        atoms.iter().for_each(|a| self.push_atom(*a));
    }

    fn finish(mut self) -> Vec<String> {
        if self.lines.is_empty() || self.current.len() > self.indent.len() {
            self.lines.push(self.current);
        }
        self.lines
    }
}

/// Longest prefix of `indent` that leaves at least one column of `width`.
fn fit_indent(indent: &str, width: usize) -> &str {
    let room = width.saturating_sub(1);
    let mut used = 0;
    for (i, ch) in indent.char_indices() {
        used += ch.width().unwrap_or(0);
        if used > room {
            return &indent[..i];
        }
    }
    indent
}

/// Wrap one logical line to `width` columns. Continuation lines start with
/// `indent`, shortened if the terminal is too narrow for it. An empty input
/// yields a single empty line.
pub fn wrap_line(line: &str, width: usize, indent: &str) -> Vec<String> {
    if width == 0 {
        return vec![line.to_string()];
    }
    let indent = fit_indent(indent, width);
    let mut builder = LineBuilder {
        width,
        indent,
        indent_width: visible_width(indent),
        lines: Vec::new(),
        current: String::new(),
        current_width: 0,
    };
    let mut gap = 0;
    for chunk in chunks(line) {
        match chunk {
            Chunk::Gap(n) => gap += n,
            Chunk::Word { atoms, width } => {
                builder.push_word(&atoms, width, gap);
                gap = 0;
            }
        }
    }
    builder.finish()
}

/// Wrap every `\n`-separated line of `text` independently.
pub fn wrap_block(text: &str, width: usize, indent: &str) -> Vec<String> {
    text.split('\n')
        .flat_map(|line| wrap_line(line, width, indent))
        .collect()
}
