//! Cursor-centred viewport over a long list.

use std::ops::Range;

/// Pick the `height`-row slice of a `total`-row list to show so that
/// `cursor` sits in the middle, clamping to the first or last page near the
/// ends instead of centring.
///
/// Returns the half-open range of row indices to display.
pub fn window(height: usize, total: usize, cursor: usize) -> Range<usize> {
    if total <= height {
        return 0..total;
    }
    if height == 0 {
        return 0..0;
    }

    let half = (height - 1) / 2;
    let tail = cursor + half + usize::from(height % 2 == 0);
    let head_overrun = cursor < half;
    let tail_overrun = tail >= total;

    let start = match (head_overrun, tail_overrun) {
        // With total > height the cursor cannot be within `half` of both ends.
        (true, true) => unreachable!(
            "window of {height} rows overruns both ends of {total} rows at cursor {cursor}"
        ),
        (true, false) => 0,
        (false, true) => total - height,
        (false, false) => cursor - half,
    };
    start..(start + height).min(total)
}
