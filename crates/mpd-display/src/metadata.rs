//! Derivation of the flat display record from a raw server snapshot.
//!
//! Everything here is pure except the album-total memo, which asks the
//! server for the album's track count the first time a new album is seen.

use std::sync::Arc;

use mpd_proto::protocol::{RawSnapshot, Record};
use mpd_proto::session::PlaybackSession;
use tracing::{debug, warn};

use crate::instrumentation::{Counter, Instrumentation};

/// Shown for text fields the server did not report.
pub const UNKNOWN: &str = "Unknown";
/// Shown instead of the flag letters when any flag is missing from status.
pub const UNKNOWN_FLAGS: &str = "????";
/// Joins the values of multi-valued fields (e.g. several artists).
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

const FLAG_KEYS: [&str; 4] = ["repeat", "random", "single", "consume"];
const FLAG_LETTERS: &str = "ersc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayState {
    Playing,
    Paused,
    #[default]
    Stopped,
}

impl PlayState {
    fn from_status(status: &Record) -> Self {
        match status.get("state") {
            Some("play") => PlayState::Playing,
            Some("pause") => PlayState::Paused,
            _ => PlayState::Stopped,
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlayState::Playing
    }
}

/// Everything the renderer shows, already formatted-ready.
///
/// Rebuilt as a whole for every batch of changes; the only field ever touched
/// in place is `elapsed_seconds` (with `percent_elapsed`), by the ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMetadata {
    pub title: String,
    pub artist: String,
    pub album_track_index: u32,
    pub album_track_total: usize,
    pub album_name: String,
    pub play_state: PlayState,
    /// 1-based position of the current track in the queue, 0 when none.
    pub queue_position: usize,
    pub queue_length: usize,
    pub elapsed_seconds: u64,
    pub duration_seconds: u64,
    pub percent_elapsed: u64,
    pub flag_summary: String,
    pub volume_percent: i32,
    pub crossfade_seconds: u32,
}

impl Default for DisplayMetadata {
    fn default() -> Self {
        build_metadata(&RawSnapshot::default(), 0)
    }
}

impl DisplayMetadata {
    /// Advance the locally simulated play position.
    pub fn advance(&mut self, seconds: u64) {
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(seconds);
        self.percent_elapsed = percent_elapsed(self.elapsed_seconds, self.duration_seconds);
    }
}

/// `floor(100 * elapsed / duration)`, or 0 for an unknown (zero) duration.
pub fn percent_elapsed(elapsed: u64, duration: u64) -> u64 {
    if duration == 0 {
        return 0;
    }
    elapsed.saturating_mul(100) / duration
}

/// Four letters for repeat/random/single/consume, uppercase when enabled.
/// Any missing flag makes the whole summary [`UNKNOWN_FLAGS`].
pub fn flag_summary(status: &Record) -> String {
    let mut out = String::with_capacity(FLAG_KEYS.len());
    for (key, letter) in FLAG_KEYS.iter().zip(FLAG_LETTERS.chars()) {
        match status.get(key) {
            Some("1") => out.push(letter.to_ascii_uppercase()),
            Some(_) => out.push(letter),
            None => return UNKNOWN_FLAGS.to_string(),
        }
    }
    out
}

fn text_field(record: Option<&Record>, key: &str) -> String {
    record
        .and_then(|r| r.joined(key, MULTI_VALUE_SEPARATOR))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Leading integer of a field such as `"3/12"`; 0 when absent or unparsable.
fn leading_int<T: std::str::FromStr + Default>(value: Option<&str>) -> T {
    value
        .map(|v| {
            let v = v.trim();
            let end = v
                .char_indices()
                .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
                .map_or(v.len(), |(i, _)| i);
            &v[..end]
        })
        .and_then(|digits| digits.parse().ok())
        .unwrap_or_default()
}

/// Whole seconds from a fractional field like `"27.345"`.
fn seconds(value: Option<&str>) -> Option<u64> {
    let secs: f64 = value?.trim().parse().ok()?;
    Some(secs.max(0.0) as u64)
}

/// `elapsed`/`duration` from status, falling back to the older combined
/// `time = "elapsed:total"` field.
fn timeline(status: &Record) -> (u64, u64) {
    let mut combined = status
        .get("time")
        .map(|t| t.split(':').map(|p| seconds(Some(p))).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();
    let time_elapsed = combined.next().flatten();
    let time_total = combined.next().flatten();

    let elapsed = seconds(status.get("elapsed")).or(time_elapsed).unwrap_or(0);
    let duration = seconds(status.get("duration")).or(time_total).unwrap_or(0);
    (elapsed, duration)
}

/// Pure derivation; `album_track_total` comes from the caller's memo.
pub fn build_metadata(snapshot: &RawSnapshot, album_track_total: usize) -> DisplayMetadata {
    let status = &snapshot.status;
    let track = snapshot.current_track.as_ref();
    let (elapsed_seconds, duration_seconds) = timeline(status);
    let song: Option<i64> = status.get("song").and_then(|s| s.trim().parse().ok());

    DisplayMetadata {
        title: text_field(track, "title"),
        artist: text_field(track, "artist"),
        album_track_index: leading_int(track.and_then(|t| t.get("track"))),
        album_track_total,
        album_name: text_field(track, "album"),
        play_state: PlayState::from_status(status),
        queue_position: snapshot
            .current_position()
            .or_else(|| song.and_then(|s| usize::try_from(s).ok()))
            .map_or(0, |pos| pos + 1),
        queue_length: snapshot.queue.len(),
        elapsed_seconds,
        duration_seconds,
        percent_elapsed: percent_elapsed(elapsed_seconds, duration_seconds),
        flag_summary: flag_summary(status),
        volume_percent: leading_int(status.get("volume")),
        crossfade_seconds: leading_int(status.get("xfade")),
    }
}

// ── Album totals ──────────────────────────────────────────────────────────────

/// Memo of `album name → track count`, refreshed only when the album changes.
#[derive(Debug, Default)]
pub struct AlbumTotalCache {
    entry: Option<(String, usize)>,
}

impl AlbumTotalCache {
    pub async fn lookup(
        &mut self,
        album: Option<&str>,
        session: &dyn PlaybackSession,
        instrumentation: &Instrumentation,
    ) -> usize {
        let Some(album) = album else {
            return 0;
        };
        if let Some((cached, total)) = &self.entry {
            if cached == album {
                return *total;
            }
        }

        instrumentation.bump(Counter::Album);
        match session.find_by_field("album", album).await {
            Ok(matches) => {
                debug!("album {:?} has {} tracks", album, matches.len());
                self.entry = Some((album.to_string(), matches.len()));
                matches.len()
            }
            Err(e) => {
                // Leave the memo alone so the next rebuild retries.
                warn!("album total lookup for {:?} failed: {}", album, e);
                0
            }
        }
    }
}

/// Owns the album memo and turns snapshots into [`DisplayMetadata`].
pub struct MetadataDeriver {
    album_totals: AlbumTotalCache,
    instrumentation: Arc<Instrumentation>,
}

impl MetadataDeriver {
    pub fn new(instrumentation: Arc<Instrumentation>) -> Self {
        Self {
            album_totals: AlbumTotalCache::default(),
            instrumentation,
        }
    }

    pub async fn derive(
        &mut self,
        snapshot: &RawSnapshot,
        session: &dyn PlaybackSession,
    ) -> DisplayMetadata {
        let album = snapshot
            .current_track
            .as_ref()
            .and_then(|t| t.get("album"))
            .filter(|a| !a.is_empty());
        let total = self
            .album_totals
            .lookup(album, session, &self.instrumentation)
            .await;
        self.instrumentation.bump(Counter::Meta);
        build_metadata(snapshot, total)
    }
}
