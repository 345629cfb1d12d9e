use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::session::SessionError;

// ── Record ────────────────────────────────────────────────────────────────────

/// One object reported by the server (status block, track, queue entry).
///
/// Field names are case-insensitive and stored lowercased. A field may carry
/// several values (e.g. a track with multiple `Artist` lines); `get` returns
/// the first one, `joined` folds all of them into a single display string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Vec<String>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `push`, handy for collaborators assembling responses.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Replace every value of `key` with `value`.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.0.insert(key.to_ascii_lowercase(), vec![value.into()]);
    }

    /// Append one more value to `key`.
    pub fn push(&mut self, key: &str, value: impl Into<String>) {
        self.0
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(&key.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0
            .get(&key.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All non-empty values of `key` joined by `sep`; `None` when there are none.
    pub fn joined(&self, key: &str, sep: &str) -> Option<String> {
        let values: Vec<&str> = self
            .get_all(key)
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(sep))
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(&key.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.push(k.as_ref(), v);
        }
        record
    }
}

// ── Subsystem ─────────────────────────────────────────────────────────────────

/// Notification topics the display waits on. Closed set: anything else the
/// server reports is rejected at parse time instead of being silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subsystem {
    /// Play queue contents changed.
    Queue,
    /// Playback started, stopped, paused, seeked or changed track.
    Player,
    /// Volume changed.
    Mixer,
    /// repeat / random / single / consume / crossfade changed.
    Options,
}

impl Subsystem {
    /// Every topic the display registers its blocking wait for.
    pub const WATCHED: [Subsystem; 4] = [
        Subsystem::Queue,
        Subsystem::Player,
        Subsystem::Mixer,
        Subsystem::Options,
    ];

    /// Name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Queue => "playlist",
            Subsystem::Player => "player",
            Subsystem::Mixer => "mixer",
            Subsystem::Options => "options",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subsystem {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "playlist" => Ok(Subsystem::Queue),
            "player" => Ok(Subsystem::Player),
            "mixer" => Ok(Subsystem::Mixer),
            "options" => Ok(Subsystem::Options),
            other => Err(SessionError::UnknownSubsystem(other.to_string())),
        }
    }
}

// ── RawSnapshot ───────────────────────────────────────────────────────────────

/// Last-known server state as reported, before any derivation.
///
/// Each facet is replaced wholesale; there are no per-field edits.
#[derive(Debug, Clone, Default)]
pub struct RawSnapshot {
    pub status: Record,
    /// `None` when nothing is loaded (the server answers with an empty object).
    pub current_track: Option<Record>,
    pub queue: Arc<Vec<Record>>,
}

impl RawSnapshot {
    pub fn apply_status_update(&mut self, status: Record) {
        self.status = status;
    }

    pub fn apply_track_update(&mut self, track: Option<Record>) {
        self.current_track = track.filter(|t| !t.is_empty());
    }

    pub fn apply_queue_update(&mut self, queue: Vec<Record>) {
        self.queue = Arc::new(queue);
    }

    /// Server-assigned identity of the current track (stable across queue moves).
    pub fn current_track_id(&self) -> Option<&str> {
        self.current_track.as_ref()?.get("id")
    }

    /// Zero-based queue position of the current track, if one is identifiable.
    ///
    /// The queue may have been re-fetched after the track was, so the entry
    /// is looked up by id first; the track's own `pos` is only a fallback.
    pub fn current_position(&self) -> Option<usize> {
        let track = self.current_track.as_ref()?;
        if let Some(id) = track.get("id") {
            if let Some(index) = self.queue.iter().position(|entry| entry.get("id") == Some(id)) {
                return Some(index);
            }
        }
        track.get("pos")?.trim().parse().ok()
    }
}
