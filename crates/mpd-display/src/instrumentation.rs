//! Debug counters for redraw and rebuild activity.
//!
//! The counters are always maintained; `enabled` only controls whether the
//! renderer shows them. One instance is created per display and shared by
//! handle with the tasks that bump it.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Frames rendered.
    Display,
    /// Notification batches handled by the reconciler.
    Idle,
    /// Display-metadata rebuilds.
    Meta,
    /// Album-total lookups sent to the server.
    Album,
}

impl Counter {
    const ALL: [Counter; 4] = [Counter::Display, Counter::Idle, Counter::Meta, Counter::Album];

    fn label(self) -> char {
        match self {
            Counter::Display => 'D',
            Counter::Idle => 'I',
            Counter::Meta => 'M',
            Counter::Album => 'A',
        }
    }
}

#[derive(Debug, Default)]
pub struct Instrumentation {
    enabled: bool,
    display: AtomicU64,
    idle: AtomicU64,
    meta: AtomicU64,
    album: AtomicU64,
}

impl Instrumentation {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    fn slot(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::Display => &self.display,
            Counter::Idle => &self.idle,
            Counter::Meta => &self.meta,
            Counter::Album => &self.album,
        }
    }

    pub fn bump(&self, counter: Counter) {
        self.slot(counter).fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.slot(counter).load(Ordering::Relaxed)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// ` D: n I: n M: n A: n` when enabled, `None` otherwise.
    pub fn summary(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        Some(
            Counter::ALL
                .iter()
                .map(|c| format!(" {}: {}", c.label(), self.get(*c)))
                .collect(),
        )
    }
}
