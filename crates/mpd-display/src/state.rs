//! State cache: the single owner of the last-known server snapshot and the
//! display record derived from it.
//!
//! Only the reconciler publishes. A publish swaps snapshot and metadata
//! together under one write lock, so readers never see a snapshot from one
//! batch paired with metadata from another. The ticker's elapsed-time nudge
//! goes through the same lock and is refused if a publish happened since the
//! ticker last looked. An applied nudge is written into both the metadata
//! and the snapshot's `elapsed`, so a later batch that does not re-fetch
//! status rebuilds from the ticked time.

use std::sync::Arc;

use mpd_proto::protocol::RawSnapshot;
use tokio::sync::RwLock;
use tracing::debug;

use crate::metadata::DisplayMetadata;

#[derive(Debug, Clone, Default)]
struct Published {
    /// Bumped by every publish; ticker adjustments leave it alone.
    rev: u64,
    snapshot: Arc<RawSnapshot>,
    metadata: Arc<DisplayMetadata>,
}

/// A consistent read of the cache.
#[derive(Debug, Clone)]
pub struct View {
    pub rev: u64,
    pub snapshot: Arc<RawSnapshot>,
    pub metadata: Arc<DisplayMetadata>,
}

#[derive(Debug, Default)]
pub struct StateCache {
    state: RwLock<Published>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Immutable handle to the current snapshot.
    pub async fn snapshot(&self) -> Arc<RawSnapshot> {
        Arc::clone(&self.state.read().await.snapshot)
    }

    pub async fn view(&self) -> View {
        let state = self.state.read().await;
        View {
            rev: state.rev,
            snapshot: Arc::clone(&state.snapshot),
            metadata: Arc::clone(&state.metadata),
        }
    }

    /// Replace snapshot and metadata in one step. Returns the new revision.
    pub async fn publish(&self, snapshot: RawSnapshot, metadata: DisplayMetadata) -> u64 {
        self.publish_batch(snapshot, metadata, true).await
    }

    /// Like [`publish`](Self::publish), for a batch built on an earlier read
    /// of the cache. When `status_fetched` is false the batch's status is the
    /// cached one, which the ticker may have moved on since; the current
    /// status and elapsed time are carried over so the display never jumps
    /// back.
    pub async fn publish_batch(
        &self,
        mut snapshot: RawSnapshot,
        mut metadata: DisplayMetadata,
        status_fetched: bool,
    ) -> u64 {
        let mut state = self.state.write().await;
        if !status_fetched && snapshot.current_track_id() == state.snapshot.current_track_id() {
            snapshot.status = state.snapshot.status.clone();
            metadata.elapsed_seconds = state.metadata.elapsed_seconds;
            metadata.percent_elapsed = state.metadata.percent_elapsed;
        }
        state.rev += 1;
        state.snapshot = Arc::new(snapshot);
        state.metadata = Arc::new(metadata);
        debug!("state: published rev {}", state.rev);
        state.rev
    }

    /// Add `seconds` to the displayed elapsed time, but only if nothing was
    /// published since `seen_rev`, the same track is loaded and it is still
    /// playing. Returns whether the increment was applied.
    pub async fn advance_elapsed(&self, seen_rev: u64, track_id: Option<&str>, seconds: u64) -> bool {
        let mut state = self.state.write().await;
        if state.rev != seen_rev
            || state.snapshot.current_track_id() != track_id
            || !state.metadata.play_state.is_playing()
        {
            return false;
        }
        let metadata = Arc::make_mut(&mut state.metadata);
        metadata.advance(seconds);
        let elapsed = metadata.elapsed_seconds.to_string();
        Arc::make_mut(&mut state.snapshot).status.insert("elapsed", elapsed);
        true
    }

    /// Drop everything back to defaults (shutdown).
    pub async fn clear(&self) {
        *self.state.write().await = Published::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{build_metadata, PlayState};
    use mpd_proto::protocol::Record;

    fn playing_snapshot(track_id: &str) -> RawSnapshot {
        let mut snap = RawSnapshot::default();
        snap.apply_status_update(
            Record::new()
                .with("state", "play")
                .with("elapsed", "10")
                .with("duration", "100"),
        );
        snap.apply_track_update(Some(Record::new().with("id", track_id).with("pos", "0")));
        snap
    }

    #[tokio::test]
    async fn test_publish_is_atomic_and_bumps_rev() {
        let cache = StateCache::new();
        assert_eq!(cache.view().await.rev, 0);

        let snap = playing_snapshot("7");
        let meta = build_metadata(&snap, 0);
        let rev = cache.publish(snap, meta.clone()).await;
        assert_eq!(rev, 1);

        let view = cache.view().await;
        assert_eq!(view.rev, 1);
        assert_eq!(view.snapshot.current_track_id(), Some("7"));
        assert_eq!(*view.metadata, meta);
    }

    #[tokio::test]
    async fn test_advance_elapsed_guards() {
        let cache = StateCache::new();
        let snap = playing_snapshot("7");
        let meta = build_metadata(&snap, 0);
        let rev = cache.publish(snap, meta).await;

        assert!(!cache.advance_elapsed(rev - 1, Some("7"), 2).await);
        assert!(!cache.advance_elapsed(rev, Some("8"), 2).await);
        assert!(cache.advance_elapsed(rev, Some("7"), 2).await);

        let view = cache.view().await;
        assert_eq!(view.rev, rev);
        assert_eq!(view.metadata.elapsed_seconds, 12);
        assert_eq!(view.metadata.percent_elapsed, 12);
        assert_eq!(view.snapshot.status.get("elapsed"), Some("12"));
    }

    #[tokio::test]
    async fn test_batch_without_status_keeps_ticked_elapsed() {
        let cache = StateCache::new();
        let snap = playing_snapshot("7");
        let meta = build_metadata(&snap, 0);
        let rev = cache.publish(snap, meta).await;

        // A queue-only batch read the cache before the tick landed.
        let mut stale = (*cache.snapshot().await).clone();
        assert!(cache.advance_elapsed(rev, Some("7"), 4).await);
        stale.apply_queue_update(vec![Record::new().with("id", "7")]);
        let stale_meta = build_metadata(&stale, 0);
        assert_eq!(stale_meta.elapsed_seconds, 10);

        cache.publish_batch(stale, stale_meta, false).await;
        let view = cache.view().await;
        assert_eq!(view.metadata.elapsed_seconds, 14);
        assert_eq!(view.metadata.percent_elapsed, 14);
        assert_eq!(view.snapshot.status.get("elapsed"), Some("14"));
        assert_eq!(view.snapshot.queue.len(), 1);
    }

    #[tokio::test]
    async fn test_advance_elapsed_refused_when_paused() {
        let cache = StateCache::new();
        let mut snap = playing_snapshot("7");
        let mut status = snap.status.clone();
        status.insert("state", "pause");
        snap.apply_status_update(status);
        let meta = build_metadata(&snap, 0);
        assert_eq!(meta.play_state, PlayState::Paused);
        let rev = cache.publish(snap, meta).await;

        assert!(!cache.advance_elapsed(rev, Some("7"), 2).await);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = StateCache::new();
        let snap = playing_snapshot("7");
        let meta = build_metadata(&snap, 0);
        cache.publish(snap, meta).await;
        cache.clear().await;
        let view = cache.view().await;
        assert_eq!(view.rev, 0);
        assert!(view.snapshot.current_track.is_none());
    }
}
