//! Progress ticker. Moves the displayed elapsed time forward between server
//! notifications while a track is playing.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::redraw::RedrawCoordinator;
use crate::state::StateCache;

pub struct Ticker {
    state: Arc<StateCache>,
    redraw: Arc<RedrawCoordinator>,
    interval: Duration,
}

impl Ticker {
    pub fn new(state: Arc<StateCache>, redraw: Arc<RedrawCoordinator>, interval: Duration) -> Self {
        Self {
            state,
            redraw,
            interval,
        }
    }

    /// Tick until `token` is cancelled.
    ///
    /// Each round waits one interval for a "changed" signal. A timeout means
    /// nothing real happened, so the interval is added to the elapsed time;
    /// an early signal means fresh server state is already published and the
    /// round is dropped. While not playing, it just waits for the next change.
    pub async fn run(self, token: CancellationToken) {
        let mut changed = self.redraw.subscribe_changed();
        let step = self.interval.as_secs();

        loop {
            changed.borrow_and_update();
            let view = self.state.view().await;

            if !view.metadata.play_state.is_playing() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    res = changed.changed() => if res.is_err() { break },
                }
                continue;
            }

            let track_id = view.snapshot.current_track_id().map(str::to_owned);
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = changed.changed() => {
                    if res.is_err() {
                        break;
                    }
                    debug!("Ticker: interrupted by a change");
                }
                _ = tokio::time::sleep(self.interval) => {
                    if self.state.advance_elapsed(view.rev, track_id.as_deref(), step).await {
                        self.redraw.request_redraw();
                    } else {
                        debug!("Ticker: state moved on, tick dropped");
                    }
                }
            }
        }
        info!("Ticker: stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::build_metadata;
    use mpd_proto::protocol::{RawSnapshot, Record};

    fn snapshot(state: &str, elapsed: &str) -> RawSnapshot {
        let mut snap = RawSnapshot::default();
        snap.apply_status_update(
            Record::new()
                .with("state", state)
                .with("elapsed", elapsed)
                .with("duration", "200"),
        );
        snap.apply_track_update(Some(Record::new().with("id", "3").with("pos", "0")));
        snap
    }

    async fn publish(state: &StateCache, snap: RawSnapshot) {
        let meta = build_metadata(&snap, 0);
        state.publish(snap, meta).await;
    }

    fn spawn_ticker(
        state: &Arc<StateCache>,
        redraw: &Arc<RedrawCoordinator>,
    ) -> (CancellationToken, tokio::task::JoinHandle<()>) {
        let token = CancellationToken::new();
        let ticker = Ticker::new(Arc::clone(state), Arc::clone(redraw), Duration::from_secs(2));
        let handle = tokio::spawn(ticker.run(token.clone()));
        (token, handle)
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_once_per_interval() {
        let state = Arc::new(StateCache::new());
        let redraw = Arc::new(RedrawCoordinator::new());
        publish(&state, snapshot("play", "10")).await;
        let (token, handle) = spawn_ticker(&state, &redraw);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(state.view().await.metadata.elapsed_seconds, 12);
        assert_eq!(redraw.redraw_generation(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(state.view().await.metadata.elapsed_seconds, 14);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_real_change_preempts_tick() {
        let state = Arc::new(StateCache::new());
        let redraw = Arc::new(RedrawCoordinator::new());
        publish(&state, snapshot("play", "10")).await;
        let (token, handle) = spawn_ticker(&state, &redraw);

        tokio::time::sleep(Duration::from_secs(1)).await;
        publish(&state, snapshot("play", "50")).await;
        redraw.notify_changed();

        // The interrupted round is dropped and a fresh interval starts.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(state.view().await.metadata.elapsed_seconds, 50);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.view().await.metadata.elapsed_seconds, 52);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_while_paused() {
        let state = Arc::new(StateCache::new());
        let redraw = Arc::new(RedrawCoordinator::new());
        publish(&state, snapshot("pause", "10")).await;
        let (token, handle) = spawn_ticker(&state, &redraw);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(state.view().await.metadata.elapsed_seconds, 10);
        assert_eq!(redraw.redraw_generation(), 0);

        token.cancel();
        handle.await.unwrap();
    }
}
