//! Event reconciler: turns server change notifications into state updates.
//!
//! Blocks on the session's change wait, coalesces bursts of notifications
//! into one batch, re-fetches only the facets the batch touched, rebuilds the
//! display metadata once and raises one redraw.
//!
//! Debounce: the first notification of a burst starts a deadline. Further
//! notifications before it fires are merged into the batch but do not push
//! it back, so a steady stream of changes still redraws at a bounded rate.
//! When the deadline fires the outstanding wait is cancelled through the
//! session and the batch is applied.

use std::sync::Arc;
use std::time::Duration;

use mpd_proto::protocol::Subsystem;
use mpd_proto::session::PlaybackSession;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::instrumentation::{Counter, Instrumentation};
use crate::metadata::MetadataDeriver;
use crate::redraw::RedrawCoordinator;
use crate::state::StateCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Blocked in the session's change wait.
    Waiting,
    /// Collecting a burst until the debounce deadline.
    Draining,
    ShuttingDown,
}

/// Which facets of the snapshot a batch has to re-fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Refresh {
    pub status: bool,
    pub track: bool,
    pub queue: bool,
}

impl Refresh {
    pub const ALL: Refresh = Refresh {
        status: true,
        track: true,
        queue: true,
    };

    pub fn for_events(events: &[Subsystem]) -> Self {
        let mut refresh = Refresh::default();
        refresh.merge(events);
        refresh
    }

    pub fn merge(&mut self, events: &[Subsystem]) {
        for event in events {
            match event {
                Subsystem::Player => {
                    self.status = true;
                    self.track = true;
                }
                Subsystem::Mixer | Subsystem::Options => self.status = true,
                Subsystem::Queue => self.queue = true,
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.status || self.track || self.queue)
    }
}

pub struct Reconciler {
    session: Arc<dyn PlaybackSession>,
    state: Arc<StateCache>,
    redraw: Arc<RedrawCoordinator>,
    instrumentation: Arc<Instrumentation>,
    deriver: MetadataDeriver,
    coalesce_delay: Duration,
    phase: Phase,
}

impl Reconciler {
    pub fn new(
        session: Arc<dyn PlaybackSession>,
        state: Arc<StateCache>,
        redraw: Arc<RedrawCoordinator>,
        instrumentation: Arc<Instrumentation>,
        coalesce_delay: Duration,
    ) -> Self {
        let deriver = MetadataDeriver::new(Arc::clone(&instrumentation));
        Self {
            session,
            state,
            redraw,
            instrumentation,
            deriver,
            coalesce_delay,
            phase: Phase::Idle,
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            debug!("Reconciler: {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Fetch every facet and publish. Used once before the wait loop starts.
    pub async fn load_all(&mut self) -> Result<()> {
        info!("Reconciler: initial load");
        self.apply(Refresh::ALL).await
    }

    /// Re-fetch the facets in `refresh`, rebuild metadata and publish both in
    /// one step, then signal a single redraw.
    async fn apply(&mut self, refresh: Refresh) -> Result<()> {
        let mut snapshot = (*self.state.snapshot().await).clone();
        if refresh.status {
            snapshot.apply_status_update(self.session.status().await?);
        }
        if refresh.track {
            snapshot.apply_track_update(self.session.current_track().await?);
        }
        if refresh.queue {
            snapshot.apply_queue_update(self.session.queue().await?);
        }

        let metadata = self.deriver.derive(&snapshot, self.session.as_ref()).await;
        let rev = self.state.publish_batch(snapshot, metadata, refresh.status).await;
        debug!("Reconciler: applied {:?} as rev {}", refresh, rev);
        self.redraw.notify_changed();
        Ok(())
    }

    /// Run until `token` is cancelled or the session fails.
    ///
    /// Errors seen after cancellation are part of shutdown and are not
    /// reported.
    pub async fn run(mut self, token: CancellationToken) -> Result<()> {
        let outcome = self.wait_loop(&token).await;
        self.enter(Phase::ShuttingDown);
        match outcome {
            Err(e) if token.is_cancelled() => {
                debug!("Reconciler: ignoring error during shutdown: {}", e);
                Ok(())
            }
            Err(e) => {
                error!("Reconciler: session failed: {}", e);
                Err(e)
            }
            Ok(()) => {
                info!("Reconciler: stopped");
                Ok(())
            }
        }
    }

    async fn wait_loop(&mut self, token: &CancellationToken) -> Result<()> {
        let session = Arc::clone(&self.session);
        loop {
            self.enter(Phase::Idle);
            if token.is_cancelled() {
                return Ok(());
            }

            self.enter(Phase::Waiting);
            let first = tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(()),
                res = session.wait_for_change(&Subsystem::WATCHED) => res?,
            };
            if first.is_empty() {
                // Cancelled wait with no shutdown behind it; just wait again.
                debug!("Reconciler: empty wake-up");
                continue;
            }
            debug!("Reconciler: notified {:?}", first);

            self.enter(Phase::Draining);
            let Some(refresh) = self
                .drain(session.as_ref(), token, Refresh::for_events(&first))
                .await?
            else {
                return Ok(());
            };

            self.instrumentation.bump(Counter::Idle);
            self.apply(refresh).await?;
        }
    }

    /// Keep waiting for more notifications until the debounce deadline.
    /// Returns `None` if shutdown interrupted the burst.
    async fn drain(
        &self,
        session: &dyn PlaybackSession,
        token: &CancellationToken,
        mut refresh: Refresh,
    ) -> Result<Option<Refresh>> {
        let deadline = tokio::time::sleep(self.coalesce_delay);
        tokio::pin!(deadline);
        let mut deadline_passed = false;

        loop {
            let wait = session.wait_for_change(&Subsystem::WATCHED);
            tokio::pin!(wait);

            let events = loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Ok(None),
                    res = &mut wait => break res?,
                    _ = &mut deadline, if !deadline_passed => {
                        deadline_passed = true;
                        session.cancel_wait().await?;
                    }
                }
            };

            if events.is_empty() {
                return Ok(Some(refresh));
            }
            debug!("Reconciler: coalescing {:?}", events);
            refresh.merge(&events);
            if deadline_passed {
                return Ok(Some(refresh));
            }
        }
    }
}
