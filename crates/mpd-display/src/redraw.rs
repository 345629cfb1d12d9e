//! Redraw coordination between the reconciler, the ticker and the renderer.
//!
//! Two generation counters carried on `watch` channels:
//!
//! - `changed`: bumped by the reconciler after publishing fresh server state.
//!   The ticker watches it to abandon a tick that a real update overtook.
//! - `redraw`: bumped by anyone who wants the screen refreshed. The renderer
//!   watches it; a `watch` only remembers the latest value, so any number of
//!   bumps between two renders collapse into one.

use tokio::sync::watch;

#[derive(Debug)]
pub struct RedrawCoordinator {
    changed: watch::Sender<u64>,
    redraw: watch::Sender<u64>,
}

impl Default for RedrawCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl RedrawCoordinator {
    pub fn new() -> Self {
        let (changed, _) = watch::channel(0);
        let (redraw, _) = watch::channel(0);
        Self { changed, redraw }
    }

    /// Server state changed: interrupt the ticker and redraw.
    pub fn notify_changed(&self) {
        self.changed.send_modify(|generation| *generation += 1);
        self.request_redraw();
    }

    pub fn request_redraw(&self) {
        self.redraw.send_modify(|generation| *generation += 1);
    }

    pub fn subscribe_changed(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    pub fn subscribe_redraw(&self) -> watch::Receiver<u64> {
        self.redraw.subscribe()
    }

    pub fn changed_generation(&self) -> u64 {
        *self.changed.borrow()
    }

    pub fn redraw_generation(&self) -> u64 {
        *self.redraw.borrow()
    }
}
