//! The playback-session collaborator, as seen by the display.
//!
//! The display never speaks the wire protocol itself. Whoever embeds it
//! supplies an implementation of [`PlaybackSession`] that owns the
//! connection; the display only issues these six calls.

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::{Record, Subsystem};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection dropped or could not be used.
    #[error("session disconnected: {0}")]
    Disconnected(String),
    /// The server answered with something that could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The server reported a change topic outside [`Subsystem`].
    #[error("unknown subsystem '{0}'")]
    UnknownSubsystem(String),
}

/// Narrow interface onto a remote playback server.
///
/// Implementations must allow `cancel_wait` to be called while another task
/// is suspended in `wait_for_change`: the two methods are always used
/// concurrently.
#[async_trait]
pub trait PlaybackSession: Send + Sync {
    /// Current status block (state, volume, flags, elapsed, ...).
    async fn status(&self) -> Result<Record, SessionError>;

    /// The currently loaded track, `None` when nothing is loaded.
    async fn current_track(&self) -> Result<Option<Record>, SessionError>;

    /// Every entry of the play queue, in queue order.
    async fn queue(&self) -> Result<Vec<Record>, SessionError>;

    /// Block until at least one of `topics` changes and return the changed
    /// ones. Returns an empty list when the wait was cancelled through
    /// [`cancel_wait`](Self::cancel_wait).
    async fn wait_for_change(&self, topics: &[Subsystem]) -> Result<Vec<Subsystem>, SessionError>;

    /// Unblock an in-flight `wait_for_change`. A no-op when none is pending.
    async fn cancel_wait(&self) -> Result<(), SessionError>;

    /// Exact-match search on one field; used for album track totals.
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<Record>, SessionError>;
}
