//! Live "now playing" terminal display for a remote playback server.
//!
//! The server connection is supplied by the embedder as a
//! [`PlaybackSession`](mpd_proto::session::PlaybackSession); [`app::start`]
//! or [`app::run`] does the rest.

pub mod app;
pub mod error;
pub mod instrumentation;
pub mod logging;
pub mod metadata;
pub mod reconciler;
pub mod redraw;
pub mod render;
pub mod state;
pub mod terminal;
pub mod theme;
pub mod ticker;

pub use app::{run, start, DisplayHandle};
pub use error::{DisplayError, Result};
