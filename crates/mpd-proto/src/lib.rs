//! Shared vocabulary between the display core and the playback-session
//! collaborator: server records, notification topics, the session trait and
//! the user configuration.

pub mod config;
pub mod platform;
pub mod protocol;
pub mod session;
