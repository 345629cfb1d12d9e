use mpd_proto::session::SessionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("session failure: {0}")]
    Session(#[from] SessionError),
    #[error("terminal I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DisplayError>;
