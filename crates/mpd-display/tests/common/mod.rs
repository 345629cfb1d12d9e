//! Scripted in-memory session and terminal for driving a display in tests.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mpd_display::terminal::{TermSize, Terminal};
use mpd_proto::protocol::{Record, Subsystem};
use mpd_proto::session::{PlaybackSession, SessionError};
use tokio::sync::{mpsc, Notify};

type WaitResult = Result<Vec<Subsystem>, SessionError>;

/// Serves whatever state the test sets, and hands out queued notifications
/// one `wait_for_change` call at a time.
pub struct ScriptedSession {
    status: Mutex<Record>,
    track: Mutex<Option<Record>>,
    queue: Mutex<Vec<Record>>,
    album_size: usize,
    notify_tx: mpsc::UnboundedSender<WaitResult>,
    notify_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<WaitResult>>,
    cancel: Notify,
    pub status_fetches: AtomicUsize,
    pub track_fetches: AtomicUsize,
    pub queue_fetches: AtomicUsize,
    pub album_lookups: AtomicUsize,
    pub cancels: AtomicUsize,
}

impl ScriptedSession {
    pub fn new() -> Arc<Self> {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            status: Mutex::new(Record::new()),
            track: Mutex::new(None),
            queue: Mutex::new(Vec::new()),
            album_size: 12,
            notify_tx,
            notify_rx: tokio::sync::Mutex::new(notify_rx),
            cancel: Notify::new(),
            status_fetches: AtomicUsize::new(0),
            track_fetches: AtomicUsize::new(0),
            queue_fetches: AtomicUsize::new(0),
            album_lookups: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
        })
    }

    /// A session already playing track 2 of a five-entry queue.
    pub fn playing(state: &str, elapsed: &str) -> Arc<Self> {
        let session = Self::new();
        session.set_status(
            Record::new()
                .with("state", state)
                .with("song", "1")
                .with("elapsed", elapsed)
                .with("duration", "240")
                .with("volume", "70")
                .with("repeat", "1")
                .with("random", "0")
                .with("single", "0")
                .with("consume", "0"),
        );
        session.set_track(Some(
            Record::new()
                .with("title", "Second")
                .with("artist", "Band")
                .with("album", "Record")
                .with("track", "2/5")
                .with("pos", "1")
                .with("id", "11"),
        ));
        session.set_queue(
            ["First", "Second", "Third", "Fourth", "Fifth"]
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    Record::new()
                        .with("title", *title)
                        .with("artist", "Band")
                        .with("pos", i.to_string())
                        .with("id", (10 + i).to_string())
                })
                .collect(),
        );
        session
    }

    pub fn set_status(&self, status: Record) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_track(&self, track: Option<Record>) {
        *self.track.lock().unwrap() = track;
    }

    pub fn set_queue(&self, queue: Vec<Record>) {
        *self.queue.lock().unwrap() = queue;
    }

    /// Queue one change notification.
    pub fn notify(&self, events: &[Subsystem]) {
        self.notify_tx.send(Ok(events.to_vec())).unwrap();
    }

    /// Make the next wait fail as if the connection dropped.
    pub fn drop_connection(&self) {
        self.notify_tx
            .send(Err(SessionError::Disconnected("connection reset".into())))
            .unwrap();
    }

    pub fn fetches(&self) -> (usize, usize, usize) {
        (
            self.status_fetches.load(Ordering::SeqCst),
            self.track_fetches.load(Ordering::SeqCst),
            self.queue_fetches.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl PlaybackSession for ScriptedSession {
    async fn status(&self) -> Result<Record, SessionError> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.status.lock().unwrap().clone())
    }

    async fn current_track(&self) -> Result<Option<Record>, SessionError> {
        self.track_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.track.lock().unwrap().clone())
    }

    async fn queue(&self) -> Result<Vec<Record>, SessionError> {
        self.queue_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.queue.lock().unwrap().clone())
    }

    async fn wait_for_change(&self, _topics: &[Subsystem]) -> Result<Vec<Subsystem>, SessionError> {
        let mut rx = self.notify_rx.lock().await;
        tokio::select! {
            biased;
            next = rx.recv() => next.unwrap_or_else(|| Ok(Vec::new())),
            _ = self.cancel.notified() => Ok(Vec::new()),
        }
    }

    async fn cancel_wait(&self) -> Result<(), SessionError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancel.notify_waiters();
        Ok(())
    }

    async fn find_by_field(&self, _field: &str, _value: &str) -> Result<Vec<Record>, SessionError> {
        self.album_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Record::new(); self.album_size])
    }
}

/// Keeps every frame written to it.
pub struct RecordingTerminal {
    size: TermSize,
    frames: Mutex<Vec<String>>,
    cursor_visible: AtomicBool,
    broken: AtomicBool,
}

impl RecordingTerminal {
    pub fn new(width: usize, height: usize) -> Arc<Self> {
        Arc::new(Self {
            size: TermSize::new(width, height),
            frames: Mutex::new(Vec::new()),
            cursor_visible: AtomicBool::new(true),
            broken: AtomicBool::new(false),
        })
    }

    /// A terminal whose every frame write fails, like a closed stdout.
    pub fn broken(width: usize, height: usize) -> Arc<Self> {
        let terminal = Self::new(width, height);
        terminal.broken.store(true, Ordering::SeqCst);
        terminal
    }

    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn last_frame(&self) -> String {
        self.frames.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible.load(Ordering::SeqCst)
    }
}

impl Terminal for RecordingTerminal {
    fn size(&self) -> io::Result<TermSize> {
        Ok(self.size)
    }

    fn write_frame(&self, frame: &str) -> io::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
        }
        self.frames.lock().unwrap().push(frame.to_string());
        Ok(())
    }

    fn set_cursor_visible(&self, visible: bool) -> io::Result<()> {
        self.cursor_visible.store(visible, Ordering::SeqCst);
        Ok(())
    }
}
