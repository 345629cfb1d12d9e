//! Wiring: builds the shared state, runs the initial load, spawns the
//! reconciler, ticker and renderer tasks and tears them down again.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mpd_proto::config::{Config, DisplayConfig};
use mpd_proto::session::PlaybackSession;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::instrumentation::{Counter, Instrumentation};
use crate::reconciler::Reconciler;
use crate::redraw::RedrawCoordinator;
use crate::render::render_frame;
use crate::state::StateCache;
use crate::terminal::{StdoutTerminal, TermSize, Terminal};
use crate::ticker::Ticker;

/// Draws the current state to the terminal on request.
struct Renderer {
    state: Arc<StateCache>,
    terminal: Arc<dyn Terminal>,
    display: DisplayConfig,
    instrumentation: Arc<Instrumentation>,
}

impl Renderer {
    async fn draw(&self) -> Result<()> {
        let view = self.state.view().await;
        let size = self.terminal.size().unwrap_or_else(|e| {
            debug!("Renderer: size query failed ({}), using {:?}", e, TermSize::FALLBACK);
            TermSize::FALLBACK
        });

        self.instrumentation.bump(Counter::Display);
        let summary = self.instrumentation.summary();
        let frame = render_frame(
            &view.metadata,
            &view.snapshot,
            size,
            &self.display,
            summary.as_deref(),
        );
        self.terminal.write_frame(&frame.to_output())?;
        Ok(())
    }

    async fn run(self, redraw: Arc<RedrawCoordinator>, token: CancellationToken) {
        let mut requests = redraw.subscribe_redraw();
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = requests.changed() => if res.is_err() { break },
            }
            // Everything requested up to here is covered by this frame.
            requests.borrow_and_update();
            if let Err(e) = self.draw().await {
                warn!("Renderer: frame not written: {}", e);
            }
        }
        info!("Renderer: stopped");
    }
}

/// A running display. Dropping it without [`shutdown`](Self::shutdown)
/// leaves the tasks running until the runtime stops.
pub struct DisplayHandle {
    token: CancellationToken,
    session: Arc<dyn PlaybackSession>,
    terminal: Arc<dyn Terminal>,
    state: Arc<StateCache>,
    redraw: Arc<RedrawCoordinator>,
    instrumentation: Arc<Instrumentation>,
    reconciler: Option<JoinHandle<Result<()>>>,
    ticker: JoinHandle<()>,
    renderer: JoinHandle<()>,
    grace: Duration,
}

/// Load everything, draw the first frame and start the background tasks.
pub async fn start(
    session: Arc<dyn PlaybackSession>,
    terminal: Arc<dyn Terminal>,
    config: &Config,
) -> Result<DisplayHandle> {
    let state = Arc::new(StateCache::new());
    let redraw = Arc::new(RedrawCoordinator::new());
    let instrumentation = Arc::new(Instrumentation::new(config.debug));

    let mut reconciler = Reconciler::new(
        Arc::clone(&session),
        Arc::clone(&state),
        Arc::clone(&redraw),
        Arc::clone(&instrumentation),
        config.display.coalesce_delay(),
    );
    reconciler.load_all().await?;

    if let Err(e) = terminal.set_cursor_visible(false) {
        warn!("Display: could not hide cursor: {}", e);
    }
    let renderer = Renderer {
        state: Arc::clone(&state),
        terminal: Arc::clone(&terminal),
        display: config.display.clone(),
        instrumentation: Arc::clone(&instrumentation),
    };
    if let Err(e) = renderer.draw().await {
        if let Err(restore) = terminal.set_cursor_visible(true) {
            warn!("Display: could not restore cursor: {}", restore);
        }
        return Err(e);
    }

    let token = CancellationToken::new();
    let ticker = Ticker::new(
        Arc::clone(&state),
        Arc::clone(&redraw),
        config.display.tick_interval(),
    );

    info!("Display: started");
    Ok(DisplayHandle {
        reconciler: Some(tokio::spawn(reconciler.run(token.clone()))),
        ticker: tokio::spawn(ticker.run(token.clone())),
        renderer: tokio::spawn(renderer.run(Arc::clone(&redraw), token.clone())),
        token,
        session,
        terminal,
        state,
        redraw,
        instrumentation,
        grace: config.display.shutdown_grace(),
    })
}

/// Wait for `handle` at most `grace`, then abort it.
async fn join_bounded<T>(name: &str, mut handle: JoinHandle<T>, grace: Duration) -> Option<T> {
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!("Display: {} task failed: {}", name, e);
            None
        }
        Err(_) => {
            warn!("Display: {} task still running after {:?}, aborting", name, grace);
            handle.abort();
            None
        }
    }
}

impl DisplayHandle {
    pub fn state(&self) -> &Arc<StateCache> {
        &self.state
    }

    pub fn redraw(&self) -> &Arc<RedrawCoordinator> {
        &self.redraw
    }

    pub fn instrumentation(&self) -> &Arc<Instrumentation> {
        &self.instrumentation
    }

    /// Resolves when the reconciler stops on its own, i.e. the session
    /// failed. Cancel-safe.
    pub async fn wait_fatal(&mut self) -> Result<()> {
        let Some(handle) = self.reconciler.as_mut() else {
            return Ok(());
        };
        let outcome = handle.await;
        self.reconciler = None;
        outcome?
    }

    /// Stop every task and restore the terminal. Returns the reconciler's
    /// error if it had failed before shutdown was requested.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Display: shutting down");
        self.token.cancel();
        match tokio::time::timeout(self.grace, self.session.cancel_wait()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Display: cancel_wait failed: {}", e),
            Err(_) => debug!("Display: cancel_wait timed out"),
        }

        let mut outcome = Ok(());
        if let Some(handle) = self.reconciler.take() {
            if let Some(result) = join_bounded("reconciler", handle, self.grace).await {
                outcome = result;
            }
        }
        join_bounded("ticker", self.ticker, self.grace).await;
        join_bounded("renderer", self.renderer, self.grace).await;

        self.state.clear().await;
        if let Err(e) = self.terminal.set_cursor_visible(true) {
            warn!("Display: could not restore cursor: {}", e);
        }
        info!("Display: stopped");
        outcome
    }
}

/// Run on the real terminal until Ctrl-C or a session failure.
pub async fn run(session: Arc<dyn PlaybackSession>, config: Config) -> anyhow::Result<()> {
    let terminal: Arc<dyn Terminal> = Arc::new(StdoutTerminal);
    let mut handle = start(session, terminal, &config).await?;
    let fatal = run_until(&mut handle, tokio::signal::ctrl_c()).await;
    let stopped = handle.shutdown().await;
    fatal?;
    stopped?;
    Ok(())
}

/// Drive `handle` until `interrupt` resolves or the reconciler fails.
pub async fn run_until<F>(handle: &mut DisplayHandle, interrupt: F) -> Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        res = interrupt => {
            match res {
                Ok(()) => info!("Display: interrupted"),
                Err(e) => warn!("Display: interrupt listener failed: {}", e),
            }
            Ok(())
        }
        res = handle.wait_fatal() => res,
    }
}
