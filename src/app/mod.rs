//! TUI Application module

mod async_ops;
mod events;
mod state;
mod ui;

pub use state::{AppState, Overlay};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

use crate::api::MastodonClient;
use crate::auth;
use crate::config::Config;
use crate::db::{CacheStore, Database};
use crate::engine::{Engine, EngineConfig, Intent};
use crate::models::TimelineIdentity;

use async_ops::{AsyncCommand, AsyncHandle, AsyncResult, spawn_worker};

/// Cached conversations older than this are dropped at startup
const THREAD_CACHE_HOURS: u64 = 24 * 7;

/// Run the TUI application starting at `start`
pub fn run(start: TimelineIdentity) -> Result<()> {
    let config = Config::load()?;
    let credentials = auth::load_credentials()?;

    let db = Database::open().context("Failed to open the timeline cache")?;
    match db.clear_old_threads(THREAD_CACHE_HOURS) {
        Ok(0) => {}
        Ok(n) => tracing::debug!("Dropped {} stale cached threads", n),
        Err(e) => tracing::warn!("Failed to prune cached threads: {}", e),
    }

    let client = MastodonClient::new(&credentials)
        .with_page_limit(config.page_limit)
        .with_notification_types(config.notifications.show.clone())
        .with_timeout(config.request_timeout());

    let rt = Runtime::new()?;
    let async_handle = rt.block_on(async { spawn_worker(client) });

    let engine = Engine::new(db, start, EngineConfig::from(&config));
    let mut state = AppState::new(config, engine, credentials.account_id);

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut state, async_handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    state.engine.shutdown();
    state.config.save()?;

    result
}

fn run_app<S: CacheStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState<S>,
    mut async_handle: AsyncHandle,
) -> Result<()> {
    let now = Instant::now();
    let mut jobs = state.engine.start(now);
    // A cached start timeline is shown right away and refreshed behind it
    if jobs.is_empty() {
        jobs = state.engine.handle(Intent::Refresh, now);
    }
    async_handle.dispatch(jobs);

    loop {
        // Apply finished fetches
        while let Ok(AsyncResult::Fetched(done)) = async_handle.result_rx.try_recv() {
            let jobs = state.engine.complete(done, Instant::now());
            async_handle.dispatch(jobs);
        }

        terminal.draw(|frame| ui::render(frame, state))?;

        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let jobs = events::handle_key(state, key, Instant::now());
            async_handle.dispatch(jobs);
        }

        let jobs = state.engine.tick(Instant::now());
        async_handle.dispatch(jobs);

        state.tick();

        if state.should_quit() {
            let _ = async_handle.cmd_tx.blocking_send(AsyncCommand::Shutdown);
            break;
        }
    }

    Ok(())
}
