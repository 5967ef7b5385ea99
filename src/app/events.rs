//! Event handling: keys to engine intents

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::{AppState, Overlay};
use crate::db::CacheStore;
use crate::engine::{FetchJob, Intent, NavState};
use crate::models::TimelineIdentity;

/// Handle a key event, returning the fetches it started
pub fn handle_key<S: CacheStore>(
    state: &mut AppState<S>,
    key: KeyEvent,
    now: Instant,
) -> Vec<FetchJob> {
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        state.quit = true;
        return Vec::new();
    }

    // Overlays first, they swallow every key
    match &mut state.overlay {
        Overlay::None => {}
        Overlay::Help => {
            state.overlay = Overlay::None;
            return Vec::new();
        }
        Overlay::Content { scroll, .. } => {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => *scroll = scroll.saturating_add(1),
                KeyCode::Char('k') | KeyCode::Up => *scroll = scroll.saturating_sub(1),
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'h' | 'l') => {
                    state.overlay = Overlay::None;
                }
                _ => {}
            }
            return Vec::new();
        }
        Overlay::RowPrompt { input } => {
            return match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    input.push(c);
                    Vec::new()
                }
                KeyCode::Backspace => {
                    input.pop();
                    Vec::new()
                }
                KeyCode::Enter => {
                    let row = input.parse::<usize>().ok();
                    state.overlay = Overlay::None;
                    match row {
                        // Rows are numbered from 1 on screen
                        Some(row) => state
                            .engine
                            .handle(Intent::SelectIndex(row.saturating_sub(1)), now),
                        None => Vec::new(),
                    }
                }
                _ => {
                    state.overlay = Overlay::None;
                    Vec::new()
                }
            };
        }
    }

    match state.engine.state() {
        NavState::JumpPrompt(_) => handle_jump_key(state, key, now),
        NavState::ErrorModal(..) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                state.engine.handle(Intent::DismissError, now)
            } else {
                Vec::new()
            }
        }
        NavState::Viewing(_) => handle_timeline_key(state, key, now),
    }
}

fn handle_jump_key<S: CacheStore>(
    state: &mut AppState<S>,
    key: KeyEvent,
    now: Instant,
) -> Vec<FetchJob> {
    let target = match key.code {
        KeyCode::Char('h') => TimelineIdentity::Home,
        KeyCode::Char('l') => TimelineIdentity::Local,
        KeyCode::Char('n') => TimelineIdentity::Notifications,
        KeyCode::Char('p') => state.personal_timeline(),
        KeyCode::Char('b') => TimelineIdentity::Bookmarks,
        KeyCode::Char('g') => TimelineIdentity::Public,
        _ => return state.engine.handle(Intent::CancelJump, now),
    };
    state.set_status(target.title());
    state.engine.handle(Intent::Jump(target), now)
}

fn handle_timeline_key<S: CacheStore>(
    state: &mut AppState<S>,
    key: KeyEvent,
    now: Instant,
) -> Vec<FetchJob> {
    let intent = match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::PageDown) => Intent::PageDown,
        (KeyModifiers::CONTROL, KeyCode::Char('u')) | (_, KeyCode::PageUp) => Intent::PageUp,
        (_, KeyCode::Char('j') | KeyCode::Down) => Intent::Down,
        (_, KeyCode::Char('k') | KeyCode::Up) => Intent::Up,
        (_, KeyCode::Char('g') | KeyCode::Home) => Intent::Top,
        (_, KeyCode::Char('G') | KeyCode::End) => Intent::Bottom,
        (_, KeyCode::Enter | KeyCode::Char('l')) => {
            state.open_content();
            Intent::ReadSelected
        }
        (_, KeyCode::Char('t')) => Intent::OpenSelected,
        (_, KeyCode::Char('s')) => Intent::BeginJump,
        (_, KeyCode::Char('r')) => {
            state.set_status("Refreshing...");
            Intent::Refresh
        }
        (_, KeyCode::Char('q')) => Intent::CloseActive,
        // Back out of a thread, never out of the app
        (_, KeyCode::Esc | KeyCode::Char('h')) if state.engine.view().depth > 0 => {
            Intent::CloseActive
        }
        (_, KeyCode::Char(c)) if c.is_ascii_digit() => {
            state.overlay = Overlay::RowPrompt {
                input: c.to_string(),
            };
            return Vec::new();
        }
        (_, KeyCode::Char('T')) => {
            state.next_theme();
            return Vec::new();
        }
        (_, KeyCode::Char('?')) => {
            state.overlay = Overlay::Help;
            return Vec::new();
        }
        _ => return Vec::new(),
    };

    state.engine.handle(intent, now)
}
