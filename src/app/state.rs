//! Application state

use crate::config::Config;
use crate::db::CacheStore;
use crate::engine::Engine;
use crate::models::{Item, TimelineIdentity};
use crate::theme::Theme;

/// Presentation-only overlays. Navigation state lives in the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Overlay {
    /// Nothing on top of the table
    #[default]
    None,
    /// Full text of an item
    Content {
        /// The item shown
        item: Box<Item>,
        /// Lines scrolled past
        scroll: u16,
    },
    /// Typing a row number to jump to
    RowPrompt {
        /// Digits typed so far
        input: String,
    },
    /// Key binding help
    Help,
}

/// Application state
pub struct AppState<S: CacheStore> {
    /// Configuration
    pub config: Config,
    /// Timeline engine
    pub engine: Engine<S>,
    /// Signed-in account id, for the personal timeline
    pub account_id: String,
    /// Current theme
    pub theme: Theme,
    /// Overlay drawn over the timeline
    pub overlay: Overlay,
    /// Status message (bottom bar)
    pub status: String,
    /// Set by ctrl+c
    pub quit: bool,

    /// Tick counter for the loading spinner
    tick: u64,
}

impl<S: CacheStore> AppState<S> {
    /// Create a new app state
    pub fn new(config: Config, engine: Engine<S>, account_id: String) -> Self {
        let theme = config.theme;
        Self {
            config,
            engine,
            account_id,
            theme,
            overlay: Overlay::None,
            status: String::new(),
            quit: false,
            tick: 0,
        }
    }

    /// Whether the loop should stop
    pub const fn should_quit(&self) -> bool {
        self.quit || self.engine.should_quit()
    }

    /// Advance the spinner
    pub const fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Current tick
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Set status message
    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
    }

    /// Cycle through themes
    pub fn next_theme(&mut self) {
        self.theme = self.theme.next();
        self.config.theme = self.theme;
        self.set_status(format!("Theme: {}", self.theme));
    }

    /// The signed-in account's own statuses
    pub fn personal_timeline(&self) -> TimelineIdentity {
        TimelineIdentity::Account(self.account_id.clone())
    }

    /// Show the selected item's text
    pub fn open_content(&mut self) {
        if let Some(item) = self.engine.active_timeline().and_then(|t| t.selected_item()) {
            self.overlay = Overlay::Content {
                item: Box::new(item.clone()),
                scroll: 0,
            };
        }
    }
}
