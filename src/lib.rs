//! # fediboat
//!
//! A terminal reader for Mastodon that treats timelines like newsboat treats
//! feeds: one table per timeline, read marks, and a cache that makes the last
//! view available instantly on the next start.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                            App                              │
//! │   Event loop, key bindings, rendering, background worker    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ Intent / FetchJob / FetchDone
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Engine                             │
//! │   Navigator · Registry of Timelines · deferred work queue   │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                       │
//!          ▼                                       ▼
//! ┌─────────────────┐                     ┌─────────────────┐
//! │    Database     │                     │       API       │
//! │                 │                     │                 │
//! │ • CacheStore    │                     │ • FetchPage     │
//! │ • SQLite rows   │                     │ • Mastodon      │
//! └─────────────────┘                     └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] — Page fetching against the Mastodon API
//! - [`app`] — TUI state, event loop and rendering
//! - [`auth`] — Reading the credentials written by the login flow
//! - [`config`] — Configuration management
//! - [`db`] — `SQLite` timeline cache
//! - [`engine`] — Timelines, registry, navigation
//! - [`models`] — Items, identities, cursors
//! - [`theme`] — Theme support via ratatui-themes
//!
//! ## Example
//!
//! ```no_run
//! use fediboat::{app, models::TimelineIdentity};
//!
//! fn main() -> anyhow::Result<()> {
//!     app::run(TimelineIdentity::Home)
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/fediboat/0.4.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod models;
pub mod paths;
pub mod theme;

// Re-export main types for convenience
pub use app::AppState;
pub use config::Config;
pub use db::{CacheStore, Database};
pub use engine::{Engine, Intent};
pub use models::{Item, TimelineIdentity};
pub use theme::{Theme, ThemeColors};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
