//! Fetch client: paginated timeline requests against the remote API

pub mod mastodon;

use std::future::Future;
use std::time::Duration;

use crate::models::{Cursor, Item, PageRequest, TimelineIdentity};

pub use mastodon::MastodonClient;

/// One page of a timeline as returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Items in the feed's declared order
    pub items: Vec<Item>,
    /// Tokens for the neighbouring pages
    pub cursor: Cursor,
}

impl Page {
    /// Build a page from items and tokens
    pub fn new(items: Vec<Item>, next: Option<String>, prev: Option<String>) -> Self {
        Self {
            items,
            cursor: Cursor::new(next, prev),
        }
    }
}

/// Why a page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Timeout, connection reset, server error or unreadable response. Retryable.
    #[error("network error: {0}")]
    Network(String),
    /// The server asked us to slow down. Retryable after the hint.
    #[error("rate limited by the server")]
    RateLimited {
        /// Suggested wait before retrying
        retry_after: Option<Duration>,
    },
    /// The access token is invalid or expired. Never retried automatically.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl FetchError {
    /// Whether the request may succeed if repeated
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

/// Issues one page request for a timeline.
///
/// Implementations do not retry; retry policy belongs to the timeline engine.
/// This is the only seam that branches on the timeline kind.
pub trait FetchPage: Send + Sync + 'static {
    /// Fetch one page of `identity`
    fn fetch_page(
        &self,
        identity: &TimelineIdentity,
        request: &PageRequest,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;
}
