//! Pagination cursors

use serde::{Deserialize, Serialize};

/// Direction of a page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Newer items, merged at the head of the timeline
    Forward,
    /// Older items, merged at the tail of the timeline
    Backward,
}

/// Opaque pagination tokens. `None` means there is no page in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Token for newer items
    #[serde(default)]
    pub next: Option<String>,
    /// Token for older items
    #[serde(default)]
    pub prev: Option<String>,
}

impl Cursor {
    /// Cursor with both tokens set
    pub fn new(next: Option<String>, prev: Option<String>) -> Self {
        Self { next, prev }
    }

    /// Token for the given direction
    pub fn token(&self, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Forward => self.next.as_deref(),
            Direction::Backward => self.prev.as_deref(),
        }
    }

    /// Replace the token for one direction
    pub fn set(&mut self, direction: Direction, token: Option<String>) {
        match direction {
            Direction::Forward => self.next = token,
            Direction::Backward => self.prev = token,
        }
    }
}

/// A request for one page of a timeline
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    /// Which way to page
    pub direction: Direction,
    /// Cursor token; `None` with [`Direction::Forward`] asks for the most recent page
    pub token: Option<String>,
}

impl PageRequest {
    /// The most recent page
    pub const fn latest() -> Self {
        Self {
            direction: Direction::Forward,
            token: None,
        }
    }

    /// A page following a cursor token
    pub fn follow(direction: Direction, token: impl Into<String>) -> Self {
        Self {
            direction,
            token: Some(token.into()),
        }
    }

    /// Whether this asks for the most recent page rather than following a cursor
    pub const fn is_latest(&self) -> bool {
        self.token.is_none()
    }
}
