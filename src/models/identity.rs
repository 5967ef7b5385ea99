//! Timeline identity (feed kind plus optional scoping parameter)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the items of a timeline are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrder {
    /// Newest item first (home, notifications, public feeds, lists)
    NewestFirst,
    /// Conversation order: ancestors, focal status, descendants
    Conversation,
}

/// Names one independently paginated feed.
///
/// Two timelines with the same identity are the same timeline: the value is
/// the registry key and, through [`TimelineIdentity::key`], the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimelineIdentity {
    /// The signed-in account's home feed
    Home,
    /// Notifications addressed to the signed-in account
    Notifications,
    /// Public posts from the local instance
    Local,
    /// Federated public posts
    Public,
    /// Bookmarked statuses
    Bookmarks,
    /// Statuses posted by one account
    Account(String),
    /// A user-defined list
    List(String),
    /// The conversation around one status
    Thread(String),
}

impl TimelineIdentity {
    /// Stable string key (`home`, `thread:<id>`, ...)
    pub fn key(&self) -> String {
        match self {
            Self::Home => "home".to_string(),
            Self::Notifications => "notifications".to_string(),
            Self::Local => "local".to_string(),
            Self::Public => "public".to_string(),
            Self::Bookmarks => "bookmarks".to_string(),
            Self::Account(id) => format!("account:{id}"),
            Self::List(id) => format!("list:{id}"),
            Self::Thread(id) => format!("thread:{id}"),
        }
    }

    /// Item order within this kind of feed
    pub const fn order(&self) -> FeedOrder {
        match self {
            Self::Thread(_) => FeedOrder::Conversation,
            _ => FeedOrder::NewestFirst,
        }
    }

    /// Whether the remote API pages this feed with cursors
    pub const fn is_paginated(&self) -> bool {
        !matches!(self, Self::Thread(_))
    }

    /// Title shown in the header
    pub fn title(&self) -> String {
        match self {
            Self::Home => "Home".to_string(),
            Self::Notifications => "Notifications".to_string(),
            Self::Local => "Local".to_string(),
            Self::Public => "Public".to_string(),
            Self::Bookmarks => "Bookmarks".to_string(),
            Self::Account(id) => format!("Account {id}"),
            Self::List(id) => format!("List {id}"),
            Self::Thread(_) => "Thread".to_string(),
        }
    }
}

/// Error returned when parsing an unknown timeline key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown timeline '{0}' (expected home, notifications, local, public, bookmarks, account:<id>, list:<id> or thread:<id>)")]
pub struct ParseIdentityError(String);

impl FromStr for TimelineIdentity {
    type Err = ParseIdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let parsed = match lowered.as_str() {
            "home" => Some(Self::Home),
            "notifications" | "notifs" => Some(Self::Notifications),
            "local" => Some(Self::Local),
            "public" | "global" | "federated" => Some(Self::Public),
            "bookmarks" => Some(Self::Bookmarks),
            // Ids are case sensitive on some servers, only the kind is lowered
            _ => s.trim().split_once(':').and_then(|(kind, param)| {
                if param.is_empty() {
                    return None;
                }
                let param = param.to_string();
                match kind.to_lowercase().as_str() {
                    "account" => Some(Self::Account(param)),
                    "list" => Some(Self::List(param)),
                    "thread" => Some(Self::Thread(param)),
                    _ => None,
                }
            }),
        };
        parsed.ok_or_else(|| ParseIdentityError(s.to_string()))
    }
}

impl TryFrom<String> for TimelineIdentity {
    type Error = ParseIdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimelineIdentity> for String {
    fn from(identity: TimelineIdentity) -> Self {
        identity.key()
    }
}

impl fmt::Display for TimelineIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip_keeps_param_case() {
        let identity = TimelineIdentity::Thread("AbC123".to_string());
        assert_eq!(identity.key(), "thread:AbC123");
        assert_eq!("thread:AbC123".parse::<TimelineIdentity>().unwrap(), identity);
    }

    #[test]
    fn test_aliases() {
        assert_eq!("Global".parse::<TimelineIdentity>().unwrap(), TimelineIdentity::Public);
        assert_eq!(
            "notifs".parse::<TimelineIdentity>().unwrap(),
            TimelineIdentity::Notifications
        );
    }

    #[test]
    fn test_rejects_unknown_and_empty_param() {
        assert!("mentions".parse::<TimelineIdentity>().is_err());
        assert!("list:".parse::<TimelineIdentity>().is_err());
    }

    #[test]
    fn test_thread_is_conversation_ordered() {
        let thread = TimelineIdentity::Thread("1".to_string());
        assert_eq!(thread.order(), FeedOrder::Conversation);
        assert!(!thread.is_paginated());
        assert_eq!(TimelineIdentity::Home.order(), FeedOrder::NewestFirst);
    }
}
