//! Feed entry model (status or notification)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TimelineIdentity;

/// How an item relates to another status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Relation {
    /// A reply to the given status
    ReplyTo(String),
    /// A boost of the given status
    Boost(String),
}

/// Notification type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Someone mentioned you
    Mention,
    /// Someone you enabled notifications for posted
    Status,
    /// Someone boosted one of your statuses
    Reblog,
    /// Someone followed you
    Follow,
    /// Someone requested to follow you
    FollowRequest,
    /// Someone favourited one of your statuses
    Favourite,
    /// A poll you voted in or created has ended
    Poll,
    /// A status you interacted with was edited
    Update,
    /// A moderator took action against your account
    ModerationWarning,
    /// Someone signed up (admins only)
    #[serde(rename = "admin.sign_up")]
    AdminSignUp,
    /// A new report was filed (admins only)
    #[serde(rename = "admin.report")]
    AdminReport,
    /// A type this client does not know about
    #[serde(other)]
    Unknown,
}

impl NotificationKind {
    /// API name (`favourite`, `admin.sign_up`, ...)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::Status => "status",
            Self::Reblog => "reblog",
            Self::Follow => "follow",
            Self::FollowRequest => "follow_request",
            Self::Favourite => "favourite",
            Self::Poll => "poll",
            Self::Update => "update",
            Self::ModerationWarning => "moderation_warning",
            Self::AdminSignUp => "admin.sign_up",
            Self::AdminReport => "admin.report",
            Self::Unknown => "unknown",
        }
    }
}

/// One feed entry.
///
/// Immutable once fetched except for [`Item::read`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable id, unique within a timeline
    pub id: String,
    /// Author handle (`user@instance`)
    pub author: String,
    /// Plain text body
    #[serde(default)]
    pub body: String,
    /// When the entry was created
    pub created_at: DateTime<Utc>,
    /// Reply/boost relationship
    #[serde(default)]
    pub relation: Option<Relation>,
    /// Set for notification entries
    #[serde(default)]
    pub notification: Option<NotificationKind>,
    /// The status this entry displays, if any
    #[serde(default)]
    pub status_id: Option<String>,
    /// Web URL of the status
    #[serde(default)]
    pub url: Option<String>,
    /// Whether the user has opened this entry
    #[serde(default)]
    pub read: bool,
}

impl Item {
    /// Create a status item with an empty body
    pub fn new(id: &str, author: &str) -> Self {
        Self {
            id: id.to_string(),
            author: author.to_string(),
            body: String::new(),
            created_at: Utc::now(),
            relation: None,
            notification: None,
            status_id: Some(id.to_string()),
            url: None,
            read: false,
        }
    }

    /// The thread this item opens into, if it displays a status
    pub fn thread_identity(&self) -> Option<TimelineIdentity> {
        self.status_id.clone().map(TimelineIdentity::Thread)
    }

    /// Whether this item replies to another status
    pub const fn is_reply(&self) -> bool {
        matches!(self.relation, Some(Relation::ReplyTo(_)))
    }

    /// Get a one-line preview of the body (for the table title column)
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self
            .body
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
            format!("{cut}…")
        }
    }

    /// Date column text, in local time (e.g. "Jun 01 14:30")
    pub fn short_date(&self) -> String {
        self.created_at
            .with_timezone(&chrono::Local)
            .format("%b %d %H:%M")
            .to_string()
    }
}
