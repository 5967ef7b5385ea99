//! Data models for fediboat

mod cursor;
mod identity;
mod item;

pub use cursor::{Cursor, Direction, PageRequest};
pub use identity::{FeedOrder, ParseIdentityError, TimelineIdentity};
pub use item::{Item, NotificationKind, Relation};
