//! One feed: ordered items, cursor, selection and the merge logic

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::api::{FetchError, Page};
use crate::db::CacheEntry;
use crate::models::{Cursor, Direction, FeedOrder, Item, PageRequest, TimelineIdentity};

/// Identifies one issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

/// Hands out increasing tickets
#[derive(Debug, Default)]
pub struct Tickets {
    last: u64,
}

impl Tickets {
    /// Next unused ticket
    pub const fn issue(&mut self) -> Ticket {
        self.last += 1;
        Ticket(self.last)
    }
}

/// A page request ready to be run by the background worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchJob {
    /// Matches the job with its completion
    pub ticket: Ticket,
    /// Timeline the page belongs to
    pub identity: TimelineIdentity,
    /// What to fetch
    pub request: PageRequest,
}

/// Result of a [`FetchJob`], computed off the foreground
#[derive(Debug, Clone)]
pub struct FetchDone {
    /// Ticket of the job
    pub ticket: Ticket,
    /// Timeline the page belongs to
    pub identity: TimelineIdentity,
    /// The request that was run
    pub request: PageRequest,
    /// Fetched page or failure
    pub result: Result<Page, FetchError>,
}

/// Outcome of applying a fetch result to a timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The page was merged
    Merged {
        /// Ids that were not present before
        added: usize,
    },
    /// The result was not for the fetch this timeline is waiting on
    Stale,
    /// The fetch failed; items and cursor are unchanged
    Failed {
        /// Why
        error: FetchError,
        /// The request to repeat on retry
        request: PageRequest,
        /// Consecutive failures including this one
        attempt: u32,
    },
}

/// Automatic retry of transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries before a failure becomes user visible
    pub max_retries: u32,
    /// Backoff for the first retry, doubled for each further one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt`, or `None` when the failure must be surfaced
    pub fn delay(&self, error: &FetchError, attempt: u32) -> Option<Duration> {
        if !error.is_transient() || attempt > self.max_retries {
            return None;
        }
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
        match error {
            FetchError::RateLimited {
                retry_after: Some(hint),
            } => Some(*hint),
            _ => Some(backoff),
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    request: PageRequest,
}

/// One independently paginated feed
#[derive(Debug)]
pub struct Timeline {
    identity: TimelineIdentity,
    items: Vec<Item>,
    cursor: Cursor,
    selected: usize,
    offset: usize,
    in_flight: Option<InFlight>,
    loaded: bool,
    failures: u32,
    last_error: Option<FetchError>,
    dirty: bool,
}

impl Timeline {
    /// Empty timeline that has never been fetched
    pub const fn new(identity: TimelineIdentity) -> Self {
        Self {
            identity,
            items: Vec::new(),
            cursor: Cursor {
                next: None,
                prev: None,
            },
            selected: 0,
            offset: 0,
            in_flight: None,
            loaded: false,
            failures: 0,
            last_error: None,
            dirty: false,
        }
    }

    /// Timeline seeded from a cache entry, or empty when there is none
    pub fn from_cache(identity: TimelineIdentity, entry: Option<CacheEntry>) -> Self {
        let mut timeline = Self::new(identity);
        if let Some(entry) = entry {
            timeline.items = dedup(entry.items);
            timeline.cursor = entry.cursor;
            timeline.selected = entry.selected_index;
            timeline.loaded = !timeline.items.is_empty();
            timeline.clamp_selection();
        }
        timeline
    }

    /// Snapshot for the cache
    pub fn to_cache_entry(&self) -> CacheEntry {
        CacheEntry {
            items: self.items.clone(),
            cursor: self.cursor.clone(),
            selected_index: self.selected,
        }
    }

    /// Timeline identity
    pub const fn identity(&self) -> &TimelineIdentity {
        &self.identity
    }

    /// Items in timeline order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Pagination tokens
    pub const fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Selected row; always `0` when empty
    pub const fn selected(&self) -> usize {
        self.selected
    }

    /// The selected item
    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.selected)
    }

    /// Whether a fetch is in flight
    pub const fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Ticket of the fetch in flight
    pub fn in_flight_ticket(&self) -> Option<Ticket> {
        self.in_flight.as_ref().map(|f| f.ticket)
    }

    /// Last failure, cleared by the next successful merge
    pub const fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Consecutive failed fetches
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether there are changes not yet written to the cache
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record that the current state has been persisted
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Forget previous failures (explicit user refresh)
    pub const fn reset_failures(&mut self) {
        self.failures = 0;
    }

    /// Fetch the most recent page if nothing was ever loaded
    pub fn ensure_loaded(&mut self, tickets: &mut Tickets) -> Option<FetchJob> {
        if self.loaded || !self.items.is_empty() {
            return None;
        }
        self.start(PageRequest::latest(), tickets)
    }

    /// Fetch the next page in `direction`.
    ///
    /// No-op while a fetch is in flight or when the cursor in that direction is `None`.
    pub fn fetch_more(&mut self, direction: Direction, tickets: &mut Tickets) -> Option<FetchJob> {
        let token = self.cursor.token(direction)?.to_string();
        self.start(PageRequest::follow(direction, token), tickets)
    }

    /// Fetch newer items, or reload the latest page when there is no forward cursor
    pub fn refresh(&mut self, tickets: &mut Tickets) -> Option<FetchJob> {
        if self.cursor.next.is_some() {
            self.fetch_more(Direction::Forward, tickets)
        } else {
            self.start(PageRequest::latest(), tickets)
        }
    }

    /// Repeat a failed request.
    ///
    /// A cursor request is dropped once the cursor in its direction has moved
    /// on, since that page has been fetched since.
    pub fn retry(&mut self, request: PageRequest, tickets: &mut Tickets) -> Option<FetchJob> {
        if let Some(token) = &request.token
            && self.cursor.token(request.direction) != Some(token.as_str())
        {
            return None;
        }
        self.start(request, tickets)
    }

    /// Mark a fetch issued elsewhere as this timeline's in-flight fetch
    pub fn adopt_in_flight(&mut self, ticket: Ticket, request: PageRequest) {
        self.in_flight = Some(InFlight { ticket, request });
    }

    fn start(&mut self, request: PageRequest, tickets: &mut Tickets) -> Option<FetchJob> {
        if self.in_flight.is_some() {
            return None;
        }
        let ticket = tickets.issue();
        self.in_flight = Some(InFlight {
            ticket,
            request: request.clone(),
        });
        Some(FetchJob {
            ticket,
            identity: self.identity.clone(),
            request,
        })
    }

    /// Apply the result of the in-flight fetch
    pub fn complete(&mut self, ticket: Ticket, result: Result<Page, FetchError>) -> Completion {
        let Some(in_flight) = self.in_flight.take_if(|f| f.ticket == ticket) else {
            return Completion::Stale;
        };

        match result {
            Ok(page) => {
                let added = self.merge_page(&in_flight.request, page);
                self.failures = 0;
                self.last_error = None;
                Completion::Merged { added }
            }
            Err(error) => {
                self.failures += 1;
                self.last_error = Some(error.clone());
                Completion::Failed {
                    error,
                    request: in_flight.request,
                    attempt: self.failures,
                }
            }
        }
    }

    /// Merge a fetched page and advance the cursor. Returns the number of new ids.
    pub fn merge_page(&mut self, request: &PageRequest, page: Page) -> usize {
        let was_empty = self.items.is_empty();
        let selected_id = self.selected_item().map(|i| i.id.clone());

        let added = if self.identity.order() == FeedOrder::Conversation && request.is_latest() {
            // The server returns the whole conversation
            replace_items(&mut self.items, page.items)
        } else {
            let at_head = request.direction == Direction::Forward;
            merge_items(&mut self.items, page.items, at_head)
        };

        if request.is_latest() {
            if was_empty || !self.identity.is_paginated() {
                self.cursor = page.cursor;
            } else {
                self.cursor.next = page.cursor.next;
            }
        } else {
            let direction = request.direction;
            self.cursor
                .set(direction, page.cursor.token(direction).map(str::to_string));
        }

        self.loaded = true;
        self.dirty = true;

        let followed = selected_id.and_then(|id| self.items.iter().position(|i| i.id == id));
        self.selected = match (followed, &self.identity) {
            (Some(index), _) => index,
            (None, TimelineIdentity::Thread(focal)) if was_empty => self
                .items
                .iter()
                .position(|i| &i.id == focal)
                .unwrap_or(0),
            (None, _) => self.selected,
        };
        self.clamp_selection();

        added
    }

    /// Move the selection by `delta` rows, clamped into range.
    ///
    /// Returns the direction to read ahead in when the selection came within
    /// `prefetch_distance` rows of an end whose cursor is not exhausted.
    pub fn move_selection(&mut self, delta: isize, prefetch_distance: usize) -> Option<Direction> {
        if self.items.is_empty() {
            self.selected = 0;
            return None;
        }
        let target = self.selected.saturating_add_signed(delta);
        self.select(target, prefetch_distance)
    }

    /// Select an absolute row, clamped into range
    pub fn select(&mut self, index: usize, prefetch_distance: usize) -> Option<Direction> {
        self.selected = index;
        self.clamp_selection();
        if self.items.is_empty() {
            return None;
        }

        let last = self.items.len() - 1;
        // Tail first: reading down is the common case
        if last - self.selected <= prefetch_distance && self.cursor.prev.is_some() {
            Some(Direction::Backward)
        } else if self.selected <= prefetch_distance && self.cursor.next.is_some() {
            Some(Direction::Forward)
        } else {
            None
        }
    }

    /// Set the read flag on an item. Returns whether anything changed.
    pub fn mark_read(&mut self, item_id: &str) -> bool {
        match self.items.iter_mut().find(|i| i.id == item_id) {
            Some(item) if !item.read => {
                item.read = true;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    /// Number of unread items
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|i| !i.read).count()
    }

    /// Scroll the window so the selection is visible in `height` rows
    pub fn scroll_into_view(&mut self, height: usize) {
        self.offset = self.window_start(height);
    }

    /// First visible row for a window of `height` rows
    pub fn window_start(&self, height: usize) -> usize {
        let height = height.max(1);
        let mut start = self.offset.min(self.items.len().saturating_sub(1));
        if self.selected < start {
            start = self.selected;
        } else if self.selected >= start + height {
            start = self.selected + 1 - height;
        }
        start
    }

    const fn clamp_selection(&mut self) {
        if self.items.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.items.len() {
            self.selected = self.items.len() - 1;
        }
    }
}

/// Keep the first occurrence of each id
fn dedup(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect()
}

/// Merge a fetched page into `existing`.
///
/// Overlapping ids take the page's content and position but keep the existing
/// read flag. The page goes before the remaining items when `at_head`, after
/// them otherwise. Returns how many ids were new.
pub fn merge_items(existing: &mut Vec<Item>, page: Vec<Item>, at_head: bool) -> usize {
    let read: HashMap<String, bool> = existing.iter().map(|i| (i.id.clone(), i.read)).collect();

    let mut page = dedup(page);
    let mut added = 0;
    for item in &mut page {
        match read.get(&item.id) {
            Some(was_read) => item.read = *was_read,
            None => added += 1,
        }
    }

    let page_ids: HashSet<&str> = page.iter().map(|i| i.id.as_str()).collect();
    let rest: Vec<Item> = existing
        .drain(..)
        .filter(|i| !page_ids.contains(i.id.as_str()))
        .collect();

    if at_head {
        page.extend(rest);
        *existing = page;
    } else {
        existing.extend(rest);
        existing.extend(page);
    }

    added
}

/// Replace `existing` with `fresh`, keeping read flags of known ids
fn replace_items(existing: &mut Vec<Item>, fresh: Vec<Item>) -> usize {
    let read: HashMap<String, bool> = existing.iter().map(|i| (i.id.clone(), i.read)).collect();
    let mut fresh = dedup(fresh);
    let mut added = 0;
    for item in &mut fresh {
        match read.get(&item.id) {
            Some(was_read) => item.read = *was_read,
            None => added += 1,
        }
    }
    *existing = fresh;
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(id, "author@test")).collect()
    }

    fn ids(timeline: &Timeline) -> Vec<&str> {
        timeline.items().iter().map(|i| i.id.as_str()).collect()
    }

    fn cached(identity: TimelineIdentity, ids: &[&str], next: Option<&str>, prev: Option<&str>) -> Timeline {
        Timeline::from_cache(
            identity,
            Some(CacheEntry {
                items: items(ids),
                cursor: Cursor::new(next.map(str::to_string), prev.map(str::to_string)),
                selected_index: 0,
            }),
        )
    }

    #[test]
    fn test_merge_dedups_and_keeps_read_flags() {
        let mut existing = items(&["A", "B", "C"]);
        existing[1].read = true;

        let mut fresh = items(&["B", "C", "D", "D"]);
        fresh[0].body = "edited".to_string();

        let added = merge_items(&mut existing, fresh, false);

        let merged: Vec<_> = existing.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(merged, vec!["A", "B", "C", "D"]);
        assert_eq!(added, 1);
        assert!(existing[1].read);
        assert_eq!(existing[1].body, "edited");
    }

    #[test]
    fn test_merge_at_head_takes_fresh_positions() {
        let mut existing = items(&["C", "D", "E"]);
        existing[0].read = true;
        let added = merge_items(&mut existing, items(&["A", "B", "C"]), true);

        let merged: Vec<_> = existing.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(merged, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(added, 2);
        assert!(existing[2].read);
    }

    #[test]
    fn test_backward_page_appends_and_ends_pagination() {
        let mut timeline = cached(TimelineIdentity::Home, &["A", "B", "C"], None, Some("p1"));
        let mut tickets = Tickets::default();

        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        assert_eq!(job.request, PageRequest::follow(Direction::Backward, "p1"));

        let done = timeline.complete(job.ticket, Ok(Page::new(items(&["D", "E"]), None, None)));
        assert_eq!(done, Completion::Merged { added: 2 });
        assert_eq!(ids(&timeline), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(timeline.cursor().prev, None);
        assert!(!timeline.is_loading());
        assert!(timeline.is_dirty());
    }

    #[test]
    fn test_forward_page_adds_items_and_takes_cursor() {
        let mut timeline = cached(TimelineIdentity::Home, &["C", "D"], Some("n1"), Some("p1"));
        let mut tickets = Tickets::default();

        let job = timeline.fetch_more(Direction::Forward, &mut tickets).unwrap();
        timeline.complete(
            job.ticket,
            Ok(Page::new(items(&["A", "B"]), Some("n2".to_string()), Some("ignored".to_string()))),
        );

        assert_eq!(timeline.items().len(), 4);
        assert_eq!(ids(&timeline), vec!["A", "B", "C", "D"]);
        assert_eq!(timeline.cursor().next.as_deref(), Some("n2"));
        assert_eq!(timeline.cursor().prev.as_deref(), Some("p1"));
    }

    #[test]
    fn test_only_one_fetch_in_flight() {
        let mut timeline = cached(TimelineIdentity::Home, &["A"], Some("n1"), Some("p1"));
        let mut tickets = Tickets::default();

        assert!(timeline.fetch_more(Direction::Backward, &mut tickets).is_some());
        assert!(timeline.fetch_more(Direction::Backward, &mut tickets).is_none());
        assert!(timeline.fetch_more(Direction::Forward, &mut tickets).is_none());
        assert!(timeline.refresh(&mut tickets).is_none());
    }

    #[test]
    fn test_exhausted_cursor_is_a_no_op() {
        let mut timeline = cached(TimelineIdentity::Home, &["A"], None, None);
        let mut tickets = Tickets::default();
        assert!(timeline.fetch_more(Direction::Backward, &mut tickets).is_none());
        assert!(!timeline.is_loading());
    }

    #[test]
    fn test_empty_page_still_advances_cursor() {
        let mut timeline = cached(TimelineIdentity::Home, &["A"], None, Some("p1"));
        let mut tickets = Tickets::default();
        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        let done = timeline.complete(job.ticket, Ok(Page::new(Vec::new(), None, None)));
        assert_eq!(done, Completion::Merged { added: 0 });
        assert_eq!(timeline.cursor().prev, None);
        assert_eq!(ids(&timeline), vec!["A"]);
    }

    #[test]
    fn test_failure_keeps_state_and_counts_attempts() {
        let mut timeline = cached(TimelineIdentity::Home, &["A", "B"], None, Some("p1"));
        let mut tickets = Tickets::default();

        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        let done = timeline.complete(job.ticket, Err(FetchError::Network("reset".to_string())));
        assert_eq!(
            done,
            Completion::Failed {
                error: FetchError::Network("reset".to_string()),
                request: PageRequest::follow(Direction::Backward, "p1"),
                attempt: 1,
            }
        );
        assert_eq!(ids(&timeline), vec!["A", "B"]);
        assert_eq!(timeline.cursor().prev.as_deref(), Some("p1"));
        assert!(!timeline.is_loading());
        assert!(timeline.last_error().is_some());

        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        let done = timeline.complete(job.ticket, Err(FetchError::Network("reset".to_string())));
        assert!(matches!(done, Completion::Failed { attempt: 2, .. }));
    }

    #[test]
    fn test_retry_skips_a_cursor_that_moved_on() {
        let mut timeline = cached(TimelineIdentity::Home, &["A", "B", "C"], None, Some("p1"));
        let mut tickets = Tickets::default();

        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        let Completion::Failed { request, .. } =
            timeline.complete(job.ticket, Err(FetchError::Network("reset".to_string())))
        else {
            panic!("expected a failure");
        };

        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();
        timeline.complete(
            job.ticket,
            Ok(Page::new(items(&["D", "E"]), None, Some("p2".to_string()))),
        );

        assert!(timeline.retry(request, &mut tickets).is_none());
        assert!(!timeline.is_loading());
        assert_eq!(ids(&timeline), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(timeline.cursor().prev.as_deref(), Some("p2"));

        // Still current: repeated as is
        let current = PageRequest::follow(Direction::Backward, "p2");
        assert_eq!(timeline.retry(current.clone(), &mut tickets).unwrap().request, current);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut timeline = cached(TimelineIdentity::Home, &["A"], None, Some("p1"));
        let mut tickets = Tickets::default();
        let job = timeline.fetch_more(Direction::Backward, &mut tickets).unwrap();

        let done = timeline.complete(Ticket(job.ticket.0 + 100), Ok(Page::default()));
        assert_eq!(done, Completion::Stale);
        assert!(timeline.is_loading());
    }

    #[test]
    fn test_selection_stays_in_range() {
        let mut timeline = Timeline::new(TimelineIdentity::Home);
        for delta in [1, -3, 10, isize::MIN, isize::MAX] {
            timeline.move_selection(delta, 0);
            assert_eq!(timeline.selected(), 0);
        }

        let mut timeline = cached(TimelineIdentity::Home, &["A", "B", "C", "D"], None, None);
        for delta in [1, 1, 1, 1, 1, -2, isize::MAX, isize::MIN, 3, -1] {
            timeline.move_selection(delta, 0);
            assert!(timeline.selected() < timeline.items().len());
        }
        assert_eq!(timeline.selected(), 2);
    }

    #[test]
    fn test_cached_selection_is_clamped() {
        let timeline = Timeline::from_cache(
            TimelineIdentity::Home,
            Some(CacheEntry {
                items: items(&["A", "B"]),
                cursor: Cursor::default(),
                selected_index: 9,
            }),
        );
        assert_eq!(timeline.selected(), 1);
    }

    #[test]
    fn test_read_ahead_near_either_end() {
        let ids: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut timeline = cached(TimelineIdentity::Home, &refs, Some("n"), Some("p"));

        assert_eq!(timeline.select(10, 3), None);
        assert_eq!(timeline.move_selection(6, 3), Some(Direction::Backward));
        assert_eq!(timeline.move_selection(-14, 3), Some(Direction::Forward));

        let mut exhausted = cached(TimelineIdentity::Home, &refs, None, None);
        assert_eq!(exhausted.select(19, 3), None);
    }

    #[test]
    fn test_selection_follows_item_when_newer_items_arrive() {
        let mut timeline = cached(TimelineIdentity::Home, &["C", "D"], Some("n1"), None);
        timeline.select(1, 0);
        let mut tickets = Tickets::default();
        let job = timeline.refresh(&mut tickets).unwrap();
        timeline.complete(job.ticket, Ok(Page::new(items(&["A", "B"]), None, None)));
        assert_eq!(timeline.selected_item().unwrap().id, "D");
    }

    #[test]
    fn test_mark_read_is_idempotent() {
        let mut timeline = cached(TimelineIdentity::Home, &["A"], None, None);
        assert!(timeline.mark_read("A"));
        timeline.mark_clean();
        assert!(!timeline.mark_read("A"));
        assert!(!timeline.is_dirty());
        assert!(!timeline.mark_read("missing"));
        assert_eq!(timeline.unread_count(), 0);
    }

    #[test]
    fn test_ensure_loaded_only_when_never_loaded() {
        let mut tickets = Tickets::default();
        let mut empty = Timeline::from_cache(TimelineIdentity::Notifications, None);
        let job = empty.ensure_loaded(&mut tickets).unwrap();
        assert!(job.request.is_latest());
        assert!(empty.ensure_loaded(&mut tickets).is_none());

        let mut seeded = cached(TimelineIdentity::Home, &["A"], None, None);
        assert!(seeded.ensure_loaded(&mut tickets).is_none());
    }

    #[test]
    fn test_thread_reload_replaces_and_selects_focal() {
        let thread = TimelineIdentity::Thread("5".to_string());
        let mut timeline = Timeline::from_cache(thread, None);
        let mut tickets = Tickets::default();

        let job = timeline.ensure_loaded(&mut tickets).unwrap();
        timeline.complete(job.ticket, Ok(Page::new(items(&["3", "5", "8"]), None, None)));
        assert_eq!(timeline.selected_item().unwrap().id, "5");
        timeline.mark_read("3");

        let job = timeline.refresh(&mut tickets).unwrap();
        timeline.complete(job.ticket, Ok(Page::new(items(&["3", "5", "9"]), None, None)));
        assert_eq!(ids(&timeline), vec!["3", "5", "9"]);
        assert!(timeline.items()[0].read);
        assert_eq!(timeline.selected_item().unwrap().id, "5");
    }

    #[test]
    fn test_window_follows_selection() {
        let ids: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut timeline = cached(TimelineIdentity::Home, &refs, None, None);

        timeline.select(6, 0);
        timeline.scroll_into_view(4);
        assert_eq!(timeline.window_start(4), 3);

        timeline.select(4, 0);
        timeline.scroll_into_view(4);
        assert_eq!(timeline.window_start(4), 3);

        timeline.select(1, 0);
        assert_eq!(timeline.window_start(4), 1);
    }

    #[test]
    fn test_retry_policy() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        };
        let network = FetchError::Network("x".to_string());
        assert_eq!(policy.delay(&network, 1), Some(Duration::from_millis(100)));
        assert_eq!(policy.delay(&network, 2), Some(Duration::from_millis(200)));
        assert_eq!(policy.delay(&network, 3), None);

        let limited = FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(policy.delay(&limited, 1), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay(&FetchError::Auth("expired".to_string()), 1), None);
    }
}
