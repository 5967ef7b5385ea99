//! Timeline engine
//!
//! Owns every live timeline, the navigation state and the queue of postponed
//! work. All state changes happen here, on the foreground: the app loop feeds
//! in user intents, fetch completions and clock ticks, and gets back the
//! [`FetchJob`]s to run in the background.
//!
//! ```text
//!  key ─► Intent ─┐                      ┌─► FetchJob ─► worker
//!                 ├─► Engine::handle ────┤
//!  FetchDone ─────┤   Engine::complete   └─► View (render)
//!  tick ──────────┘   Engine::tick
//! ```

mod deferred;
mod navigation;
mod registry;
mod timeline;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::{FetchError, Page};
use crate::config::Config;
use crate::db::CacheStore;
use crate::models::{FeedOrder, Item, PageRequest, TimelineIdentity};

pub use deferred::{Deferred, Scheduler};
pub use navigation::{CloseOutcome, NavState, Navigator};
pub use registry::Registry;
pub use timeline::{
    Completion, FetchDone, FetchJob, RetryPolicy, Ticket, Tickets, Timeline, merge_items,
};

/// Rows moved by a page scroll before the viewport height is known
const DEFAULT_PAGE_SIZE: usize = 20;

/// Tunables of the engine
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Rows from either end that trigger read-ahead
    pub prefetch_distance: usize,
    /// Live timelines kept in memory
    pub max_live_timelines: usize,
    /// Retry of transient failures
    pub retry: RetryPolicy,
    /// Interval between flushes of unsaved read flags
    pub read_flush: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prefetch_distance: 5,
            max_live_timelines: 16,
            retry: RetryPolicy::default(),
            read_flush: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            prefetch_distance: config.prefetch_distance,
            max_live_timelines: config.max_live_timelines,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: Duration::from_millis(config.retry_base_ms),
            },
            read_flush: Duration::from_secs(config.read_flush_secs.max(1)),
        }
    }
}

/// What the user asked for, independent of key bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Selection one row up
    Up,
    /// Selection one row down
    Down,
    /// Selection one page up
    PageUp,
    /// Selection one page down
    PageDown,
    /// First row
    Top,
    /// Last row
    Bottom,
    /// Absolute row
    SelectIndex(usize),
    /// Mark the selected item read (opening its content)
    ReadSelected,
    /// Open the selected item's conversation on top of the active timeline
    OpenSelected,
    /// Show the jump prompt
    BeginJump,
    /// Leave the jump prompt without switching
    CancelJump,
    /// Switch to a timeline, clearing the back stack
    Jump(TimelineIdentity),
    /// Close the active timeline
    CloseActive,
    /// Fetch newer items of the active timeline
    Refresh,
    /// Close the error modal
    DismissError,
    /// A status was posted from outside the engine
    PostCreated {
        /// Status id it replies to
        in_reply_to: Option<String>,
    },
}

/// Snapshot of what to draw
#[derive(Debug)]
pub struct View<'a> {
    /// Navigation state
    pub state: &'a NavState,
    /// Active timeline
    pub identity: &'a TimelineIdentity,
    /// Items in the visible window
    pub items: &'a [Item],
    /// Index of the first visible item within the timeline
    pub offset: usize,
    /// Selected row within the timeline
    pub selected: usize,
    /// Items loaded in total
    pub total: usize,
    /// Unread items in total
    pub unread: usize,
    /// Fetch in flight
    pub loading: bool,
    /// Last failure of the active timeline
    pub error: Option<&'a FetchError>,
    /// Depth of the back stack
    pub depth: usize,
}

/// The timeline engine. See the module docs.
pub struct Engine<S: CacheStore> {
    registry: Registry<S>,
    navigator: Navigator,
    scheduler: Scheduler,
    tickets: Tickets,
    in_flight: HashMap<TimelineIdentity, (Ticket, PageRequest)>,
    config: EngineConfig,
    page_size: usize,
    last_flush: Instant,
    quit: bool,
}

impl<S: CacheStore> Engine<S> {
    /// Create an engine viewing `start`
    pub fn new(store: S, start: TimelineIdentity, config: EngineConfig) -> Self {
        Self {
            registry: Registry::new(store, config.max_live_timelines),
            navigator: Navigator::new(start),
            scheduler: Scheduler::new(),
            tickets: Tickets::default(),
            in_flight: HashMap::new(),
            config,
            page_size: DEFAULT_PAGE_SIZE,
            last_flush: Instant::now(),
            quit: false,
        }
    }

    /// Open the start timeline; fetches its first page if nothing is cached
    pub fn start(&mut self, now: Instant) -> Vec<FetchJob> {
        self.last_flush = now;
        let mut jobs = Vec::new();
        let start = self.navigator.active().clone();
        self.enter(&start, &mut jobs);
        self.drain(now, &mut jobs);
        jobs
    }

    /// Navigation state
    pub const fn state(&self) -> &NavState {
        self.navigator.state()
    }

    /// Identity of the active timeline
    pub const fn active(&self) -> &TimelineIdentity {
        self.navigator.active()
    }

    /// The active timeline, if live
    pub fn active_timeline(&self) -> Option<&Timeline> {
        self.registry.peek(self.navigator.active())
    }

    /// Read-only access to any live timeline
    pub fn timeline(&self, identity: &TimelineIdentity) -> Option<&Timeline> {
        self.registry.peek(identity)
    }

    /// The live timelines
    pub const fn registry(&self) -> &Registry<S> {
        &self.registry
    }

    /// Whether the user asked to quit
    pub const fn should_quit(&self) -> bool {
        self.quit
    }

    /// Whether any fetch is outstanding
    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Set the number of visible rows (page scroll size and window height)
    pub fn set_page_size(&mut self, rows: usize) {
        self.page_size = rows.max(1);
        let page_size = self.page_size;
        if let Some(timeline) = self.registry.get_live(self.navigator.active()) {
            timeline.scroll_into_view(page_size);
        }
    }

    /// What to draw
    pub fn view(&self) -> View<'_> {
        let identity = self.navigator.active();
        let (items, offset, selected, total, unread, loading, error) =
            match self.registry.peek(identity) {
                Some(timeline) => {
                    let offset = timeline.window_start(self.page_size);
                    let end = (offset + self.page_size).min(timeline.items().len());
                    (
                        &timeline.items()[offset..end],
                        offset,
                        timeline.selected(),
                        timeline.items().len(),
                        timeline.unread_count(),
                        timeline.is_loading(),
                        timeline.last_error(),
                    )
                }
                None => (&[][..], 0, 0, 0, 0, false, None),
            };

        View {
            state: self.navigator.state(),
            identity,
            items,
            offset,
            selected,
            total,
            unread,
            loading,
            error,
            depth: self.navigator.back_stack().len(),
        }
    }

    /// Apply one user intent
    pub fn handle(&mut self, intent: Intent, now: Instant) -> Vec<FetchJob> {
        let mut jobs = Vec::new();
        let page = isize::try_from(self.page_size).unwrap_or(isize::MAX);

        match intent {
            Intent::Up => self.move_selection(-1),
            Intent::Down => self.move_selection(1),
            Intent::PageUp => self.move_selection(-page),
            Intent::PageDown => self.move_selection(page),
            Intent::Top => self.select(0),
            Intent::Bottom => self.select(usize::MAX),
            Intent::SelectIndex(index) => self.select(index),
            Intent::ReadSelected => {
                self.read_selected();
            }
            Intent::OpenSelected => self.open_selected(&mut jobs),
            Intent::BeginJump => {
                self.navigator.begin_jump();
            }
            Intent::CancelJump => {
                self.navigator.cancel_jump();
            }
            Intent::Jump(target) => self.jump(target, &mut jobs),
            Intent::CloseActive => self.close_active(&mut jobs),
            Intent::Refresh => {
                if self.navigator.is_viewing() {
                    let active = self.navigator.active().clone();
                    self.refresh(&active, &mut jobs);
                }
            }
            Intent::DismissError => {
                self.navigator.dismiss();
            }
            Intent::PostCreated { in_reply_to } => self.post_created(in_reply_to, &mut jobs),
        }

        self.drain(now, &mut jobs);
        jobs
    }

    /// Apply a finished fetch
    pub fn complete(&mut self, done: FetchDone, now: Instant) -> Vec<FetchJob> {
        let mut jobs = Vec::new();
        let FetchDone {
            ticket,
            identity,
            request,
            result,
        } = done;

        if self.in_flight.get(&identity).is_some_and(|(t, _)| *t == ticket) {
            self.in_flight.remove(&identity);
        }

        match self.registry.get_live(&identity) {
            Some(timeline) => match timeline.complete(ticket, result) {
                Completion::Merged { added } => {
                    tracing::debug!("Merged {} new items into {}", added, identity);
                    self.scheduler.forget_retries(&identity);
                    self.registry.persist(&identity);
                }
                Completion::Stale => {
                    tracing::debug!("Ignoring stale result {:?} for {}", ticket, identity);
                }
                Completion::Failed {
                    error,
                    request,
                    attempt,
                } => self.failed(&identity, error, request, attempt, now),
            },
            None => self.complete_detached(&identity, &request, result),
        }

        self.drain(now, &mut jobs);
        jobs
    }

    /// Run delayed work that is due and flush read flags periodically
    pub fn tick(&mut self, now: Instant) -> Vec<FetchJob> {
        if now.duration_since(self.last_flush) >= self.config.read_flush {
            self.last_flush = now;
            for identity in self.registry.dirty() {
                self.scheduler.push(Deferred::Save(identity));
            }
        }

        let mut jobs = Vec::new();
        self.drain(now, &mut jobs);
        jobs
    }

    /// Persist every unsaved change
    pub fn shutdown(&mut self) {
        for work in self.scheduler.take_ready(Instant::now()) {
            if let Deferred::Save(identity) = work {
                self.registry.persist(&identity);
            }
        }
        let saved = self.registry.persist_all();
        tracing::debug!("Flushed {} timelines on shutdown", saved);
    }

    fn move_selection(&mut self, delta: isize) {
        if !self.navigator.is_viewing() {
            return;
        }
        let active = self.navigator.active().clone();
        let distance = self.config.prefetch_distance;
        let page_size = self.page_size;
        let timeline = self.registry.get(&active);
        let prefetch = timeline.move_selection(delta, distance);
        timeline.scroll_into_view(page_size);
        if let Some(direction) = prefetch {
            self.scheduler.push(Deferred::Prefetch(active, direction));
        }
    }

    fn select(&mut self, index: usize) {
        if !self.navigator.is_viewing() {
            return;
        }
        let active = self.navigator.active().clone();
        let distance = self.config.prefetch_distance;
        let page_size = self.page_size;
        let timeline = self.registry.get(&active);
        let prefetch = timeline.select(index, distance);
        timeline.scroll_into_view(page_size);
        if let Some(direction) = prefetch {
            self.scheduler.push(Deferred::Prefetch(active, direction));
        }
    }

    fn read_selected(&mut self) -> Option<Item> {
        if !self.navigator.is_viewing() {
            return None;
        }
        let active = self.navigator.active().clone();
        let timeline = self.registry.get(&active);
        let item = timeline.selected_item()?.clone();
        timeline.mark_read(&item.id);
        Some(item)
    }

    fn open_selected(&mut self, jobs: &mut Vec<FetchJob>) {
        let Some(target) = self.read_selected().and_then(|item| item.thread_identity()) else {
            return;
        };
        let previous = self.navigator.active().clone();
        if self.navigator.open(target.clone()) {
            self.leave(&previous);
            self.enter(&target, jobs);
        }
    }

    fn jump(&mut self, target: TimelineIdentity, jobs: &mut Vec<FetchJob>) {
        let Some(released) = self.navigator.jump(target.clone()) else {
            return;
        };
        for identity in &released {
            if identity.order() == FeedOrder::Conversation {
                self.close_timeline(identity);
            } else {
                self.leave(identity);
            }
        }
        self.enter(&target, jobs);
    }

    fn close_active(&mut self, jobs: &mut Vec<FetchJob>) {
        match self.navigator.close() {
            CloseOutcome::Returned { closed, to } => {
                self.close_timeline(&closed);
                self.enter(&to, jobs);
            }
            CloseOutcome::Quit => self.quit = true,
            CloseOutcome::Ignored => {}
        }
    }

    fn refresh(&mut self, identity: &TimelineIdentity, jobs: &mut Vec<FetchJob>) {
        let timeline = revive(&mut self.registry, &self.in_flight, identity);
        timeline.reset_failures();
        if let Some(job) = timeline.refresh(&mut self.tickets) {
            jobs.push(self.track(job));
        }
    }

    fn post_created(&mut self, in_reply_to: Option<String>, jobs: &mut Vec<FetchJob>) {
        self.refresh(&TimelineIdentity::Home, jobs);
        if let Some(id) = in_reply_to {
            let thread = TimelineIdentity::Thread(id);
            if self.registry.contains(&thread) {
                self.refresh(&thread, jobs);
            }
        }
        self.evict();
    }

    fn enter(&mut self, identity: &TimelineIdentity, jobs: &mut Vec<FetchJob>) {
        let page_size = self.page_size;
        let timeline = revive(&mut self.registry, &self.in_flight, identity);
        timeline.scroll_into_view(page_size);
        if let Some(job) = timeline.ensure_loaded(&mut self.tickets) {
            jobs.push(self.track(job));
        }
        self.evict();
    }

    fn leave(&mut self, identity: &TimelineIdentity) {
        if self.registry.peek(identity).is_some_and(Timeline::is_dirty) {
            self.scheduler.push(Deferred::Save(identity.clone()));
        }
    }

    fn close_timeline(&mut self, identity: &TimelineIdentity) {
        self.registry.close(identity);
        self.scheduler.forget(identity);
    }

    fn evict(&mut self) {
        for identity in self.registry.evict(&self.navigator.pinned()) {
            self.scheduler.forget(&identity);
        }
    }

    fn track(&mut self, job: FetchJob) -> FetchJob {
        tracing::debug!(
            "Fetching {} {:?} (ticket {})",
            job.identity,
            job.request.direction,
            job.ticket.0
        );
        self.in_flight
            .insert(job.identity.clone(), (job.ticket, job.request.clone()));
        job
    }

    fn failed(
        &mut self,
        identity: &TimelineIdentity,
        error: FetchError,
        request: PageRequest,
        attempt: u32,
        now: Instant,
    ) {
        if let Some(delay) = self.config.retry.delay(&error, attempt) {
            tracing::warn!(
                "Fetch for {} failed (attempt {}): {}; retrying in {:?}",
                identity,
                attempt,
                error,
                delay
            );
            self.scheduler
                .push_at(now + delay, Deferred::Retry(identity.clone(), request));
            return;
        }

        tracing::error!("Fetch for {} failed: {}", identity, error);
        if self.navigator.active() == identity {
            self.navigator.fail(error);
        }
    }

    /// Merge a result for a timeline that is no longer live into its cache entry
    fn complete_detached(
        &self,
        identity: &TimelineIdentity,
        request: &PageRequest,
        result: Result<Page, FetchError>,
    ) {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Dropping failed fetch for closed {}: {}", identity, e);
                return;
            }
        };

        let store = self.registry.store();
        let mut timeline = Timeline::from_cache(identity.clone(), store.load(identity));
        timeline.merge_page(request, page);
        if let Err(e) = store.save(identity, &timeline.to_cache_entry()) {
            tracing::error!("Failed to save {}: {}", identity, e);
        }
    }

    fn drain(&mut self, now: Instant, jobs: &mut Vec<FetchJob>) {
        for work in self.scheduler.take_ready(now) {
            match work {
                Deferred::Prefetch(identity, direction) => {
                    let Some(timeline) = self.registry.get_live(&identity) else {
                        continue;
                    };
                    if let Some(job) = timeline.fetch_more(direction, &mut self.tickets) {
                        jobs.push(self.track(job));
                    }
                }
                Deferred::Retry(identity, request) => {
                    let Some(timeline) = self.registry.get_live(&identity) else {
                        continue;
                    };
                    match timeline.retry(request, &mut self.tickets) {
                        Some(job) => jobs.push(self.track(job)),
                        None => tracing::debug!("Skipping retry for {}: busy or outdated", identity),
                    }
                }
                Deferred::Save(identity) => {
                    self.registry.persist(&identity);
                }
            }
        }
    }
}

/// The live timeline for `identity`.
///
/// A timeline recreated after eviction takes over the fetch its earlier
/// instance left outstanding, so no second request is issued for it.
fn revive<'a, S: CacheStore>(
    registry: &'a mut Registry<S>,
    in_flight: &HashMap<TimelineIdentity, (Ticket, PageRequest)>,
    identity: &TimelineIdentity,
) -> &'a mut Timeline {
    let adopted = if registry.contains(identity) {
        None
    } else {
        in_flight.get(identity).cloned()
    };
    let timeline = registry.get(identity);
    if let Some((ticket, request)) = adopted {
        timeline.adopt_in_flight(ticket, request);
    }
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CacheEntry, Database};
    use crate::models::{Cursor, Direction};
    use pretty_assertions::assert_eq;

    fn item(id: &str) -> Item {
        Item::new(id, "someone@test")
    }

    fn page(ids: &[&str], next: Option<&str>, prev: Option<&str>) -> Page {
        Page::new(
            ids.iter().map(|id| item(id)).collect(),
            next.map(str::to_string),
            prev.map(str::to_string),
        )
    }

    fn engine(start: TimelineIdentity) -> Engine<Database> {
        Engine::new(Database::open_in_memory().unwrap(), start, EngineConfig::default())
    }

    fn seeded(start: TimelineIdentity, ids: &[&str], prev: Option<&str>) -> Engine<Database> {
        let db = Database::open_in_memory().unwrap();
        db.save(
            &start,
            &CacheEntry {
                items: ids.iter().map(|id| item(id)).collect(),
                cursor: Cursor::new(None, prev.map(str::to_string)),
                selected_index: 0,
            },
        )
        .unwrap();
        Engine::new(db, start, EngineConfig::default())
    }

    fn done(job: &FetchJob, result: Result<Page, FetchError>) -> FetchDone {
        FetchDone {
            ticket: job.ticket,
            identity: job.identity.clone(),
            request: job.request.clone(),
            result,
        }
    }

    fn ids(engine: &Engine<Database>) -> Vec<String> {
        engine
            .active_timeline()
            .unwrap()
            .items()
            .iter()
            .map(|i| i.id.clone())
            .collect()
    }

    #[test]
    fn test_start_fetches_when_cache_is_empty() {
        let now = Instant::now();
        let mut engine = engine(TimelineIdentity::Notifications);
        let jobs = engine.start(now);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].identity, TimelineIdentity::Notifications);
        assert!(jobs[0].request.is_latest());
        assert!(engine.view().loading);

        engine.complete(done(&jobs[0], Ok(page(&["A", "B"], Some("n"), Some("p")))), now);
        assert_eq!(ids(&engine), vec!["A", "B"]);
        assert!(!engine.view().loading);
        assert!(!engine.is_busy());
    }

    #[test]
    fn test_cached_timeline_needs_no_fetch() {
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B"], Some("p"));
        assert!(engine.start(Instant::now()).is_empty());
        assert_eq!(ids(&engine), vec!["A", "B"]);
    }

    #[test]
    fn test_empty_cache_entry_fetches() {
        let db = Database::open_in_memory().unwrap();
        db.save(&TimelineIdentity::Home, &CacheEntry::default()).unwrap();
        let mut engine = Engine::new(db, TimelineIdentity::Home, EngineConfig::default());
        assert_eq!(engine.start(Instant::now()).len(), 1);
        assert_eq!(engine.view().total, 0);
    }

    #[test]
    fn test_scroll_to_end_pages_backward_until_exhausted() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B", "C"], Some("p1"));
        engine.start(now);

        let jobs = engine.handle(Intent::Bottom, now);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].request, PageRequest::follow(Direction::Backward, "p1"));

        // A second request while the first is in flight is a no-op
        assert!(engine.handle(Intent::Down, now).is_empty());

        let more = engine.complete(done(&jobs[0], Ok(page(&["D", "E"], None, None))), now);
        assert!(more.is_empty());
        assert_eq!(ids(&engine), vec!["A", "B", "C", "D", "E"]);
        assert_eq!(engine.active_timeline().unwrap().cursor().prev, None);
        assert_eq!(engine.view().selected, 2);

        assert!(engine.handle(Intent::Bottom, now).is_empty());
    }

    #[test]
    fn test_merged_pages_are_persisted() {
        let now = Instant::now();
        let mut engine = engine(TimelineIdentity::Home);
        let jobs = engine.start(now);
        engine.complete(done(&jobs[0], Ok(page(&["A"], None, Some("p")))), now);

        let saved = engine.registry().store().load(&TimelineIdentity::Home).unwrap();
        assert_eq!(saved.items.len(), 1);
        assert_eq!(saved.cursor.prev.as_deref(), Some("p"));
    }

    #[test]
    fn test_transient_failure_is_retried_with_backoff() {
        let now = Instant::now();
        let mut engine = engine(TimelineIdentity::Home);
        let jobs = engine.start(now);

        let retry = engine.complete(done(&jobs[0], Err(FetchError::Network("reset".into()))), now);
        assert!(retry.is_empty());
        assert!(engine.view().error.is_some());
        assert_eq!(engine.state(), &NavState::Viewing(TimelineIdentity::Home));

        assert!(engine.tick(now + Duration::from_millis(100)).is_empty());
        let retry = engine.tick(now + Duration::from_millis(500));
        assert_eq!(retry.len(), 1);
        assert_eq!(retry[0].request, jobs[0].request);

        engine.complete(done(&retry[0], Ok(page(&["A"], None, None))), now);
        assert!(engine.view().error.is_none());
        assert_eq!(engine.active_timeline().unwrap().failures(), 0);
    }

    #[test]
    fn test_auth_failure_opens_error_modal() {
        let now = Instant::now();
        let mut engine = engine(TimelineIdentity::Home);
        let jobs = engine.start(now);

        engine.complete(done(&jobs[0], Err(FetchError::Auth("expired".into()))), now);
        assert!(matches!(
            engine.state(),
            NavState::ErrorModal(TimelineIdentity::Home, FetchError::Auth(_))
        ));
        assert!(engine.tick(now + Duration::from_secs(60)).is_empty());

        // Input other than dismiss is ignored while the modal is up
        assert!(engine.handle(Intent::Refresh, now).is_empty());
        engine.handle(Intent::DismissError, now);
        assert_eq!(engine.state(), &NavState::Viewing(TimelineIdentity::Home));
    }

    #[test]
    fn test_exhausted_retries_become_visible() {
        let now = Instant::now();
        let config = EngineConfig {
            retry: RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(10),
            },
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(
            Database::open_in_memory().unwrap(),
            TimelineIdentity::Home,
            config,
        );
        let jobs = engine.start(now);
        engine.complete(done(&jobs[0], Err(FetchError::Network("x".into()))), now);
        let retry = engine.tick(now + Duration::from_millis(10));
        engine.complete(done(&retry[0], Err(FetchError::Network("x".into()))), now);
        assert!(matches!(engine.state(), NavState::ErrorModal(..)));

        // An explicit refresh starts over
        engine.handle(Intent::DismissError, now);
        let jobs = engine.handle(Intent::Refresh, now);
        assert_eq!(jobs.len(), 1);
        assert_eq!(engine.active_timeline().unwrap().failures(), 0);
    }

    #[test]
    fn test_failure_on_inactive_timeline_is_recorded_only() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A"], None);
        engine.start(now);

        let notifications = engine.handle(Intent::Jump(TimelineIdentity::Notifications), now);
        engine.handle(Intent::Jump(TimelineIdentity::Home), now);

        engine.complete(
            done(&notifications[0], Err(FetchError::Auth("expired".into()))),
            now,
        );
        assert_eq!(engine.state(), &NavState::Viewing(TimelineIdentity::Home));
        let inactive = engine.timeline(&TimelineIdentity::Notifications).unwrap();
        assert!(inactive.last_error().is_some());
    }

    #[test]
    fn test_open_thread_and_close_back() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B"], None);
        engine.start(now);
        engine.handle(Intent::Down, now);

        let jobs = engine.handle(Intent::OpenSelected, now);
        let thread = TimelineIdentity::Thread("B".to_string());
        assert_eq!(engine.active(), &thread);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].identity, thread);
        assert_eq!(engine.view().depth, 1);
        assert!(engine.timeline(&TimelineIdentity::Home).unwrap().items()[1].read);

        engine.complete(done(&jobs[0], Ok(page(&["A", "B", "C"], None, None))), now);
        assert_eq!(engine.view().selected, 1);

        engine.handle(Intent::CloseActive, now);
        assert_eq!(engine.active(), &TimelineIdentity::Home);
        assert!(engine.timeline(&thread).is_none());
        assert_eq!(engine.view().selected, 1);

        engine.handle(Intent::CloseActive, now);
        assert!(engine.should_quit());
    }

    #[test]
    fn test_result_for_closed_thread_lands_in_cache() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A"], None);
        engine.start(now);
        let jobs = engine.handle(Intent::OpenSelected, now);
        engine.handle(Intent::CloseActive, now);

        let thread = TimelineIdentity::Thread("A".to_string());
        engine.complete(done(&jobs[0], Ok(page(&["A", "R"], None, None))), now);
        assert!(engine.timeline(&thread).is_none());
        assert_eq!(engine.registry().store().load(&thread).unwrap().items.len(), 2);
    }

    #[test]
    fn test_reopened_timeline_waits_for_outstanding_fetch() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A"], None);
        engine.start(now);
        let first = engine.handle(Intent::OpenSelected, now);
        engine.handle(Intent::CloseActive, now);

        // Reopening does not issue a second request for the same thread
        assert!(engine.handle(Intent::OpenSelected, now).is_empty());
        assert!(engine.view().loading);

        engine.complete(done(&first[0], Ok(page(&["A", "R"], None, None))), now);
        assert_eq!(ids(&engine), vec!["A", "R"]);
    }

    #[test]
    fn test_jump_prompt_and_jump() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A"], None);
        engine.start(now);

        engine.handle(Intent::BeginJump, now);
        assert_eq!(engine.state(), &NavState::JumpPrompt(TimelineIdentity::Home));
        // Scrolling is ignored under the prompt
        engine.handle(Intent::Down, now);
        engine.handle(Intent::CancelJump, now);
        assert_eq!(engine.state(), &NavState::Viewing(TimelineIdentity::Home));

        engine.handle(Intent::OpenSelected, now);
        engine.handle(Intent::BeginJump, now);
        let jobs = engine.handle(Intent::Jump(TimelineIdentity::Local), now);
        assert_eq!(engine.active(), &TimelineIdentity::Local);
        assert_eq!(jobs.len(), 1);
        assert_eq!(engine.view().depth, 0);
        assert!(engine.timeline(&TimelineIdentity::Thread("A".into())).is_none());
    }

    #[test]
    fn test_read_flags_flush_on_tick() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B"], None);
        engine.start(now);
        engine.handle(Intent::ReadSelected, now);

        let stored = engine.registry().store().load(&TimelineIdentity::Home).unwrap();
        assert!(!stored.items[0].read);

        engine.tick(now + Duration::from_secs(5));
        let stored = engine.registry().store().load(&TimelineIdentity::Home).unwrap();
        assert!(stored.items[0].read);
    }

    #[test]
    fn test_shutdown_flushes_read_flags() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B"], None);
        engine.start(now);
        engine.handle(Intent::SelectIndex(1), now);
        engine.handle(Intent::ReadSelected, now);
        engine.shutdown();

        let stored = engine.registry().store().load(&TimelineIdentity::Home).unwrap();
        assert!(stored.items[1].read);
        assert_eq!(stored.selected_index, 1);
    }

    #[test]
    fn test_post_created_refreshes_home_and_live_thread() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A"], None);
        engine.start(now);
        let thread_jobs = engine.handle(Intent::OpenSelected, now);
        let thread = TimelineIdentity::Thread("A".to_string());
        engine.complete(done(&thread_jobs[0], Ok(page(&["A"], None, None))), now);

        let jobs = engine.handle(
            Intent::PostCreated {
                in_reply_to: Some("A".to_string()),
            },
            now,
        );
        let refreshed: Vec<_> = jobs.iter().map(|j| j.identity.clone()).collect();
        assert_eq!(refreshed, vec![TimelineIdentity::Home, thread]);
        assert!(jobs.iter().all(|j| j.request.is_latest()));
    }

    #[test]
    fn test_page_size_drives_window() {
        let now = Instant::now();
        let ids: Vec<String> = (0..30).map(|i| format!("{i:02}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut engine = seeded(TimelineIdentity::Home, &refs, None);
        engine.start(now);
        engine.set_page_size(10);

        engine.handle(Intent::PageDown, now);
        engine.handle(Intent::PageDown, now);
        let view = engine.view();
        assert_eq!(view.selected, 20);
        assert_eq!(view.offset, 11);
        assert_eq!(view.items.len(), 10);
        assert_eq!(view.items[view.selected - view.offset].id, "20");
    }

    #[test]
    fn test_registry_stays_within_capacity() {
        let now = Instant::now();
        let config = EngineConfig {
            max_live_timelines: 2,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(
            Database::open_in_memory().unwrap(),
            TimelineIdentity::Home,
            config,
        );
        engine.start(now);
        for target in [
            TimelineIdentity::Local,
            TimelineIdentity::Public,
            TimelineIdentity::Bookmarks,
        ] {
            engine.handle(Intent::Jump(target), now);
            assert!(engine.registry().len() <= 2);
        }
        assert!(engine.timeline(&TimelineIdentity::Bookmarks).is_some());
    }

    #[test]
    fn test_outdated_retry_does_not_refetch_an_old_page() {
        let now = Instant::now();
        let mut engine = seeded(TimelineIdentity::Home, &["A", "B", "C"], Some("p1"));
        engine.start(now);

        let first = engine.handle(Intent::Bottom, now);
        engine.complete(done(&first[0], Err(FetchError::Network("reset".into()))), now);

        // Scrolling during the backoff pages on past the failed cursor
        let second = engine.handle(Intent::Down, now);
        assert_eq!(second[0].request, PageRequest::follow(Direction::Backward, "p1"));
        engine.complete(done(&second[0], Ok(page(&["D", "E"], None, Some("p2")))), now);

        let third = engine.handle(Intent::Bottom, now);
        assert_eq!(third[0].request, PageRequest::follow(Direction::Backward, "p2"));
        engine.complete(done(&third[0], Ok(page(&["F", "G"], None, None))), now);

        assert!(engine.tick(now + Duration::from_secs(10)).is_empty());
        assert_eq!(ids(&engine), vec!["A", "B", "C", "D", "E", "F", "G"]);
        assert_eq!(engine.active_timeline().unwrap().cursor().prev, None);
        assert!(!engine.is_busy());
    }

    #[test]
    fn test_refresh_of_evicted_timeline_waits_for_outstanding_fetch() {
        let now = Instant::now();
        let config = EngineConfig {
            max_live_timelines: 1,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(
            Database::open_in_memory().unwrap(),
            TimelineIdentity::Home,
            config,
        );
        let home = engine.start(now);
        engine.handle(Intent::Jump(TimelineIdentity::Local), now);
        assert!(engine.timeline(&TimelineIdentity::Home).is_none());

        let jobs = engine.handle(Intent::PostCreated { in_reply_to: None }, now);
        assert!(jobs.iter().all(|j| j.identity != TimelineIdentity::Home));

        engine.complete(done(&home[0], Ok(page(&["A", "B"], None, Some("p")))), now);
        let stored = engine.registry().store().load(&TimelineIdentity::Home).unwrap();
        assert_eq!(stored.items.len(), 2);
    }
}
