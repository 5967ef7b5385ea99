//! Work postponed until the current intent or completion has been handled

use std::collections::VecDeque;
use std::time::Instant;

use crate::models::{Direction, PageRequest, TimelineIdentity};

/// A unit of postponed work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Read ahead in one direction
    Prefetch(TimelineIdentity, Direction),
    /// Repeat a failed request
    Retry(TimelineIdentity, PageRequest),
    /// Write a timeline to the cache
    Save(TimelineIdentity),
}

/// Queue of postponed work, drained on the foreground.
///
/// Identical pending entries are coalesced so a burst of scrolling asks for
/// one prefetch and a burst of read marks causes one write.
#[derive(Debug, Default)]
pub struct Scheduler {
    ready: VecDeque<Deferred>,
    delayed: Vec<(Instant, Deferred)>,
}

impl Scheduler {
    /// Create an empty scheduler
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue work for the next drain. Returns `false` if it was already queued.
    pub fn push(&mut self, work: Deferred) -> bool {
        if self.ready.contains(&work) {
            return false;
        }
        self.ready.push_back(work);
        true
    }

    /// Queue work that becomes ready at `due`
    pub fn push_at(&mut self, due: Instant, work: Deferred) {
        if let Some(slot) = self.delayed.iter_mut().find(|(_, w)| *w == work) {
            slot.0 = slot.0.min(due);
            return;
        }
        self.delayed.push((due, work));
    }

    /// Take everything that is ready at `now`, in queue order
    pub fn take_ready(&mut self, now: Instant) -> Vec<Deferred> {
        let mut due: Vec<(Instant, Deferred)> = Vec::new();
        self.delayed.retain(|(at, work)| {
            if *at <= now {
                due.push((*at, work.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, _)| *at);

        let mut out: Vec<Deferred> = self.ready.drain(..).collect();
        out.extend(due.into_iter().map(|(_, work)| work));
        out
    }

    /// Drop pending work for a timeline that is gone
    pub fn forget(&mut self, identity: &TimelineIdentity) {
        let keep = |work: &Deferred| match work {
            Deferred::Prefetch(id, _) | Deferred::Retry(id, _) => id != identity,
            Deferred::Save(_) => true,
        };
        self.ready.retain(keep);
        self.delayed.retain(|(_, work)| keep(work));
    }

    /// Drop pending retries for a timeline that has just merged a page
    pub fn forget_retries(&mut self, identity: &TimelineIdentity) {
        let keep = |work: &Deferred| !matches!(work, Deferred::Retry(id, _) if id == identity);
        self.ready.retain(keep);
        self.delayed.retain(|(_, work)| keep(work));
    }

    /// When the earliest delayed entry becomes ready
    pub fn next_due(&self) -> Option<Instant> {
        self.delayed.iter().map(|(at, _)| *at).min()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.delayed.is_empty()
    }
}
