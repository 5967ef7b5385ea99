//! Live timelines by identity, backed by the cache store

use std::collections::HashMap;

use crate::db::CacheStore;
use crate::models::TimelineIdentity;

use super::timeline::Timeline;

struct Slot {
    timeline: Timeline,
    last_used: u64,
}

/// Owns every live [`Timeline`] and the store they persist to.
///
/// At most one live timeline exists per identity. Beyond `capacity` live
/// timelines the least recently used unpinned one is saved and dropped.
pub struct Registry<S: CacheStore> {
    store: S,
    live: HashMap<TimelineIdentity, Slot>,
    capacity: usize,
    clock: u64,
}

impl<S: CacheStore> Registry<S> {
    /// Create an empty registry
    pub fn new(store: S, capacity: usize) -> Self {
        Self {
            store,
            live: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    /// The live timeline for `identity`, seeded from the cache on first use
    pub fn get(&mut self, identity: &TimelineIdentity) -> &mut Timeline {
        self.clock += 1;
        let clock = self.clock;
        let store = &self.store;
        let slot = self.live.entry(identity.clone()).or_insert_with(|| {
            let entry = store.load(identity);
            tracing::debug!(
                "Opened {} ({} cached items)",
                identity,
                entry.as_ref().map_or(0, |e| e.items.len())
            );
            Slot {
                timeline: Timeline::from_cache(identity.clone(), entry),
                last_used: clock,
            }
        });
        slot.last_used = clock;
        &mut slot.timeline
    }

    /// The live timeline for `identity`, if there is one
    pub fn get_live(&mut self, identity: &TimelineIdentity) -> Option<&mut Timeline> {
        self.live.get_mut(identity).map(|slot| &mut slot.timeline)
    }

    /// Read-only access to a live timeline
    pub fn peek(&self, identity: &TimelineIdentity) -> Option<&Timeline> {
        self.live.get(identity).map(|slot| &slot.timeline)
    }

    /// Whether `identity` is live
    pub fn contains(&self, identity: &TimelineIdentity) -> bool {
        self.live.contains_key(identity)
    }

    /// Number of live timelines
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no timeline is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// The backing store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Write a live timeline to the store if it has unsaved changes.
    ///
    /// Storage failures are logged; the timeline stays dirty and is retried
    /// on the next save.
    pub fn persist(&mut self, identity: &TimelineIdentity) -> bool {
        let Some(slot) = self.live.get_mut(identity) else {
            return false;
        };
        if !slot.timeline.is_dirty() {
            return false;
        }
        match self.store.save(identity, &slot.timeline.to_cache_entry()) {
            Ok(()) => {
                slot.timeline.mark_clean();
                true
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", identity, e);
                false
            }
        }
    }

    /// Persist every dirty live timeline
    pub fn persist_all(&mut self) -> usize {
        let dirty: Vec<TimelineIdentity> = self
            .live
            .iter()
            .filter(|(_, slot)| slot.timeline.is_dirty())
            .map(|(id, _)| id.clone())
            .collect();
        dirty.iter().filter(|id| self.persist(id)).count()
    }

    /// Identities of live timelines with unsaved changes
    pub fn dirty(&self) -> Vec<TimelineIdentity> {
        self.live
            .iter()
            .filter(|(_, slot)| slot.timeline.is_dirty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Persist and drop a live timeline
    pub fn close(&mut self, identity: &TimelineIdentity) -> Option<Timeline> {
        self.persist(identity);
        let slot = self.live.remove(identity)?;
        tracing::debug!("Closed {}", identity);
        Some(slot.timeline)
    }

    /// Drop least recently used timelines until within capacity, never touching `pinned`.
    ///
    /// Returns the evicted identities.
    pub fn evict(&mut self, pinned: &[TimelineIdentity]) -> Vec<TimelineIdentity> {
        let mut evicted = Vec::new();
        while self.live.len() > self.capacity {
            let victim = self
                .live
                .iter()
                .filter(|(id, _)| !pinned.contains(*id))
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(id, _)| id.clone());
            let Some(victim) = victim else {
                break;
            };
            self.close(&victim);
            evicted.push(victim);
        }
        evicted
    }
}
