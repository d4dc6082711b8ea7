//! # Session Store
//!
//! The backend the resolver asks "who owns this session id?".
//!
//! [`SessionStore`] is the seam: anything that can load, save and drop
//! [`SessionRecord`]s can stand behind the login-user extractor.
//! [`MemoryStore`] is the bundled implementation, a bounded map with
//! least-recently-used eviction.
//!
//! ## Eviction
//!
//! Recency is tracked with a logical clock (monotonic counter), not wall
//! time, so eviction order depends only on the sequence of operations.
//! Ties are impossible because every touch takes a fresh tick.

use crate::error::StoreError;
use crate::session::{SessionId, SessionRecord, Timestamp};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Default maximum number of live sessions held by [`MemoryStore`].
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

// =============================================================================
// SESSIONSTORE TRAIT
// =============================================================================

/// Storage for live sessions.
///
/// Implementations are shared across request tasks, so every method takes
/// `&self` and must be safe to call concurrently.
pub trait SessionStore: Send + Sync {
    /// Fetch a session. Expired records are returned as-is; expiry is the
    /// resolver's decision.
    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Insert or replace a session.
    fn save(&self, record: SessionRecord) -> Result<(), StoreError>;

    /// Drop a session, returning it if it existed.
    fn remove(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError>;

    /// Push a held session's expiry out by `ttl_secs` from `now`.
    ///
    /// Must check and write in one step: a session removed concurrently
    /// stays removed, and `None` is returned.
    fn renew(
        &self,
        id: &SessionId,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Drop every session expired at `now`. Returns how many were dropped.
    fn purge_expired(&self, now: Timestamp) -> Result<usize, StoreError>;

    /// Number of sessions currently held.
    fn len(&self) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug)]
struct Slot {
    record: SessionRecord,
    /// Logical tick of the last load or save.
    last_access: u64,
}

#[derive(Debug, Default)]
struct Inner {
    slots: BTreeMap<SessionId, Slot>,
    /// Tick -> id, kept in step with `slots` so the LRU entry is the first key.
    recency: BTreeMap<u64, SessionId>,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Inner {
    fn tick(&mut self) -> u64 {
        self.clock = self.clock.saturating_add(1);
        self.clock
    }

    fn touch(&mut self, id: &SessionId) {
        let now = self.tick();
        if let Some(slot) = self.slots.get_mut(id) {
            self.recency.remove(&slot.last_access);
            slot.last_access = now;
            self.recency.insert(now, id.clone());
        }
    }

    fn take(&mut self, id: &SessionId) -> Option<SessionRecord> {
        let slot = self.slots.remove(id)?;
        self.recency.remove(&slot.last_access);
        Some(slot.record)
    }

    fn evict_lru(&mut self) {
        if let Some((_, id)) = self.recency.pop_first() {
            self.slots.remove(&id);
            self.evictions = self.evictions.saturating_add(1);
        }
    }
}

/// Bounded in-memory session store with LRU eviction.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl MemoryStore {
    /// Create a store holding at most `capacity` sessions (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot of store counters.
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let inner = self.lock()?;
        Ok(StoreStats {
            size: inner.slots.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
        })
    }

    /// Whether `id` is held, without counting as a use.
    pub fn contains(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.lock()?.slots.contains_key(id))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        let mut inner = self.lock()?;
        let found = inner.slots.get(id).map(|slot| slot.record.clone());
        if found.is_some() {
            inner.hits = inner.hits.saturating_add(1);
            inner.touch(id);
        } else {
            inner.misses = inner.misses.saturating_add(1);
        }
        Ok(found)
    }

    fn save(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let id = record.id.clone();

        if let Some(slot) = inner.slots.get_mut(&id) {
            slot.record = record;
        } else {
            if inner.slots.len() >= self.capacity {
                inner.evict_lru();
            }
            inner.slots.insert(
                id.clone(),
                Slot {
                    record,
                    last_access: 0,
                },
            );
        }
        inner.touch(&id);
        Ok(())
    }

    fn remove(&self, id: &SessionId) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.take(id))
    }

    fn renew(
        &self,
        id: &SessionId,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut inner = self.lock()?;
        let Some(slot) = inner.slots.get_mut(id) else {
            return Ok(None);
        };
        slot.record = slot.record.renewed(now, ttl_secs);
        let renewed = slot.record.clone();
        inner.touch(id);
        Ok(Some(renewed))
    }

    fn purge_expired(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut inner = self.lock()?;
        let expired: Vec<SessionId> = inner
            .slots
            .iter()
            .filter(|(_, slot)| slot.record.is_expired(now))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            inner.take(id);
        }
        Ok(expired.len())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.slots.len())
    }
}

// =============================================================================
// STORE STATISTICS
// =============================================================================

/// Counters reported by [`MemoryStore::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::SessionUser;

    fn record(n: u8, expires_at: u64) -> SessionRecord {
        let id = SessionId::parse(&format!("{:032x}", n)).unwrap_or_else(|_| SessionId::generate());
        SessionRecord {
            id,
            user: SessionUser::new(format!("user{n}"), format!("user{n}@example.com")),
            created_at: Timestamp(0),
            expires_at: Timestamp(expires_at),
            last_seen: Timestamp(0),
        }
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        assert_eq!(store.save(rec.clone()), Ok(()));

        assert_eq!(store.load(&rec.id), Ok(Some(rec)));
        assert_eq!(store.len(), Ok(1));
    }

    #[test]
    fn load_missing_is_none() {
        let store = MemoryStore::default();
        assert_eq!(store.load(&record(9, 0).id), Ok(None));
        assert_eq!(store.is_empty(), Ok(true));
    }

    #[test]
    fn save_replaces_existing() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        let _ = store.save(rec.clone());
        let newer = SessionRecord {
            expires_at: Timestamp(500),
            ..rec.clone()
        };
        let _ = store.save(newer);

        assert_eq!(store.len(), Ok(1));
        let loaded = store.load(&rec.id).ok().flatten();
        assert_eq!(loaded.map(|r| r.expires_at), Some(Timestamp(500)));
    }

    #[test]
    fn eviction_drops_least_recently_used() {
        let store = MemoryStore::new(3);
        let (a, b, c, d) = (record(1, 99), record(2, 99), record(3, 99), record(4, 99));
        let _ = store.save(a.clone());
        let _ = store.save(b.clone());
        let _ = store.save(c.clone());

        // Use a and b so c becomes the LRU.
        let _ = store.load(&a.id);
        let _ = store.load(&b.id);

        let _ = store.save(d.clone());

        assert_eq!(store.contains(&a.id), Ok(true));
        assert_eq!(store.contains(&b.id), Ok(true));
        assert_eq!(store.contains(&c.id), Ok(false));
        assert_eq!(store.contains(&d.id), Ok(true));
        assert_eq!(store.stats().map(|s| s.evictions), Ok(1));
    }

    #[test]
    fn replacing_does_not_evict() {
        let store = MemoryStore::new(1);
        let rec = record(1, 99);
        let _ = store.save(rec.clone());
        let _ = store.save(rec.clone());
        assert_eq!(store.stats().map(|s| s.evictions), Ok(0));
        assert_eq!(store.contains(&rec.id), Ok(true));
    }

    #[test]
    fn remove_returns_record() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        let _ = store.save(rec.clone());

        assert_eq!(store.remove(&rec.id), Ok(Some(rec.clone())));
        assert_eq!(store.remove(&rec.id), Ok(None));
        assert_eq!(store.is_empty(), Ok(true));
    }

    #[test]
    fn purge_drops_only_expired() {
        let store = MemoryStore::new(10);
        let old = record(1, 50);
        let fresh = record(2, 500);
        let _ = store.save(old.clone());
        let _ = store.save(fresh.clone());

        assert_eq!(store.purge_expired(Timestamp(100)), Ok(1));
        assert_eq!(store.contains(&old.id), Ok(false));
        assert_eq!(store.contains(&fresh.id), Ok(true));

        // Purged sessions must not linger in the recency index.
        let _ = store.save(record(3, 500));
        assert_eq!(store.len(), Ok(2));
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        let _ = store.save(rec.clone());
        let _ = store.load(&rec.id);
        let _ = store.load(&record(2, 0).id);

        let stats = store.stats();
        assert_eq!(
            stats,
            Ok(StoreStats {
                size: 1,
                capacity: 10,
                hits: 1,
                misses: 1,
                evictions: 0,
            })
        );
    }

    #[test]
    fn renew_extends_held_session() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        let _ = store.save(rec.clone());

        let renewed = store.renew(&rec.id, Timestamp(90), 60);
        assert_eq!(renewed.map(|r| r.map(|r| r.expires_at)), Ok(Some(Timestamp(150))));
        let loaded = store.load(&rec.id).ok().flatten();
        assert_eq!(loaded.map(|r| r.expires_at), Some(Timestamp(150)));
    }

    #[test]
    fn renew_does_not_resurrect_removed_session() {
        let store = MemoryStore::new(10);
        let rec = record(1, 100);
        let _ = store.save(rec.clone());
        let _ = store.remove(&rec.id);

        assert_eq!(store.renew(&rec.id, Timestamp(10), 60), Ok(None));
        assert_eq!(store.contains(&rec.id), Ok(false));
        assert_eq!(store.len(), Ok(0));
    }

    #[test]
    fn poisoned_lock_is_reported_not_hidden() {
        let store = std::sync::Arc::new(MemoryStore::new(4));
        let _ = store.save(record(1, 100));

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.lock();
            std::panic::resume_unwind(Box::new("poison"));
        })
        .join();

        assert_eq!(store.len(), Err(StoreError::Poisoned));
        assert_eq!(store.is_empty(), Err(StoreError::Poisoned));
    }

    #[test]
    fn capacity_has_floor_of_one() {
        assert_eq!(MemoryStore::new(0).capacity(), 1);
    }

    #[test]
    fn store_is_object_safe() {
        let store: std::sync::Arc<dyn SessionStore> = std::sync::Arc::new(MemoryStore::new(2));
        assert_eq!(store.is_empty(), Ok(true));
    }
}
