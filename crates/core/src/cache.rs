//! Short-lived result cache for read-only queries.
//!
//! Entries expire after a fixed TTL and are evicted lazily on lookup. When a
//! size bound is configured, inserting into a full cache first drops expired
//! entries and then the oldest one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self { origin: Instant::now(), offset: Mutex::new(Duration::ZERO) }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.origin + offset
    }
}

#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CacheLookup<V> {
    pub value: V,
    pub hit: bool,
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Per-key gate plus the number of callers currently holding or awaiting it.
#[derive(Default)]
struct Inflight {
    gate: Gate,
    holders: usize,
}

pub struct ResultCache<V> {
    ttl: Duration,
    max_entries: usize,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    inflight: Mutex<HashMap<String, Inflight>>,
}

impl<V: Clone> ResultCache<V> {
    /// `max_entries == 0` leaves the cache unbounded.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            max_entries,
            clock,
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the value when its age is at most the TTL. An expired entry is
    /// removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries();
        let expired = match entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.stored_at) <= self.ttl => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now();
        let mut entries = self.entries();

        if self.max_entries > 0 && !entries.contains_key(&key) && entries.len() >= self.max_entries
        {
            let ttl = self.ttl;
            entries.retain(|_, entry| now.saturating_duration_since(entry.stored_at) <= ttl);

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, CacheEntry { value, stored_at: now });
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Stored entries, expired ones included until they are next touched.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Cached value or the result of `fetch`, stored on success.
    ///
    /// Concurrent misses for one key queue on a per-key gate, so only the
    /// first caller runs `fetch`; the rest re-check the cache once they get
    /// through. Errors are returned as-is and never cached.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<CacheLookup<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(CacheLookup { value, hit: true });
        }

        let release = GateRelease { key, gate: self.gate(key), inflight: &self.inflight };
        let _turn = release.gate.lock().await;
        if let Some(value) = self.get(key) {
            return Ok(CacheLookup { value, hit: true });
        }

        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(CacheLookup { value, hit: false })
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self, key: &str) -> Gate {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = inflight.entry(key.to_owned()).or_default();
        slot.holders += 1;
        slot.gate.clone()
    }
}

/// Unregisters one holder of a per-key gate when the caller finishes or is
/// cancelled; the last holder removes the gate.
struct GateRelease<'a> {
    key: &'a str,
    gate: Gate,
    inflight: &'a Mutex<HashMap<String, Inflight>>,
}

impl Drop for GateRelease<'_> {
    fn drop(&mut self) {
        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = inflight.get_mut(self.key) {
            slot.holders = slot.holders.saturating_sub(1);
            if slot.holders == 0 {
                inflight.remove(self.key);
            }
        }
    }
}

impl<V> std::fmt::Debug for ResultCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}
