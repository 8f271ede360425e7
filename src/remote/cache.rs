use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::OnceCell;

use crate::models::RemoteDetail;

/// Cached outcome of an exact lookup; `None` is a negative entry.
type CachedLookup = Option<RemoteDetail>;

struct CacheSlot {
    cell: Arc<OnceCell<CachedLookup>>,
    inserted_at: Instant,
    generation: u64,
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<String, CacheSlot>,
    /// `(key, generation)` in insertion order; only kept when size-bounded.
    insertion_order: VecDeque<(String, u64)>,
    next_generation: u64,
}

impl CacheState {
    fn is_live(&self, key: &str, generation: u64) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Drops order entries whose slot expired or was replaced, keeping the
    /// queue within twice the entry bound.
    fn compact_order(&mut self, max: usize) {
        while let Some((key, generation)) = self.insertion_order.front() {
            if self.is_live(key, *generation) {
                break;
            }
            self.insertion_order.pop_front();
        }

        if self.insertion_order.len() > max.saturating_mul(2) {
            let CacheState {
                slots,
                insertion_order,
                ..
            } = self;
            insertion_order.retain(|(key, generation)| {
                slots
                    .get(key)
                    .is_some_and(|slot| slot.generation == *generation)
            });
        }
    }
}

/// Exact-lookup cache owned by the remote provider.
///
/// Each key holds a once-cell, so concurrent lookups of one title share a
/// single in-flight request. Unbounded and never expiring unless a size or
/// TTL bound is configured.
pub struct RemoteCache {
    state: Mutex<CacheState>,
    max_entries: Option<usize>,
    ttl: Option<Duration>,
}

impl Default for RemoteCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RemoteCache {
    pub fn unbounded() -> Self {
        Self::new(None, None)
    }

    pub fn new(max_entries: Option<usize>, ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            max_entries: max_entries.filter(|max| *max > 0),
            ttl,
        }
    }

    /// Cache keys are the trimmed, lowercased raw title.
    pub fn key_for(title: &str) -> String {
        title.trim().to_lowercase()
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the cached lookup for `key`, running `fetch` only when no live
    /// entry exists. Concurrent callers for the same key await one fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> CachedLookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CachedLookup>,
    {
        let cell = self.slot_for(key);
        let value = cell.get_or_init(fetch).await;
        value.clone()
    }

    fn slot_for(&self, key: &str) -> Arc<OnceCell<CachedLookup>> {
        let now = Instant::now();
        let mut state = self.lock();

        if let Some(slot) = state.slots.get(key) {
            let expired = self
                .ttl
                .is_some_and(|ttl| now.duration_since(slot.inserted_at) >= ttl);
            if !expired {
                return Arc::clone(&slot.cell);
            }
            state.slots.remove(key);
        }

        if let Some(max) = self.max_entries {
            while state.slots.len() >= max {
                let Some((oldest, generation)) = state.insertion_order.pop_front() else {
                    break;
                };
                if state.is_live(&oldest, generation) {
                    state.slots.remove(&oldest);
                }
            }
        }

        let generation = state.next_generation;
        state.next_generation += 1;

        let cell = Arc::new(OnceCell::new());
        state.slots.insert(
            key.to_string(),
            CacheSlot {
                cell: Arc::clone(&cell),
                inserted_at: now,
                generation,
            },
        );
        if let Some(max) = self.max_entries {
            state.insertion_order.push_back((key.to_string(), generation));
            state.compact_order(max);
        }
        cell
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
