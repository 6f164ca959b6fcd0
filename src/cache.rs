//! Fixed-capacity, time-expiring read-through cache.
//!
//! Instances are constructed and owned explicitly; there is no process-wide
//! hidden cache. The lock is never held while a value is being computed, so
//! two concurrent misses on the same key may both compute. The second insert
//! simply overwrites the first.
//!
//! A full cache evicts by insertion order. Every entry shares one TTL, so
//! the oldest insertion is also the first to expire.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    seq: u64,
}

/// Entries plus their insertion order.
///
/// `order` may hold stale `(key, seq)` pairs for keys that were overwritten
/// or dropped; a pair is live only while its `seq` matches the entry's.
struct Slots<K, V> {
    entries: HashMap<K, Entry<V>>,
    order: VecDeque<(K, u64)>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone, V> Slots<K, V> {
    fn is_live(&self, key: &K, seq: u64) -> bool {
        self.entries.get(key).map_or(false, |entry| entry.seq == seq)
    }

    /// Drop the oldest live entry
    fn evict_oldest(&mut self) {
        while let Some((key, seq)) = self.order.pop_front() {
            if self.is_live(&key, seq) {
                self.entries.remove(&key);
                return;
            }
        }
    }

    /// Keep the queue within twice the live entry count
    fn compact(&mut self) {
        if self.order.len() > 2 * self.entries.len().max(1) {
            let entries = &self.entries;
            self.order.retain(|(key, seq)| entries.get(key).map_or(false, |e| e.seq == *seq));
        }
    }
}

pub struct TtlCache<K, V> {
    slots: Mutex<Slots<K, V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(Slots { entries: HashMap::new(), order: VecDeque::new(), next_seq: 0 }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self::new(config.capacity, config.ttl())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`, dropping it if it has expired
    pub fn get(&self, key: &K) -> Option<V> {
        let mut slots = self.slots.lock().unwrap();
        match slots.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                slots.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value`, evicting the oldest entry when a new key meets a full cache
    pub fn insert(&self, key: K, value: V) {
        let mut slots = self.slots.lock().unwrap();
        if !slots.entries.contains_key(&key) && slots.entries.len() >= self.capacity {
            slots.evict_oldest();
        }

        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots.order.push_back((key.clone(), seq));
        slots.entries.insert(key, Entry { value, inserted_at: Instant::now(), seq });
        slots.compact();
    }

    /// Cached value for `key`, or the result of `compute` stored under it.
    ///
    /// Errors from `compute` are returned and nothing is cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Number of stored entries, expired ones included until next touched
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut slots = self.slots.lock().unwrap();
        slots.entries.clear();
        slots.order.clear();
    }
}
