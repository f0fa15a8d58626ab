use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;
use sysinfo::System;

use super::entry::{now_millis, Entry};
use crate::tasks::FixedRateTask;

const DEFAULT_MAX_ENTRIES: usize = 1000;

const SWEEP_INITIAL_DELAY: Duration = Duration::from_secs(60);
const SWEEP_PERIOD: Duration = Duration::from_secs(300);

/// Slot in the recency list. `prev` points toward the most-recently-used
/// end, `next` toward the least-recently-used end.
struct Slot {
    key: String,
    entry: Entry,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Map plus recency list, mutated together under one lock so a lookup and
/// its promotion are atomic.
struct StoreInner {
    index: HashMap<String, usize>,
    slots: Vec<Option<Slot>>,
    head: Option<usize>,
    tail: Option<usize>,
    free: Vec<usize>,
}

impl StoreInner {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            head: None,
            tail: None,
            free: Vec::new(),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match &self.slots[idx] {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = None;
            slot.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(slot) = self.slots[h].as_mut() {
                slot.prev = Some(idx);
            }
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    fn allocate(&mut self) -> usize {
        match self.free.pop() {
            Some(idx) => idx,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        }
    }

    /// Detaches `idx` from the list and index, returning its slot.
    fn remove_slot(&mut self, idx: usize) -> Option<Slot> {
        self.unlink(idx);
        let slot = self.slots[idx].take()?;
        self.index.remove(&slot.key);
        self.free.push(idx);
        Some(slot)
    }

    fn remove_key(&mut self, key: &str) -> Option<Slot> {
        let idx = self.index.get(key).copied()?;
        self.remove_slot(idx)
    }

    /// Drops the least-recently-used entry, returning its key.
    fn evict_lru(&mut self) -> Option<String> {
        let tail = self.tail?;
        self.remove_slot(tail).map(|slot| slot.key)
    }
}

/// The node-local store: bounded LRU map of key to [`Entry`] with TTL
/// expiry and monotonic operation counters.
///
/// Mutating operations never suspend; they serialize on an internal mutex.
/// Counters are atomics and can be read without blocking. No operation
/// fails: misconfiguration degrades to defaults with a warning.
pub struct LocalStore {
    inner: Mutex<StoreInner>,
    max_entries: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    sweeper: Mutex<Option<FixedRateTask>>,
}

impl LocalStore {
    /// Creates the store and starts its background TTL sweeper (first run
    /// after one minute, then every five). A non-positive `max_entries`
    /// falls back to the default of 1000.
    pub fn new(max_entries: i64) -> Arc<Self> {
        let capacity = if max_entries <= 0 {
            tracing::warn!(
                "Cache max-entries configured as {}. Setting to default {}.",
                max_entries,
                DEFAULT_MAX_ENTRIES
            );
            DEFAULT_MAX_ENTRIES
        } else {
            max_entries as usize
        };

        let store = Arc::new(Self {
            inner: Mutex::new(StoreInner::new()),
            max_entries: capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            sweeper: Mutex::new(None),
        });

        let weak = Arc::downgrade(&store);
        let task = FixedRateTask::spawn(SWEEP_INITIAL_DELAY, SWEEP_PERIOD, move || {
            if let Some(store) = weak.upgrade() {
                store.sweep_expired();
            }
        });
        *store.sweeper.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);

        store
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Inserts or replaces `key`. The new entry is most-recently-used; if
    /// the insertion pushed the map past capacity, the least-recently-used
    /// key is evicted. Eviction is not counted as a delete.
    pub fn put(&self, key: &str, value: Value, ttl_millis: u64) {
        let entry = Entry::new(value, ttl_millis);
        let mut inner = self.lock_inner();

        match inner.index.get(key).copied() {
            Some(idx) => {
                if let Some(slot) = inner.slots[idx].as_mut() {
                    slot.entry = entry;
                }
                inner.promote(idx);
            }
            None => {
                let idx = inner.allocate();
                inner.slots[idx] = Some(Slot {
                    key: key.to_string(),
                    entry,
                    prev: None,
                    next: None,
                });
                inner.index.insert(key.to_string(), idx);
                inner.push_front(idx);
            }
        }

        if inner.index.len() > self.max_entries {
            if let Some(evicted) = inner.evict_lru() {
                tracing::info!(
                    "Evicting LRU entry '{}': cache exceeded max entries ({})",
                    evicted,
                    self.max_entries
                );
            }
        }

        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the value if present and unexpired, promoting the key. An
    /// expired entry is removed before the miss is reported.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = now_millis();
        let mut inner = self.lock_inner();

        let Some(idx) = inner.index.get(key).copied() else {
            drop(inner);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        let expired = match &inner.slots[idx] {
            Some(slot) => slot.entry.is_expired(now),
            None => true,
        };
        if expired {
            inner.remove_slot(idx);
            drop(inner);
            tracing::debug!("Key '{}' expired and removed", key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        inner.promote(idx);
        let value = inner.slots[idx]
            .as_ref()
            .map(|slot| slot.entry.value().clone());
        drop(inner);
        self.hits.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Removes `key` if present. The delete counter is incremented whether
    /// or not the key existed.
    pub fn delete(&self, key: &str) {
        let mut inner = self.lock_inner();
        inner.remove_key(key);
        drop(inner);
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of non-expired entries. Expired entries that have not been
    /// swept yet are excluded.
    pub fn size(&self) -> usize {
        let now = now_millis();
        let inner = self.lock_inner();
        inner
            .slots
            .iter()
            .flatten()
            .filter(|slot| !slot.entry.is_expired(now))
            .count()
    }

    /// Point-in-time copy of all non-expired `(key, value)` pairs. Expired
    /// entries observed along the way are removed.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        let now = now_millis();
        let mut inner = self.lock_inner();

        let mut expired: Vec<usize> = Vec::new();
        let mut result = HashMap::with_capacity(inner.index.len());
        for (idx, slot) in inner.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            if slot.entry.is_expired(now) {
                expired.push(idx);
            } else {
                result.insert(slot.key.clone(), slot.entry.value().clone());
            }
        }
        for idx in expired {
            inner.remove_slot(idx);
        }
        result
    }

    /// Removes every expired entry. Runs on the background sweeper but is
    /// safe to call directly.
    pub fn sweep_expired(&self) {
        let now = now_millis();
        let mut inner = self.lock_inner();
        let before = inner.index.len();

        let expired: Vec<usize> = inner
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                slot.as_ref()
                    .filter(|s| s.entry.is_expired(now))
                    .map(|_| idx)
            })
            .collect();
        for idx in expired {
            inner.remove_slot(idx);
        }

        let after = inner.index.len();
        if before != after {
            tracing::info!("TTL sweep removed {} expired entries", before - after);
        }
    }

    /// Resident memory of this process, in bytes.
    pub fn memory_usage(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        match sysinfo::get_current_pid() {
            Ok(pid) => {
                sys.refresh_processes();
                sys.process(pid).map(|p| p.memory()).unwrap_or(0)
            }
            Err(_) => 0,
        }
    }

    /// Total memory of the host, in bytes.
    pub fn total_memory(&self) -> u64 {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.total_memory()
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hit_count();
        let total = hits + self.miss_count();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Cancels the background sweeper.
    pub fn shutdown(&self) {
        if let Some(task) = self
            .sweeper
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.cancel();
            tracing::info!("LocalStore sweeper shut down");
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
