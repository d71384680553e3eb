// TTL cache of cluster states, keyed by cluster name.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::clock::{Clock, SystemClock};
use super::cluster_state::ClusterState;

struct CacheEntry {
    state: ClusterState,
    expires_at: DateTime<Utc>,
    ttl: Duration,
}

pub struct ClusterStateCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    next_generation: AtomicU64,
}

impl ClusterStateCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
            next_generation: AtomicU64::new(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current record, or `None` when absent or past its TTL.
    pub fn get(&self, cluster_name: &str) -> Option<ClusterState> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(cluster_name) {
            if entry.expires_at > now {
                return Some(entry.state.clone());
            }
        }
        self.evict_if_expired(cluster_name, now);
        None
    }

    /// Stores `state` under its cluster name, replacing any existing record.
    #[cfg(test)]
    pub fn put(&self, state: ClusterState, ttl: Duration) {
        let now = self.clock.now();
        log::debug!(
            "Added cache entry for '{}' with {}ms TTL",
            state.cluster_name,
            ttl.as_millis()
        );
        self.entries.insert(
            state.cluster_name.clone(),
            CacheEntry {
                expires_at: expiry(now, ttl),
                state,
                ttl,
            },
        );
    }

    /// Returns the live record for `cluster_name`, or creates a fresh INITIAL
    /// one when there is none or `force_refresh` is set. The flag tells the
    /// caller whether a fetch must be started for the returned record.
    pub fn get_or_create(&self, cluster_name: &str, force_refresh: bool) -> (ClusterState, bool) {
        let now = self.clock.now();
        match self.entries.entry(cluster_name.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get();
                if !force_refresh && entry.expires_at > now {
                    return (entry.state.clone(), false);
                }
                // A replacement must always look newer than what it replaces.
                let created = if now > entry.state.create_timestamp {
                    now
                } else {
                    entry.state.create_timestamp + chrono::Duration::milliseconds(1)
                };
                let state = self.fresh_state(cluster_name, created);
                log::debug!(
                    "Replacing cache entry for '{}' (forced refresh: {})",
                    cluster_name,
                    force_refresh
                );
                occupied.insert(self.entry_for(state.clone(), now, self.ttl));
                (state, true)
            }
            Entry::Vacant(vacant) => {
                let state = self.fresh_state(cluster_name, now);
                log::debug!(
                    "Added cache entry for '{}' with {}ms TTL",
                    cluster_name,
                    self.ttl.as_millis()
                );
                vacant.insert(self.entry_for(state.clone(), now, self.ttl));
                (state, true)
            }
        }
    }

    /// Replaces the record of `cluster_name` with `transition(current)`, but
    /// only while the stored record still belongs to `generation`. Returns
    /// the written record, or `None` when the write was discarded.
    pub fn update<F>(&self, cluster_name: &str, generation: u64, transition: F) -> Option<ClusterState>
    where
        F: FnOnce(&ClusterState) -> ClusterState,
    {
        let now = self.clock.now();
        match self.entries.entry(cluster_name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().state.generation != generation {
                    log::debug!(
                        "Discarding write for '{}' from stale fetch generation {} (current {})",
                        cluster_name,
                        generation,
                        occupied.get().state.generation
                    );
                    return None;
                }
                let next = transition(&occupied.get().state);
                let ttl = occupied.get().ttl;
                occupied.insert(self.entry_for(next.clone(), now, ttl));
                Some(next)
            }
            Entry::Vacant(vacant) => {
                // Swept while the fetch was running; nobody has asked since.
                let next = transition(&ClusterState::new(cluster_name, now, generation));
                vacant.insert(self.entry_for(next.clone(), now, self.ttl));
                Some(next)
            }
        }
    }

    /// Drops every expired record; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|name, entry| {
            let live = entry.expires_at > now;
            if !live {
                log::debug!(
                    "Cached value for '{}' cluster expired after {}ms",
                    name,
                    entry.ttl.as_millis()
                );
            }
            live
        });
        before.saturating_sub(self.entries.len())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh_state(&self, cluster_name: &str, created: DateTime<Utc>) -> ClusterState {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        ClusterState::new(cluster_name, created, generation)
    }

    fn entry_for(&self, state: ClusterState, now: DateTime<Utc>, ttl: Duration) -> CacheEntry {
        CacheEntry {
            state,
            expires_at: expiry(now, ttl),
            ttl,
        }
    }

    fn evict_if_expired(&self, cluster_name: &str, now: DateTime<Utc>) {
        if let Some((name, entry)) = self
            .entries
            .remove_if(cluster_name, |_, entry| entry.expires_at <= now)
        {
            log::debug!(
                "Cached value for '{}' cluster expired after {}ms",
                name,
                entry.ttl.as_millis()
            );
        }
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
