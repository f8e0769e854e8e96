//! Batched, deduplicated reference loading.
//!
//! [`ReferenceLoader::load`] turns a list of keys (duplicates and all)
//! into one underlying fetch per unique key, preserving the caller's order
//! and length in the response. A configured cache is consulted first and
//! primed afterward (best-effort).
//!
//! The loader's dedup state is per-instance and intentionally short-lived:
//! one resolution pass owns one loader, unless a caller shares an instance
//! to batch across passes. Within an instance, results are memoized and
//! concurrent `load` calls for the same key coalesce onto a single fetch:
//! the first caller leads, the rest wait on a [`Notify`].

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use keystone_cache::ReferenceCache;
use keystone_store::KeyStore;
use keystone_types::{EntityData, Key};

/// Counters accumulated over the lifetime of one loader instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Key slots requested across all `load` calls (duplicates included).
    pub requested: usize,
    /// Unique keys answered from this loader's memo.
    pub memo_hits: usize,
    /// Unique keys answered from the cache collaborator.
    pub cache_hits: usize,
    /// Batched calls issued to the underlying store.
    pub store_calls: usize,
    /// Keys carried by those store calls.
    pub keys_fetched: usize,
}

#[derive(Default)]
struct LoaderState {
    /// Settled results by identity; explicit absence is memoized too.
    resolved: HashMap<String, Option<EntityData>>,
    /// Identities whose fetch failed; sticky until the loader is dropped.
    failed: HashMap<String, String>,
    /// Identities currently being fetched by some `load` call.
    inflight: HashMap<String, Arc<Notify>>,
}

pub struct ReferenceLoader {
    store: Arc<dyn KeyStore>,
    cache: Option<Arc<dyn ReferenceCache>>,
    state: Mutex<LoaderState>,
    requested: AtomicUsize,
    memo_hits: AtomicUsize,
    cache_hits: AtomicUsize,
    store_calls: AtomicUsize,
    keys_fetched: AtomicUsize,
}

impl ReferenceLoader {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            cache: None,
            state: Mutex::new(LoaderState::default()),
            requested: AtomicUsize::new(0),
            memo_hits: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            store_calls: AtomicUsize::new(0),
            keys_fetched: AtomicUsize::new(0),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ReferenceCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            requested: self.requested.load(Ordering::Relaxed),
            memo_hits: self.memo_hits.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            store_calls: self.store_calls.load(Ordering::Relaxed),
            keys_fetched: self.keys_fetched.load(Ordering::Relaxed),
        }
    }

    /// Load entities for `keys`, one result slot per input key in input
    /// order; `None` where the referenced entity does not exist.
    pub async fn load(&self, keys: &[Key]) -> Result<Vec<Option<EntityData>>> {
        self.load_with_options(keys, true).await
    }

    /// As [`load`](Self::load); `use_cache = false` bypasses the cache
    /// collaborator for this call (both read and prime).
    pub async fn load_with_options(
        &self,
        keys: &[Key],
        use_cache: bool,
    ) -> Result<Vec<Option<EntityData>>> {
        self.requested.fetch_add(keys.len(), Ordering::Relaxed);

        let identities: Vec<String> = keys.iter().map(Key::identity).collect();

        // Dedup by identity, keeping first-seen order.
        let mut unique: Vec<(String, Key)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (identity, key) in identities.iter().zip(keys) {
            if seen.insert(identity.as_str()) {
                unique.push((identity.clone(), key.clone()));
            }
        }

        // Partition: already settled / in flight elsewhere / ours to fetch.
        let mut claimed: Vec<(String, Key)> = Vec::new();
        let mut waiting: Vec<(String, Arc<Notify>)> = Vec::new();
        {
            let mut state = self.state.lock().await;
            for (identity, key) in unique {
                if state.resolved.contains_key(&identity) || state.failed.contains_key(&identity) {
                    self.memo_hits.fetch_add(1, Ordering::Relaxed);
                } else if let Some(notify) = state.inflight.get(&identity) {
                    waiting.push((identity, notify.clone()));
                } else {
                    state
                        .inflight
                        .insert(identity.clone(), Arc::new(Notify::new()));
                    claimed.push((identity, key));
                }
            }
        }

        if !claimed.is_empty() {
            self.fetch_claimed(claimed, use_cache).await?;
        }

        // Wait for keys some concurrent load is already fetching.
        for (identity, notify) in waiting {
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            // The leader may have settled between our claim scan and here.
            if !self.is_settled(&identity).await {
                notified.await;
            }
        }

        // Expand settled results back out to the caller's order and length.
        let state = self.state.lock().await;
        let mut out = Vec::with_capacity(identities.len());
        for identity in &identities {
            if let Some(value) = state.resolved.get(identity) {
                out.push(value.clone());
            } else if let Some(message) = state.failed.get(identity) {
                return Err(anyhow!("reference fetch failed: {message}"));
            } else {
                return Err(anyhow!("reference fetch for {identity} never settled"));
            }
        }
        Ok(out)
    }

    /// Fetch the identities this call claimed, settle them, and wake
    /// followers. On error every claimed identity is marked failed first so
    /// followers reject instead of hanging.
    async fn fetch_claimed(&self, claimed: Vec<(String, Key)>, use_cache: bool) -> Result<()> {
        match self.read_through(&claimed, use_cache).await {
            Ok((settled, fresh)) => {
                {
                    let mut state = self.state.lock().await;
                    for (identity, value) in settled {
                        let notify = state.inflight.remove(&identity);
                        state.resolved.insert(identity, value);
                        if let Some(notify) = notify {
                            notify.notify_waiters();
                        }
                    }
                }
                if use_cache && !fresh.is_empty() {
                    if let Some(cache) = &self.cache {
                        if let Err(error) = cache.set_many(fresh).await {
                            warn!(error = %error, "failed to prime reference cache");
                        }
                    }
                }
                Ok(())
            }
            Err(error) => {
                let mut state = self.state.lock().await;
                let message = error.to_string();
                for (identity, _) in claimed {
                    let notify = state.inflight.remove(&identity);
                    state.failed.insert(identity, message.clone());
                    if let Some(notify) = notify {
                        notify.notify_waiters();
                    }
                }
                Err(error)
            }
        }
    }

    /// Cache-aside read: cache hits first, then at most one batched store
    /// call for the remainder. Returns all settled values plus the
    /// freshly-fetched subset for priming.
    #[allow(clippy::type_complexity)]
    async fn read_through(
        &self,
        claimed: &[(String, Key)],
        use_cache: bool,
    ) -> Result<(Vec<(String, Option<EntityData>)>, Vec<(String, EntityData)>)> {
        let mut settled: Vec<(String, Option<EntityData>)> = Vec::with_capacity(claimed.len());
        let mut remaining: Vec<&(String, Key)> = claimed.iter().collect();

        if use_cache {
            if let Some(cache) = &self.cache {
                let identities: Vec<String> =
                    remaining.iter().map(|(identity, _)| identity.clone()).collect();
                let cached = cache.get_many(&identities).await?;
                let mut missed = Vec::with_capacity(remaining.len());
                for (entry, hit) in remaining.into_iter().zip(cached) {
                    match hit {
                        Some(data) => {
                            self.cache_hits.fetch_add(1, Ordering::Relaxed);
                            settled.push((entry.0.clone(), Some(data)));
                        }
                        None => missed.push(entry),
                    }
                }
                remaining = missed;
            }
        }

        let mut fresh: Vec<(String, EntityData)> = Vec::new();
        if !remaining.is_empty() {
            let fetch_keys: Vec<Key> = remaining.iter().map(|(_, key)| key.clone()).collect();
            self.store_calls.fetch_add(1, Ordering::Relaxed);
            self.keys_fetched.fetch_add(fetch_keys.len(), Ordering::Relaxed);
            debug!(keys = fetch_keys.len(), "issuing batched reference fetch");

            let found = self.store.get(&fetch_keys).await?;
            // The store answers in arbitrary order; re-key by identity.
            let mut by_identity: HashMap<String, EntityData> = found
                .into_iter()
                .map(|entity| (entity.key.identity(), entity.data))
                .collect();
            for (identity, _) in remaining {
                match by_identity.remove(identity) {
                    Some(data) => {
                        fresh.push((identity.clone(), data.clone()));
                        settled.push((identity.clone(), Some(data)));
                    }
                    None => settled.push((identity.clone(), None)),
                }
            }
        }

        Ok((settled, fresh))
    }

    async fn is_settled(&self, identity: &str) -> bool {
        let state = self.state.lock().await;
        state.resolved.contains_key(identity) || state.failed.contains_key(identity)
    }
}
