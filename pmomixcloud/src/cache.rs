//! Système de cache en mémoire pour les données Mixcloud
//!
//! Chaque opération mémoïsée possède son [`CallCache`], indexé par les
//! arguments de l'appel. Une entrée est servie tant que :
//!
//! - son âge ne dépasse pas `ttl` ;
//! - le compteur de hits n'a pas atteint `max_hits`.
//!
//! Le compteur vaut 1 après chaque recalcul et augmente à chaque hit. Sa
//! portée dépend de [`HitScope`] : un compteur par clé (par défaut), ou un
//! compteur unique partagé par toutes les clés du cache.
//!
//! Seuls les résultats réussis sont conservés.

use crate::models::{ExploreCategory, Track};
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// Portée du compteur de hits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitScope {
    /// Un compteur par clé
    #[default]
    PerKey,
    /// Un compteur unique pour tout le cache : un hit sur une clé
    /// rapproche toutes les autres de leur recalcul
    Shared,
}

/// Politique d'expiration d'un cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// Nombre de hits avant recalcul forcé (`None` : TTL seul)
    pub max_hits: Option<u32>,
    pub scope: HitScope,
    pub capacity: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_hits: Some(8),
            scope: HitScope::PerKey,
            capacity: 1000,
        }
    }
}

#[derive(Clone)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
    hits: Arc<AtomicU32>,
}

/// Cache mémoïsant les résultats d'une opération
#[derive(Clone)]
pub struct CallCache<K, V> {
    name: &'static str,
    entries: MokaCache<K, Entry<V>>,
    shared_hits: Arc<AtomicU32>,
    policy: CachePolicy,
}

impl<K, V> CallCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: CachePolicy) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(policy.capacity)
            .time_to_live(policy.ttl)
            .build();

        Self {
            name,
            entries,
            shared_hits: Arc::new(AtomicU32::new(1)),
            policy,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    fn counter<'a>(&'a self, entry: &'a Entry<V>) -> &'a AtomicU32 {
        match self.policy.scope {
            HitScope::PerKey => &entry.hits,
            HitScope::Shared => &self.shared_hits,
        }
    }

    /// Retourne la valeur en cache si elle est encore valide (compte un hit)
    async fn lookup(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key).await?;
        let counter = self.counter(&entry);

        let expired = entry.stored_at.elapsed() > self.policy.ttl;
        let exhausted = self
            .policy
            .max_hits
            .is_some_and(|max| counter.load(Ordering::SeqCst) >= max);

        if expired || exhausted {
            trace!(cache = self.name, ?key, expired, exhausted, "Cache entry stale");
            counter.store(1, Ordering::SeqCst);
            return None;
        }

        counter.fetch_add(1, Ordering::SeqCst);
        trace!(cache = self.name, ?key, "Cache hit");
        Some(entry.value)
    }

    async fn store(&self, key: K, value: V) {
        let entry = Entry {
            value,
            stored_at: Instant::now(),
            hits: Arc::new(AtomicU32::new(1)),
        };
        self.entries.insert(key, entry).await;
    }

    /// Retourne la valeur en cache ou la calcule puis la stocke
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.lookup(&key).await {
            return value;
        }
        let value = compute().await;
        self.store(key, value.clone()).await;
        value
    }

    /// Variante faillible : les erreurs sont propagées et jamais stockées
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.lookup(&key).await {
            return Ok(value);
        }
        let value = compute().await?;
        self.store(key, value.clone()).await;
        Ok(value)
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.invalidate(key).await;
    }

    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
        self.shared_hits.store(1, Ordering::SeqCst);
    }

    /// Nombre d'entrées (après application des évictions en attente)
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

/// Caches des opérations mémoïsées du client
#[derive(Clone)]
pub struct MixcloudCache {
    /// Pistes par (id, streamable)
    pub tracks: CallCache<(String, bool), Track>,
    /// Pistes d'une playlist par id
    pub sets: CallCache<String, Vec<Track>>,
    /// Catégories explore
    pub explore: CallCache<(), Vec<ExploreCategory>>,
    /// Résultats des sondes de streaming par URL
    pub streams: CallCache<String, bool>,
}

impl MixcloudCache {
    pub fn new() -> Self {
        Self::with_policy(CachePolicy::default())
    }

    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            tracks: CallCache::new("tracks", policy.clone()),
            sets: CallCache::new("sets", policy.clone()),
            explore: CallCache::new("explore", policy.clone()),
            streams: CallCache::new("streams", policy),
        }
    }

    /// Vide tous les caches
    pub fn clear_all(&self) {
        self.tracks.invalidate_all();
        self.sets.invalidate_all();
        self.explore.invalidate_all();
        self.streams.invalidate_all();
    }

    /// Retourne des statistiques sur le cache
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            tracks_count: self.tracks.entry_count().await,
            sets_count: self.sets.entry_count().await,
            explore_count: self.explore.entry_count().await,
            streams_count: self.streams.entry_count().await,
        }
    }
}

impl Default for MixcloudCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistiques du cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub tracks_count: u64,
    pub sets_count: u64,
    pub explore_count: u64,
    pub streams_count: u64,
}

impl CacheStats {
    /// Retourne le nombre total d'entrées en cache
    pub fn total_count(&self) -> u64 {
        self.tracks_count + self.sets_count + self.explore_count + self.streams_count
    }
}
