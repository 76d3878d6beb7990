//! # Query Cache
//!
//! Process-wide map from query key to the latest result for that key.
//!
//! Entries are immutable: every write builds a new [`CacheEntry`] and swaps
//! the `Arc` in one step, then broadcasts a [`CacheEvent`]. Readers holding an
//! older `Arc` keep a consistent (if outdated) view; subscribers detect
//! changes by key and version. Only the query layer and the mutation layer
//! write, which is why every writer here is `pub(crate)`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bb_core::models::{BoardActivityPage, BoardData, Thread};
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 256;

/// Name shared by every key of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryName {
    BoardActivity,
    Thread,
    AllBoards,
}

impl QueryName {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::BoardActivity => "boardActivityData",
            QueryName::Thread => "threadData",
            QueryName::AllBoards => "allBoardsData",
        }
    }

    /// How long entries of this query outlive their last observer.
    pub fn retention(&self) -> Retention {
        match self {
            // Thread data is never shown from a previous visit.
            QueryName::Thread => Retention::UntilUnobserved,
            QueryName::BoardActivity | QueryName::AllBoards => Retention::Indefinite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Indefinite,
    UntilUnobserved,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    BoardActivity { slug: String },
    Thread { thread_id: Uuid, logged_in: bool },
    AllBoards,
}

impl QueryKey {
    pub fn board_activity(slug: impl Into<String>) -> Self {
        QueryKey::BoardActivity { slug: slug.into() }
    }

    pub fn thread(thread_id: Uuid, logged_in: bool) -> Self {
        QueryKey::Thread {
            thread_id,
            logged_in,
        }
    }

    pub fn name(&self) -> QueryName {
        match self {
            QueryKey::BoardActivity { .. } => QueryName::BoardActivity,
            QueryKey::Thread { .. } => QueryName::Thread,
            QueryKey::AllBoards => QueryName::AllBoards,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::BoardActivity { slug } => write!(f, "{}{{slug={slug}}}", self.name().as_str()),
            QueryKey::Thread {
                thread_id,
                logged_in,
            } => write!(
                f,
                "{}{{threadId={thread_id}, isLoggedIn={logged_in}}}",
                self.name().as_str()
            ),
            QueryKey::AllBoards => f.write_str(self.name().as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    /// Pages in fetch order; each carries the cursor for the next one.
    BoardActivity(Vec<BoardActivityPage>),
    Thread(Option<Arc<Thread>>),
    AllBoards(Vec<BoardData>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: QueryData,
    /// When the data was last fetched from the server.
    pub updated_at: DateTime<Utc>,
    /// Set by invalidation; the next request for the key refetches.
    pub invalidated: bool,
    /// Bumped on every replacement, across all keys.
    pub version: u64,
}

impl CacheEntry {
    pub fn is_fresh(&self) -> bool {
        !self.invalidated
    }

    pub fn pages(&self) -> &[BoardActivityPage] {
        match &self.data {
            QueryData::BoardActivity(pages) => pages,
            _ => &[],
        }
    }

    pub fn thread(&self) -> Option<&Arc<Thread>> {
        match &self.data {
            QueryData::Thread(thread) => thread.as_ref(),
            _ => None,
        }
    }

    pub fn boards(&self) -> &[BoardData] {
        match &self.data {
            QueryData::AllBoards(boards) => boards,
            _ => &[],
        }
    }

    /// Threads of every page, in feed order.
    pub fn threads(&self) -> impl Iterator<Item = &Arc<Thread>> {
        self.pages().iter().flat_map(|page| page.activity.iter())
    }

    /// Cursor of the last fetched page.
    pub fn next_page_cursor(&self) -> Option<&str> {
        self.pages().last().and_then(|page| page.next_page_cursor.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Updated,
    Invalidated,
    Evicted,
    /// A fetch for the key finished, successfully or not.
    FetchSettled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
    pub version: u64,
}

pub struct QueryCache {
    entries: DashMap<QueryKey, Arc<CacheEntry>>,
    observers: DashMap<QueryKey, usize>,
    in_flight: DashSet<QueryKey>,
    events: broadcast::Sender<CacheEvent>,
    version: AtomicU64,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: DashMap::new(),
            observers: DashMap::new(),
            in_flight: DashSet::new(),
            events,
            version: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &QueryKey) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn keys(&self) -> Vec<QueryKey> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn keys_named(&self, name: QueryName) -> Vec<QueryKey> {
        self.entries
            .iter()
            .filter(|entry| entry.key().name() == name)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.in_flight.contains(key)
    }

    pub fn observer_count(&self, key: &QueryKey) -> usize {
        self.observers.get(key).map(|count| *count).unwrap_or(0)
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn emit(&self, key: QueryKey, kind: CacheEventKind, version: u64) {
        // No subscribers is fine.
        let _ = self.events.send(CacheEvent { key, kind, version });
    }

    /// Stores freshly fetched data, replacing whatever was there.
    pub(crate) fn put(&self, key: QueryKey, data: QueryData) -> Arc<CacheEntry> {
        self.insert(key, data, false)
    }

    /// Stores data that should be shown but refetched on the next request.
    pub(crate) fn put_stale(&self, key: QueryKey, data: QueryData) -> Arc<CacheEntry> {
        self.insert(key, data, true)
    }

    fn insert(&self, key: QueryKey, data: QueryData, invalidated: bool) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            data,
            updated_at: Utc::now(),
            invalidated,
            version: self.next_version(),
        });
        self.entries.insert(key.clone(), Arc::clone(&entry));
        debug!(%key, version = entry.version, "cache entry replaced");
        self.emit(key, CacheEventKind::Updated, entry.version);
        entry
    }

    /// Read-modify-write of one entry under its shard lock. `rewrite` returns
    /// `None` to leave the entry untouched.
    pub(crate) fn update<F>(&self, key: &QueryKey, rewrite: F) -> Option<Arc<CacheEntry>>
    where
        F: FnOnce(&CacheEntry) -> Option<QueryData>,
    {
        let replaced = {
            let mut slot = self.entries.get_mut(key)?;
            let current: &CacheEntry = slot.value();
            let data = rewrite(current)?;
            let entry = Arc::new(CacheEntry {
                data,
                updated_at: slot.updated_at,
                invalidated: slot.invalidated,
                version: self.next_version(),
            });
            *slot.value_mut() = Arc::clone(&entry);
            entry
        };
        debug!(%key, version = replaced.version, "cache entry rewritten");
        self.emit(key.clone(), CacheEventKind::Updated, replaced.version);
        Some(replaced)
    }

    /// Marks every entry of the query stale. Returns how many were marked.
    pub(crate) fn invalidate_named(&self, name: QueryName) -> usize {
        self.keys_named(name)
            .into_iter()
            .filter(|key| self.invalidate(key))
            .count()
    }

    pub(crate) fn invalidate(&self, key: &QueryKey) -> bool {
        let version = {
            let Some(mut slot) = self.entries.get_mut(key) else {
                return false;
            };
            let entry = Arc::new(CacheEntry {
                invalidated: true,
                version: self.next_version(),
                ..(**slot).clone()
            });
            let version = entry.version;
            *slot.value_mut() = entry;
            version
        };
        debug!(%key, "cache entry invalidated");
        self.emit(key.clone(), CacheEventKind::Invalidated, version);
        true
    }

    pub(crate) fn evict(&self, key: &QueryKey) -> bool {
        let Some((_, entry)) = self.entries.remove(key) else {
            return false;
        };
        debug!(%key, "cache entry evicted");
        self.emit(key.clone(), CacheEventKind::Evicted, entry.version);
        true
    }

    /// Claims the key for a fetch. `None` while another fetch holds it.
    pub(crate) fn begin_fetch(&self, key: &QueryKey) -> Option<FetchGuard<'_>> {
        self.in_flight.insert(key.clone()).then(|| FetchGuard {
            cache: self,
            key: key.clone(),
        })
    }

    /// Registers a consumer of the key until the returned guard is dropped.
    pub(crate) fn observe(self: &Arc<Self>, key: QueryKey) -> Observer {
        *self.observers.entry(key.clone()).or_insert(0) += 1;
        Observer {
            cache: Arc::clone(self),
            key,
        }
    }

    fn release(&self, key: &QueryKey) {
        if let Some(mut count) = self.observers.get_mut(key) {
            *count = count.saturating_sub(1);
        }
        let unobserved = self.observers.remove_if(key, |_, count| *count == 0).is_some();
        if unobserved && key.name().retention() == Retention::UntilUnobserved {
            self.evict(key);
        }
    }
}

/// Held for the duration of a fetch; releases the key on drop.
pub(crate) struct FetchGuard<'a> {
    cache: &'a QueryCache,
    key: QueryKey,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        self.cache.in_flight.remove(&self.key);
        let version = self.cache.version.load(Ordering::Relaxed);
        self.cache
            .emit(self.key.clone(), CacheEventKind::FetchSettled, version);
    }
}

/// A consumer of one cache key. Entries whose query has
/// [`Retention::UntilUnobserved`] are evicted when the last observer drops.
pub struct Observer {
    cache: Arc<QueryCache>,
    key: QueryKey,
}

impl Observer {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn entry(&self) -> Option<Arc<CacheEntry>> {
        self.cache.get(&self.key)
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        self.cache.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boards_data() -> QueryData {
        QueryData::AllBoards(vec![])
    }

    #[test]
    fn update_replaces_whole_entry() {
        let cache = QueryCache::new();
        let before = cache.put(QueryKey::AllBoards, boards_data());

        let after = cache
            .update(&QueryKey::AllBoards, |_| Some(boards_data()))
            .unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert!(after.version > before.version);
        assert!(Arc::ptr_eq(&cache.get(&QueryKey::AllBoards).unwrap(), &after));
    }

    #[test]
    fn update_declined_keeps_entry() {
        let cache = QueryCache::new();
        let before = cache.put(QueryKey::AllBoards, boards_data());

        assert!(cache.update(&QueryKey::AllBoards, |_| None).is_none());
        assert!(Arc::ptr_eq(&cache.get(&QueryKey::AllBoards).unwrap(), &before));
    }

    #[test]
    fn invalidation_marks_only_named_query() {
        let cache = QueryCache::new();
        cache.put(QueryKey::AllBoards, boards_data());
        cache.put(QueryKey::board_activity("gore"), QueryData::BoardActivity(vec![]));

        assert_eq!(cache.invalidate_named(QueryName::AllBoards), 1);

        assert!(!cache.get(&QueryKey::AllBoards).unwrap().is_fresh());
        assert!(cache.get(&QueryKey::board_activity("gore")).unwrap().is_fresh());
    }

    #[test]
    fn fetch_guard_is_exclusive_per_key() {
        let cache = QueryCache::new();
        let key = QueryKey::board_activity("gore");

        let guard = cache.begin_fetch(&key).unwrap();
        assert!(cache.is_fetching(&key));
        assert!(cache.begin_fetch(&key).is_none());
        assert!(cache.begin_fetch(&QueryKey::board_activity("anime")).is_some());

        drop(guard);
        assert!(!cache.is_fetching(&key));
    }

    #[test]
    fn thread_entries_are_evicted_with_last_observer() {
        let cache = Arc::new(QueryCache::new());
        let key = QueryKey::thread(Uuid::new_v4(), true);
        let first = cache.observe(key.clone());
        let second = cache.observe(key.clone());
        cache.put(key.clone(), QueryData::Thread(None));

        drop(first);
        assert!(cache.get(&key).is_some());
        assert_eq!(cache.observer_count(&key), 1);

        drop(second);
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.observer_count(&key), 0);
    }

    #[test]
    fn board_entries_survive_their_observers() {
        let cache = Arc::new(QueryCache::new());
        let key = QueryKey::board_activity("gore");
        let observer = cache.observe(key.clone());
        cache.put(key.clone(), QueryData::BoardActivity(vec![]));

        drop(observer);

        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn writes_are_broadcast() {
        let cache = QueryCache::new();
        let mut events = cache.subscribe();

        let entry = cache.put(QueryKey::AllBoards, boards_data());
        cache.invalidate(&QueryKey::AllBoards);
        cache.evict(&QueryKey::AllBoards);

        let kinds: Vec<_> = [
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
            events.recv().await.unwrap(),
        ]
        .into_iter()
        .map(|event| event.kind)
        .collect();
        assert_eq!(
            kinds,
            vec![
                CacheEventKind::Updated,
                CacheEventKind::Invalidated,
                CacheEventKind::Evicted
            ]
        );
        assert!(entry.version > 0);
    }
}
