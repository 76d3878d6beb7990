//! # Queries
//!
//! Reads through the cache. A fresh entry is served as is; a missing or
//! invalidated one is fetched through the [`ForumApi`] port, with at most one
//! fetch per key in flight. Callers arriving while a fetch is pending wait
//! for it instead of issuing their own.

use std::future::Future;
use std::sync::Arc;

use bb_core::{BoardData, ClientError, ForumApi, Result, SnapshotStore, Thread};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{CacheEntry, CacheEvent, CacheEventKind, Observer, QueryCache, QueryData, QueryKey, QueryName};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The last fetched page says there is nothing after it.
    NoCursor,
    /// A fetch for the same feed is still pending.
    InFlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageFetch {
    Fetched(Arc<CacheEntry>),
    Skipped(SkipReason),
    /// The feed was replaced while the page was loading; the page was dropped.
    Discarded,
}

/// A thread query held open by a consumer. The cached thread lives exactly
/// as long as some `MountedThread` for its key does.
pub struct MountedThread {
    observer: Option<Observer>,
}

impl MountedThread {
    pub fn key(&self) -> Option<&QueryKey> {
        self.observer.as_ref().map(Observer::key)
    }

    /// The thread as currently cached, including optimistic patches.
    pub fn thread(&self) -> Option<Arc<Thread>> {
        let entry = self.observer.as_ref()?.entry()?;
        entry.thread().cloned()
    }
}

#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn ForumApi>,
    cache: Arc<QueryCache>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    session: Session,
}

impl QueryClient {
    pub fn new(api: Arc<dyn ForumApi>, cache: Arc<QueryCache>, session: Session) -> Self {
        Self {
            api,
            cache,
            snapshots: None,
            session,
        }
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    // Board activity

    /// First page of the board feed, or every page fetched so far.
    pub async fn board_activity(&self, slug: &str) -> Result<Arc<CacheEntry>> {
        let key = QueryKey::board_activity(slug);
        self.cached_or_fetch(&key, move || async move {
            let page = self.api.board_activity(slug, None).await?;
            Ok::<_, ClientError>(QueryData::BoardActivity(vec![page]))
        })
        .await
    }

    pub async fn fetch_next_page(&self, slug: &str) -> Result<PageFetch> {
        let key = QueryKey::board_activity(slug);
        if self.cache.is_fetching(&key) {
            debug!(%key, "next page skipped: fetch in flight");
            return Ok(PageFetch::Skipped(SkipReason::InFlight));
        }
        let Some(cursor) = self.next_cursor(&key) else {
            debug!(%key, "next page skipped: no cursor");
            return Ok(PageFetch::Skipped(SkipReason::NoCursor));
        };
        let Some(_guard) = self.cache.begin_fetch(&key) else {
            return Ok(PageFetch::Skipped(SkipReason::InFlight));
        };

        debug!(%key, %cursor, "fetching next page");
        let page = self.api.board_activity(slug, Some(cursor.clone())).await?;
        let appended = self.cache.update(&key, move |current| {
            // Append only to the feed the cursor came from.
            (current.next_page_cursor() == Some(cursor.as_str())).then(|| {
                let mut pages = current.pages().to_vec();
                pages.push(page);
                QueryData::BoardActivity(pages)
            })
        });

        Ok(match appended {
            Some(entry) => PageFetch::Fetched(entry),
            None => {
                debug!(%key, "next page dropped: feed replaced meanwhile");
                PageFetch::Discarded
            }
        })
    }

    pub fn can_fetch_more(&self, slug: &str) -> bool {
        self.next_cursor(&QueryKey::board_activity(slug)).is_some()
    }

    pub fn is_fetching_more(&self, slug: &str) -> bool {
        self.cache.is_fetching(&QueryKey::board_activity(slug))
    }

    fn next_cursor(&self, key: &QueryKey) -> Option<String> {
        self.cache
            .get(key)
            .and_then(|entry| entry.next_page_cursor().map(str::to_owned))
    }

    // Threads

    /// Opens the thread query. `None` yields an empty mount and no request.
    pub async fn mount_thread(&self, thread_id: Option<Uuid>) -> Result<MountedThread> {
        let Some(thread_id) = thread_id else {
            return Ok(MountedThread { observer: None });
        };
        let key = QueryKey::thread(thread_id, self.session.is_logged_in());
        let observer = self.cache.observe(key.clone());
        self.cached_or_fetch(&key, move || async move {
            let thread = self.api.thread(thread_id).await?;
            Ok::<_, ClientError>(QueryData::Thread(Some(Arc::new(thread))))
        })
        .await?;
        Ok(MountedThread {
            observer: Some(observer),
        })
    }

    /// What to show while the thread loads: the cached thread, else its
    /// summary from the board feed.
    pub fn thread_placeholder(&self, thread_id: Uuid, board_slug: Option<&str>) -> Option<Arc<Thread>> {
        let cached = self
            .cache
            .keys_named(QueryName::Thread)
            .into_iter()
            .filter(|key| matches!(key, QueryKey::Thread { thread_id: id, .. } if *id == thread_id))
            .find_map(|key| self.cache.get(&key)?.thread().cloned());
        if cached.is_some() {
            return cached;
        }

        let feed = self.cache.get(&QueryKey::board_activity(board_slug?))?;
        let thread = feed.pages().iter().find_map(|page| page.find(thread_id))?;
        Some(Arc::new(thread.summary()))
    }

    // Boards

    pub async fn all_boards(&self) -> Result<Arc<CacheEntry>> {
        self.cached_or_fetch(&QueryKey::AllBoards, move || async move {
            let boards = self.api.all_boards().await?;
            self.save_snapshot(&boards).await;
            Ok::<_, ClientError>(QueryData::AllBoards(boards))
        })
        .await
    }

    /// Shows the last saved board list until the first fetch answers.
    pub async fn seed_all_boards(&self) -> Result<Option<Arc<CacheEntry>>> {
        if self.cache.get(&QueryKey::AllBoards).is_some() {
            return Ok(None);
        }
        let Some(store) = &self.snapshots else {
            return Ok(None);
        };
        let Some(mut boards) = store.load_boards().await? else {
            return Ok(None);
        };
        // Updates are only known after a fetch.
        for board in &mut boards {
            board.has_updates = false;
        }
        info!(count = boards.len(), "board list seeded from snapshot");
        Ok(Some(self.cache.put_stale(QueryKey::AllBoards, QueryData::AllBoards(boards))))
    }

    async fn save_snapshot(&self, boards: &[BoardData]) {
        let Some(store) = &self.snapshots else {
            return;
        };
        if let Err(err) = store.save_boards(boards).await {
            warn!(error = %err, "failed to save board list snapshot");
        }
    }

    pub fn invalidate(&self, name: QueryName) -> usize {
        self.cache.invalidate_named(name)
    }

    async fn cached_or_fetch<F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<Arc<CacheEntry>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<QueryData>>,
    {
        loop {
            if let Some(entry) = self.cache.get(key).filter(|entry| entry.is_fresh()) {
                return Ok(entry);
            }
            // Subscribe before claiming so the settle event cannot be missed.
            let mut events = self.cache.subscribe();
            if let Some(_guard) = self.cache.begin_fetch(key) {
                debug!(%key, "fetching");
                let data = fetch().await?;
                return Ok(self.cache.put(key.clone(), data));
            }
            wait_for_fetch(&self.cache, &mut events, key).await;
        }
    }
}

async fn wait_for_fetch(cache: &QueryCache, events: &mut broadcast::Receiver<CacheEvent>, key: &QueryKey) {
    while cache.is_fetching(key) {
        match events.recv().await {
            Ok(event) if event.key == *key && event.kind == CacheEventKind::FetchSettled => return,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return,
        }
    }
}
