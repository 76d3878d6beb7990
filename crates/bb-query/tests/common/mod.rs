#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bb_core::mapper::{map_board, map_thread};
use bb_core::records::{BoardRecord, ThreadRecord};
use bb_core::{
    BoardActivityPage, BoardData, ClientError, ForumApi, Notifier, Post, Result, SnapshotStore, Tags, Thread,
    ThreadView,
};
use bb_query::{CurrentUser, QueryCache, QueryClient, Session, ThreadMutations};
use serde_json::json;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BoardActivity { slug: String, cursor: Option<String> },
    Thread(Uuid),
    AllBoards,
    MarkRead(Uuid),
    Mute(Uuid, bool),
    Hide(Uuid, bool),
    View(Uuid, ThreadView),
    EditTags(Uuid),
    VisitBoard(String),
}

/// In-memory backend. While gated, every request waits for a permit from
/// [`FakeForumApi::release`], so tests can look at the cache mid-flight.
pub struct FakeForumApi {
    pages: Mutex<HashMap<(String, Option<String>), BoardActivityPage>>,
    threads: Mutex<HashMap<Uuid, Thread>>,
    boards: Mutex<Vec<BoardData>>,
    calls: Mutex<Vec<Call>>,
    failing: AtomicBool,
    gated: AtomicBool,
    gate: Semaphore,
}

impl Default for FakeForumApi {
    fn default() -> Self {
        Self {
            pages: Mutex::default(),
            threads: Mutex::default(),
            boards: Mutex::default(),
            calls: Mutex::default(),
            failing: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }
}

impl FakeForumApi {
    pub fn with_page(self, slug: &str, cursor: Option<&str>, page: BoardActivityPage) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((slug.to_string(), cursor.map(str::to_owned)), page);
        self
    }

    pub fn with_thread(self, thread: Thread) -> Self {
        self.threads.lock().unwrap().insert(thread.thread_id, thread);
        self
    }

    pub fn with_boards(self, boards: Vec<BoardData>) -> Self {
        *self.boards.lock().unwrap() = boards;
        self
    }

    /// Every mutation fails with a 500 from now on.
    pub fn fail_mutations(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn close_gate(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn release(&self, requests: usize) {
        self.gate.add_permits(requests);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|call| matches(call)).count()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
        if self.gated.load(Ordering::SeqCst) {
            self.gate.acquire().await.expect("gate open").forget();
        }
    }

    async fn mutate(&self, call: Call) -> Result<()> {
        self.record(call).await;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClientError::Http {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ForumApi for FakeForumApi {
    async fn board_activity(&self, slug: &str, cursor: Option<String>) -> Result<BoardActivityPage> {
        self.record(Call::BoardActivity {
            slug: slug.to_string(),
            cursor: cursor.clone(),
        })
        .await;
        self.pages
            .lock()
            .unwrap()
            .get(&(slug.to_string(), cursor))
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Board".into(), slug.to_string()))
    }

    async fn thread(&self, thread_id: Uuid) -> Result<Thread> {
        self.record(Call::Thread(thread_id)).await;
        self.threads
            .lock()
            .unwrap()
            .get(&thread_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Thread".into(), thread_id.to_string()))
    }

    async fn all_boards(&self) -> Result<Vec<BoardData>> {
        self.record(Call::AllBoards).await;
        Ok(self.boards.lock().unwrap().clone())
    }

    async fn mark_thread_read(&self, thread_id: Uuid) -> Result<()> {
        self.mutate(Call::MarkRead(thread_id)).await
    }

    async fn mute_thread(&self, thread_id: Uuid, mute: bool) -> Result<()> {
        self.mutate(Call::Mute(thread_id, mute)).await
    }

    async fn hide_thread(&self, thread_id: Uuid, hide: bool) -> Result<()> {
        self.mutate(Call::Hide(thread_id, hide)).await
    }

    async fn update_thread_view(&self, thread_id: Uuid, view: ThreadView) -> Result<()> {
        self.mutate(Call::View(thread_id, view)).await
    }

    async fn edit_post_tags(&self, post_id: Uuid, tags: Tags) -> Result<Post> {
        self.mutate(Call::EditTags(post_id)).await?;
        let threads = self.threads.lock().unwrap();
        let mut post = threads
            .values()
            .flat_map(|thread| thread.posts.iter())
            .find(|post| post.post_id == post_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Post".into(), post_id.to_string()))?;
        post.tags = tags;
        Ok(post)
    }

    async fn visit_board(&self, slug: &str) -> Result<()> {
        self.mutate(Call::VisitBoard(slug.to_string())).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success(String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.toasts.lock().unwrap().push(Toast::Success(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.toasts.lock().unwrap().push(Toast::Error(message.to_string()));
    }
}

#[derive(Default)]
pub struct MemorySnapshots {
    pub saved: Mutex<Option<Vec<BoardData>>>,
}

#[async_trait]
impl SnapshotStore for MemorySnapshots {
    async fn load_boards(&self) -> Result<Option<Vec<BoardData>>> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save_boards(&self, boards: &[BoardData]) -> Result<()> {
        *self.saved.lock().unwrap() = Some(boards.to_vec());
        Ok(())
    }
}

pub struct Harness {
    pub api: Arc<FakeForumApi>,
    pub cache: Arc<QueryCache>,
    pub session: Session,
    pub notifier: Arc<RecordingNotifier>,
    pub queries: QueryClient,
    pub mutations: ThreadMutations,
}

impl Harness {
    pub fn logged_in(api: FakeForumApi) -> Self {
        Self::build(
            api,
            Session::logged_in(CurrentUser {
                username: "bobatan".into(),
                avatar_url: Some("/bobatan.png".into()),
            }),
        )
    }

    pub fn logged_out(api: FakeForumApi) -> Self {
        Self::build(api, Session::logged_out())
    }

    fn build(api: FakeForumApi, session: Session) -> Self {
        let api = Arc::new(api);
        let cache = Arc::new(QueryCache::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let queries = QueryClient::new(api.clone(), cache.clone(), session.clone());
        let mutations = ThreadMutations::new(api.clone(), cache.clone(), session.clone(), notifier.clone());
        Self {
            api,
            cache,
            session,
            notifier,
            queries,
            mutations,
        }
    }

    pub fn with_rollback(mut self) -> Self {
        self.mutations = self.mutations.with_rollback(true);
        self
    }

    /// The thread as the cached feed of `slug` currently holds it.
    pub fn feed_thread(&self, slug: &str, thread_id: Uuid) -> Arc<Thread> {
        let entry = self
            .cache
            .get(&bb_query::QueryKey::board_activity(slug))
            .expect("feed cached");
        let thread = entry.pages().iter().find_map(|page| page.find(thread_id)).cloned();
        thread.expect("thread in feed")
    }
}

pub fn thread(board_slug: &str, thread_id: Uuid, new_comments: u32) -> Thread {
    let post = |post_id: Uuid, parent: Option<Uuid>| {
        json!({
            "post_id": post_id,
            "parent_thread_id": thread_id,
            "parent_post_id": parent,
            "secret_identity": { "name": "Outdated Meme", "avatar": "/outdated-meme.png" },
            "user_identity": null,
            "created": "2020-04-30T03:23:00",
            "content": "[{\"insert\":\"Remember to be excellent to each other and only be mean to fictional characters!\"}]",
            "options": {},
            "tags": {
                "whisper_tags": ["An order of samosas"],
                "index_tags": [],
                "category_tags": ["blood"],
                "content_warnings": []
            },
            "comments": [{
                "comment_id": Uuid::new_v4(),
                "chain_parent_id": null,
                "parent_comment": null,
                "secret_identity": { "name": "Tuxedo Mask", "avatar": "/tuxedo-mask.jpg" },
                "created": "2020-05-01T05:42:00Z",
                "content": "[{\"insert\":\"BIG FAN\"}]",
                "is_new": true,
                "is_own": false
            }],
            "posts_amount": 2,
            "threads_amount": 1,
            "comments_amount": 1,
            "new_posts_amount": 1,
            "new_comments_amount": new_comments,
            "is_new": true,
            "self": false
        })
    };
    let head_id = Uuid::new_v4();
    let record: ThreadRecord = serde_json::from_value(json!({
        "thread_id": thread_id,
        "board_slug": board_slug,
        "posts": [post(head_id, None), post(Uuid::new_v4(), Some(head_id))],
        "thread_new_posts_amount": 2,
        "thread_new_comments_amount": new_comments,
        "thread_total_comments_amount": 2,
        "thread_total_posts_amount": 2,
        "thread_direct_threads_amount": 1,
        "thread_last_activity": "2020-05-03T09:47:00.000Z",
        "muted": false,
        "hidden": false,
        "default_view": "thread"
    }))
    .expect("valid thread record");
    map_thread(record).expect("mappable thread")
}

pub fn page(threads: Vec<Thread>, cursor: Option<&str>) -> BoardActivityPage {
    BoardActivityPage {
        activity: threads.into_iter().map(Arc::new).collect(),
        next_page_cursor: cursor.map(str::to_owned),
    }
}

pub fn board(slug: &str, has_updates: bool) -> BoardData {
    let record: BoardRecord = serde_json::from_value(json!({
        "slug": slug,
        "avatarUrl": format!("/{slug}.png"),
        "tagline": "Blood! Blood! Blood!",
        "settings": { "accentColor": "#f96680" },
        "loggedInOnly": false,
        "delisted": false,
        "descriptions": [],
        "has_updates": has_updates,
        "muted": false,
        "postingIdentities": [],
        "permissions": []
    }))
    .expect("valid board record");
    map_board(record).expect("mappable board")
}
