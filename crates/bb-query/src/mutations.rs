//! # Thread Mutations
//!
//! Every thread mutation runs in two steps:
//! 1. the anticipated result is written to every cached entry holding the
//!    thread, synchronously, before the call returns;
//! 2. the request is spawned on the runtime and a [`MutationHandle`] is
//!    handed back.
//!
//! A failed request raises an error toast. The optimistic state stays in
//! place unless the mutations were built with rollback enabled.

use std::sync::Arc;

use bb_core::{ClientError, ForumApi, Notifier, Post, Result, Tags, ThreadView};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::cache::{QueryCache, QueryData, QueryKey, QueryName};
use crate::patch::{self, Replaced, ThreadPatch};
use crate::session::Session;

const VIEW_UPDATED: &str = "Thread view updated!";

/// The thread to act on and the board whose feed lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTarget {
    pub thread_id: Uuid,
    pub board_slug: String,
}

impl ThreadTarget {
    pub fn new(thread_id: Uuid, board_slug: impl Into<String>) -> Self {
        Self {
            thread_id,
            board_slug: board_slug.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Only clear the thread's activity counters, leaving posts and
    /// comments marked as new.
    pub activity_only: bool,
}

/// The pending network half of a mutation.
#[derive(Debug)]
pub struct MutationHandle<T = ()> {
    task: JoinHandle<Result<T>>,
}

impl<T> MutationHandle<T> {
    /// Waits for the request and its follow-up (toast, invalidation,
    /// rollback) to complete.
    pub async fn settled(self) -> Result<T> {
        self.task
            .await
            .map_err(|err| ClientError::Internal(format!("mutation task failed: {err}")))?
    }
}

#[derive(Debug, Clone, Copy)]
enum ThreadIntent {
    Read(ReadOptions),
    Mute(bool),
    Hide(bool),
    View(ThreadView),
}

impl ThreadIntent {
    fn patch(&self) -> ThreadPatch {
        match *self {
            ThreadIntent::Read(options) => ThreadPatch::ActivityCleared {
                activity_only: options.activity_only,
            },
            ThreadIntent::Mute(mute) => ThreadPatch::Muted(mute),
            ThreadIntent::Hide(hide) => ThreadPatch::Hidden(hide),
            ThreadIntent::View(view) => ThreadPatch::DefaultView(view),
        }
    }

    fn describe(&self) -> String {
        match self {
            ThreadIntent::Read(_) => "visited".to_string(),
            ThreadIntent::Mute(true) => "muted".to_string(),
            ThreadIntent::Mute(false) => "unmuted".to_string(),
            ThreadIntent::Hide(true) => "hidden".to_string(),
            ThreadIntent::Hide(false) => "visible".to_string(),
            ThreadIntent::View(view) => format!("switched to default view {view}"),
        }
    }

    fn failure_message(&self, thread_id: Uuid) -> String {
        match self {
            ThreadIntent::View(view) => {
                format!("Error while switching thread {thread_id} to default view {view}.")
            }
            other => format!("Error while marking thread as {}", other.describe()),
        }
    }

    /// Mute and hide state show up in the board list's update flags.
    fn invalidates_board_summary(&self) -> bool {
        matches!(self, ThreadIntent::Mute(_) | ThreadIntent::Hide(_))
    }

    async fn send(self, api: &dyn ForumApi, thread_id: Uuid) -> Result<()> {
        match self {
            ThreadIntent::Read(_) => api.mark_thread_read(thread_id).await,
            ThreadIntent::Mute(mute) => api.mute_thread(thread_id, mute).await,
            ThreadIntent::Hide(hide) => api.hide_thread(thread_id, hide).await,
            ThreadIntent::View(view) => api.update_thread_view(thread_id, view).await,
        }
    }
}

/// Threads swapped in one cache entry by an optimistic patch.
struct AppliedPatch {
    key: QueryKey,
    replaced: Vec<Replaced>,
}

#[derive(Clone)]
pub struct ThreadMutations {
    api: Arc<dyn ForumApi>,
    cache: Arc<QueryCache>,
    session: Session,
    notifier: Arc<dyn Notifier>,
    rollback_on_failure: bool,
}

impl ThreadMutations {
    pub fn new(
        api: Arc<dyn ForumApi>,
        cache: Arc<QueryCache>,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            cache,
            session,
            notifier,
            rollback_on_failure: false,
        }
    }

    /// Restore the pre-patch threads when a request fails.
    pub fn with_rollback(mut self, enabled: bool) -> Self {
        self.rollback_on_failure = enabled;
        self
    }

    /// Marks the thread as read. Requires a logged-in user.
    pub fn read_thread(&self, target: ThreadTarget, options: ReadOptions) -> Result<MutationHandle> {
        let intent = ThreadIntent::Read(options);
        if !self.session.is_logged_in() {
            let err = ClientError::Unauthorized("Attempt to read thread with no user logged in.".into());
            error!(thread_id = %target.thread_id, error = %err, "thread read rejected");
            self.notifier.error(&intent.failure_message(target.thread_id));
            return Err(err);
        }
        Ok(self.run(target, intent))
    }

    pub fn mute_thread(&self, target: ThreadTarget, mute: bool) -> MutationHandle {
        self.run(target, ThreadIntent::Mute(mute))
    }

    pub fn hide_thread(&self, target: ThreadTarget, hide: bool) -> MutationHandle {
        self.run(target, ThreadIntent::Hide(hide))
    }

    pub fn set_thread_view(&self, target: ThreadTarget, view: ThreadView) -> MutationHandle {
        self.run(target, ThreadIntent::View(view))
    }

    fn run(&self, target: ThreadTarget, intent: ThreadIntent) -> MutationHandle {
        debug!(
            thread_id = %target.thread_id,
            board = %target.board_slug,
            "optimistically marking thread as {}",
            intent.describe()
        );
        let applied = self.apply_patch(&target, intent.patch());
        if let ThreadIntent::View(_) = intent {
            self.notifier.success(VIEW_UPDATED);
        }

        let this = self.clone();
        let task = tokio::spawn(async move {
            match intent.send(this.api.as_ref(), target.thread_id).await {
                Ok(()) => {
                    info!(thread_id = %target.thread_id, "thread {}", intent.describe());
                    if intent.invalidates_board_summary() {
                        this.cache.invalidate_named(QueryName::AllBoards);
                    }
                    Ok(())
                }
                Err(err) => {
                    warn!(thread_id = %target.thread_id, error = %err, "thread mutation failed");
                    this.notifier.error(&intent.failure_message(target.thread_id));
                    if this.rollback_on_failure {
                        this.roll_back(&applied);
                    }
                    Err(err)
                }
            }
        });
        MutationHandle { task }
    }

    /// Patches the board feed and every cached copy of the thread.
    fn apply_patch(&self, target: &ThreadTarget, thread_patch: ThreadPatch) -> Vec<AppliedPatch> {
        let mut applied = Vec::new();

        let feed_key = QueryKey::board_activity(target.board_slug.as_str());
        let mut swapped = Vec::new();
        let patched = self.cache.update(&feed_key, |entry| {
            let (pages, replaced) = patch::patch_pages(entry.pages(), target.thread_id, thread_patch)?;
            swapped = replaced;
            Some(QueryData::BoardActivity(pages))
        });
        if patched.is_some() {
            applied.push(AppliedPatch {
                key: feed_key,
                replaced: swapped,
            });
        }

        let thread_keys = self
            .cache
            .keys_named(QueryName::Thread)
            .into_iter()
            .filter(|key| matches!(key, QueryKey::Thread { thread_id, .. } if *thread_id == target.thread_id));
        for key in thread_keys {
            let mut swapped = None;
            self.cache.update(&key, |entry| {
                let (thread, replaced) = patch::patch_thread_slot(entry.thread(), target.thread_id, thread_patch)?;
                swapped = Some(replaced);
                Some(QueryData::Thread(Some(thread)))
            });
            if let Some(replaced) = swapped {
                applied.push(AppliedPatch {
                    key,
                    replaced: vec![replaced],
                });
            }
        }

        if applied.is_empty() {
            error!(
                thread_id = %target.thread_id,
                board = %target.board_slug,
                "thread not found in cache, skipping optimistic update"
            );
        }
        applied
    }

    fn roll_back(&self, applied: &[AppliedPatch]) {
        for AppliedPatch { key, replaced } in applied {
            let restored = self.cache.update(key, |entry| match &entry.data {
                QueryData::BoardActivity(pages) => {
                    patch::restore_pages(pages, replaced).map(QueryData::BoardActivity)
                }
                QueryData::Thread(slot) => patch::restore_thread_slot(slot.as_ref(), replaced)
                    .map(|thread| QueryData::Thread(Some(thread))),
                QueryData::AllBoards(_) => None,
            });
            debug!(%key, restored = restored.is_some(), "optimistic update rolled back");
        }
    }

    /// Replaces the post's tags on the server. Cached copies of the post are
    /// only updated once the server returns the edited post.
    pub fn edit_post_tags(&self, post_id: Uuid, tags: Tags) -> MutationHandle<Post> {
        let this = self.clone();
        let task = tokio::spawn(async move {
            match this.api.edit_post_tags(post_id, tags).await {
                Ok(post) => {
                    info!(%post_id, "post tags updated");
                    this.replace_post(&post);
                    Ok(post)
                }
                Err(err) => {
                    warn!(%post_id, error = %err, "post tags update failed");
                    this.notifier.error("Error while updating post tags");
                    Err(err)
                }
            }
        });
        MutationHandle { task }
    }

    fn replace_post(&self, post: &Post) {
        for key in self.cache.keys() {
            self.cache.update(&key, |entry| match &entry.data {
                QueryData::BoardActivity(pages) => patch::swap_in_pages(pages, |thread| {
                    patch::with_post(thread, post).map(Arc::new)
                })
                .map(QueryData::BoardActivity),
                QueryData::Thread(Some(thread)) => {
                    patch::with_post(thread, post).map(|thread| QueryData::Thread(Some(Arc::new(thread))))
                }
                QueryData::Thread(None) | QueryData::AllBoards(_) => None,
            });
        }
    }

    /// Records a board visit for the logged-in user. `None` when logged out.
    pub fn visit_board(&self, slug: &str) -> Option<MutationHandle> {
        if !self.session.is_logged_in() {
            return None;
        }
        let api = Arc::clone(&self.api);
        let slug = slug.to_owned();
        let task = tokio::spawn(async move {
            api.visit_board(&slug).await.inspect_err(|err| {
                warn!(board = %slug, error = %err, "board visit failed");
            })
        });
        Some(MutationHandle { task })
    }
}
