//! # Thread Patches
//!
//! Pure reducers behind the optimistic updates. They never touch the cache:
//! they take the data of one entry and return a rewritten copy, or `None`
//! when the thread is not in it. Threads other than the target keep their
//! `Arc`, so consumers comparing by pointer see that nothing else changed.

use std::sync::Arc;

use bb_core::models::{BoardActivityPage, Post, Thread, ThreadView};
use uuid::Uuid;

/// Anticipated effect of a thread mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadPatch {
    /// Clear new-activity markers. With `activity_only` unset, every post and
    /// comment of the thread is marked as seen too.
    ActivityCleared { activity_only: bool },
    Muted(bool),
    Hidden(bool),
    DefaultView(ThreadView),
}

impl ThreadPatch {
    pub fn apply(&self, thread: &mut Thread) {
        match *self {
            ThreadPatch::ActivityCleared { activity_only } => {
                thread.is_new = false;
                thread.new_posts_amount = 0;
                thread.new_comments_amount = 0;
                if let Some(head) = thread.head_mut() {
                    head.is_new = false;
                    head.new_posts_amount = 0;
                    head.new_comments_amount = 0;
                }
                if !activity_only {
                    for post in &mut thread.posts {
                        post.is_new = false;
                        post.new_posts_amount = 0;
                        post.new_comments_amount = 0;
                        for comment in &mut post.comments {
                            comment.is_new = false;
                        }
                    }
                }
            }
            ThreadPatch::Muted(muted) => thread.muted = muted,
            ThreadPatch::Hidden(hidden) => thread.hidden = hidden,
            ThreadPatch::DefaultView(view) => thread.default_view = view,
        }
    }

    pub fn applied(&self, thread: &Thread) -> Thread {
        let mut patched = thread.clone();
        self.apply(&mut patched);
        patched
    }
}

/// One thread swapped by a patch: what was there and what replaced it.
#[derive(Debug, Clone)]
pub struct Replaced {
    pub previous: Arc<Thread>,
    pub installed: Arc<Thread>,
}

/// Rebuilds the pages, letting `swap` replace individual threads. Returns
/// `None` when `swap` replaced nothing.
pub fn swap_in_pages<F>(pages: &[BoardActivityPage], mut swap: F) -> Option<Vec<BoardActivityPage>>
where
    F: FnMut(&Arc<Thread>) -> Option<Arc<Thread>>,
{
    let mut changed = false;
    let rebuilt = pages
        .iter()
        .map(|page| BoardActivityPage {
            activity: page
                .activity
                .iter()
                .map(|thread| match swap(thread) {
                    Some(replacement) => {
                        changed = true;
                        replacement
                    }
                    None => Arc::clone(thread),
                })
                .collect(),
            next_page_cursor: page.next_page_cursor.clone(),
        })
        .collect();
    changed.then_some(rebuilt)
}

pub fn patch_pages(
    pages: &[BoardActivityPage],
    thread_id: Uuid,
    patch: ThreadPatch,
) -> Option<(Vec<BoardActivityPage>, Vec<Replaced>)> {
    let mut replaced = Vec::new();
    let pages = swap_in_pages(pages, |thread| {
        (thread.thread_id == thread_id).then(|| {
            let installed = Arc::new(patch.applied(thread));
            replaced.push(Replaced {
                previous: Arc::clone(thread),
                installed: Arc::clone(&installed),
            });
            installed
        })
    })?;
    Some((pages, replaced))
}

pub fn patch_thread_slot(
    slot: Option<&Arc<Thread>>,
    thread_id: Uuid,
    patch: ThreadPatch,
) -> Option<(Arc<Thread>, Replaced)> {
    let previous = slot.filter(|thread| thread.thread_id == thread_id)?;
    let installed = Arc::new(patch.applied(previous));
    Some((
        Arc::clone(&installed),
        Replaced {
            previous: Arc::clone(previous),
            installed,
        },
    ))
}

/// Puts back the previous threads, but only where the patched thread is
/// still the one installed; anything refetched since is left alone.
pub fn restore_pages(pages: &[BoardActivityPage], replaced: &[Replaced]) -> Option<Vec<BoardActivityPage>> {
    swap_in_pages(pages, |thread| restore_one(thread, replaced))
}

pub fn restore_thread_slot(slot: Option<&Arc<Thread>>, replaced: &[Replaced]) -> Option<Arc<Thread>> {
    slot.and_then(|thread| restore_one(thread, replaced))
}

fn restore_one(thread: &Arc<Thread>, replaced: &[Replaced]) -> Option<Arc<Thread>> {
    replaced
        .iter()
        .find(|swap| Arc::ptr_eq(&swap.installed, thread))
        .map(|swap| Arc::clone(&swap.previous))
}

/// The thread with `post` substituted for the post sharing its id.
pub fn with_post(thread: &Thread, post: &Post) -> Option<Thread> {
    let index = thread.posts.iter().position(|existing| existing.post_id == post.post_id)?;
    let mut updated = thread.clone();
    updated.posts[index] = post.clone();
    Some(updated)
}
