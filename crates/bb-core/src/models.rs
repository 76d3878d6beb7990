//! # Client Models
//!
//! Normalized entities built from server records by [`crate::mapper`].
//! Everything downstream of the mapper (cache, optimistic patches,
//! presentation) works on these types only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name shown for a user identity the server sent without a name.
pub const DEFAULT_USER_NAME: &str = "You";
/// Avatar shown for a user identity the server sent without an avatar.
pub const DEFAULT_USER_AVATAR: &str = "/bobatan.png";

/// A display identity: either the pseudonymous secret identity or the
/// account's user identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub avatar: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, avatar: Option<String>) -> Self {
        Self {
            name: name.into(),
            avatar,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    pub whisper_tags: Vec<String>,
    pub index_tags: Vec<String>,
    pub category_tags: Vec<String>,
    pub content_warnings: Vec<String>,
}

impl Tags {
    pub fn is_empty(&self) -> bool {
        self.whisper_tags.is_empty()
            && self.index_tags.is_empty()
            && self.category_tags.is_empty()
            && self.content_warnings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOptions {
    /// Render the post with the wide layout.
    pub wide: bool,
}

/// The layout a thread opens with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadView {
    #[default]
    Thread,
    Gallery,
    Timeline,
}

impl ThreadView {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadView::Thread => "thread",
            ThreadView::Gallery => "gallery",
            ThreadView::Timeline => "timeline",
        }
    }
}

impl std::fmt::Display for ThreadView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThreadView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thread" => Ok(ThreadView::Thread),
            "gallery" => Ok(ThreadView::Gallery),
            "timeline" => Ok(ThreadView::Timeline),
            other => Err(format!("unknown thread view: {other}")),
        }
    }
}

/// A reply attached to a post, optionally chained to another comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub comment_id: Uuid,
    pub chain_parent_id: Option<Uuid>,
    pub parent_comment_id: Option<Uuid>,
    pub parent_post_id: Uuid,
    pub secret_identity: Identity,
    /// Present only when the comment is not anonymous or the viewer owns it.
    pub user_identity: Option<Identity>,
    pub accessory: Option<String>,
    pub created: DateTime<Utc>,
    pub content: String,
    pub is_new: bool,
    pub is_own: bool,
}

/// A contribution to a thread. The first post of a thread is its head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: Uuid,
    pub thread_id: Uuid,
    /// `None` for the head post, otherwise the post this one replies to.
    pub parent_post_id: Option<Uuid>,
    pub secret_identity: Identity,
    pub user_identity: Option<Identity>,
    pub accessory: Option<String>,
    pub created: DateTime<Utc>,
    pub content: String,
    pub options: PostOptions,
    pub tags: Tags,
    pub comments: Vec<Comment>,
    pub posts_amount: u32,
    pub threads_amount: u32,
    pub comments_amount: u32,
    pub new_posts_amount: u32,
    pub new_comments_amount: u32,
    pub is_new: bool,
    pub is_own: bool,
}

/// A head post plus its replies, tracked as a unit for read state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: Uuid,
    pub board_slug: String,
    pub posts: Vec<Post>,
    pub is_new: bool,
    pub new_posts_amount: u32,
    pub new_comments_amount: u32,
    pub total_comments_amount: u32,
    pub total_posts_amount: u32,
    pub direct_threads_amount: u32,
    pub last_activity: Option<DateTime<Utc>>,
    pub muted: bool,
    pub hidden: bool,
    pub default_view: ThreadView,
    /// Secret identity the viewer posts with in this thread, if they have posted.
    pub personal_identity: Option<Identity>,
}

impl Thread {
    pub fn head(&self) -> Option<&Post> {
        self.posts.first()
    }

    pub fn head_mut(&mut self) -> Option<&mut Post> {
        self.posts.first_mut()
    }

    /// Whether anything beyond the head post was contributed.
    pub fn has_replies(&self) -> bool {
        self.total_posts_amount > 1 || self.total_comments_amount > 0
    }

    /// Summary view of this thread: same counters, head post only.
    pub fn summary(&self) -> Thread {
        Thread {
            posts: self.posts.iter().take(1).cloned().collect(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingIdentity {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
}

/// A section of a board's sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardDescription {
    Text {
        id: Option<String>,
        index: i64,
        title: String,
        description: String,
    },
    CategoryFilter {
        id: Option<String>,
        index: i64,
        title: String,
        categories: Vec<String>,
    },
}

impl BoardDescription {
    pub fn index(&self) -> i64 {
        match self {
            BoardDescription::Text { index, .. } | BoardDescription::CategoryFilter { index, .. } => {
                *index
            }
        }
    }

    pub fn title(&self) -> &str {
        match self {
            BoardDescription::Text { title, .. } | BoardDescription::CategoryFilter { title, .. } => {
                title
            }
        }
    }
}

/// Summary of a board as shown in board listings and sidebars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    /// Unique key of the board (e.g. "gore" for !gore)
    pub slug: String,
    pub avatar_url: String,
    pub tagline: String,
    pub accent_color: Option<String>,
    pub logged_in_only: bool,
    pub delisted: bool,
    pub muted: bool,
    pub has_updates: bool,
    /// Latest of the last post and last comment on the board.
    pub last_update: Option<DateTime<Utc>>,
    pub last_update_from_others: Option<DateTime<Utc>>,
    pub last_visit: Option<DateTime<Utc>>,
    pub descriptions: Vec<BoardDescription>,
    pub pinned_order: Option<i64>,
    pub posting_identities: Vec<PostingIdentity>,
    pub permissions: Vec<String>,
}

/// One page of a board's activity feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardActivityPage {
    /// Threads are shared so that patching one thread leaves the others untouched.
    pub activity: Vec<Arc<Thread>>,
    /// Cursor for the following page; `None` once the feed is exhausted.
    pub next_page_cursor: Option<String>,
}

impl BoardActivityPage {
    pub fn find(&self, thread_id: Uuid) -> Option<&Arc<Thread>> {
        self.activity.iter().find(|thread| thread.thread_id == thread_id)
    }
}
