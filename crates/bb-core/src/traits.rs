//! # Core Traits (Ports)
//!
//! Any adapter must implement these traits to be used by the query layer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{BoardActivityPage, BoardData, Post, Tags, Thread, ThreadView};

/// The backend HTTP API, seen from the client.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ForumApi: Send + Sync {
    // Reads
    async fn board_activity(&self, slug: &str, cursor: Option<String>) -> Result<BoardActivityPage>;
    async fn thread(&self, thread_id: Uuid) -> Result<Thread>;
    async fn all_boards(&self) -> Result<Vec<BoardData>>;

    // Thread state
    async fn mark_thread_read(&self, thread_id: Uuid) -> Result<()>;
    async fn mute_thread(&self, thread_id: Uuid, mute: bool) -> Result<()>;
    async fn hide_thread(&self, thread_id: Uuid, hide: bool) -> Result<()>;
    async fn update_thread_view(&self, thread_id: Uuid, view: ThreadView) -> Result<()>;

    // Posts and boards
    async fn edit_post_tags(&self, post_id: Uuid, tags: Tags) -> Result<Post>;
    async fn visit_board(&self, slug: &str) -> Result<()>;
}

/// Local persistence for the all-boards summary, used to paint the board
/// list before the network answers.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Returns `None` when nothing usable was saved.
    async fn load_boards(&self) -> Result<Option<Vec<BoardData>>>;
    async fn save_boards(&self, boards: &[BoardData]) -> Result<()>;
}

/// User-visible transient messages (toasts).
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}
