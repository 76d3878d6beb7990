//! # Server Records
//!
//! Wire shapes of the backend API. Field names follow the server (mostly
//! snake_case, a few camelCase board fields). Optional fields are explicit;
//! lists and counters that the server may omit or send as `null` default to
//! empty/zero. Timestamps stay strings here and are parsed by the mapper.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::ThreadView;

/// Treats a missing field and an explicit `null` the same way.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretIdentityRecord {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentityRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagsRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub whisper_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub index_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostOptionsRecord {
    #[serde(default)]
    pub wide: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: Uuid,
    #[serde(default)]
    pub chain_parent_id: Option<Uuid>,
    #[serde(default)]
    pub parent_comment: Option<Uuid>,
    pub secret_identity: SecretIdentityRecord,
    #[serde(default)]
    pub user_identity: Option<UserIdentityRecord>,
    #[serde(default)]
    pub accessory_avatar: Option<String>,
    pub created: String,
    pub content: String,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_own: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: Uuid,
    pub parent_thread_id: Uuid,
    #[serde(default)]
    pub parent_post_id: Option<Uuid>,
    pub secret_identity: SecretIdentityRecord,
    #[serde(default)]
    pub user_identity: Option<UserIdentityRecord>,
    #[serde(default)]
    pub accessory_avatar: Option<String>,
    pub created: String,
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: PostOptionsRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: TagsRecord,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub posts_amount: u32,
    #[serde(default)]
    pub threads_amount: u32,
    #[serde(default)]
    pub comments_amount: u32,
    #[serde(default)]
    pub new_posts_amount: u32,
    #[serde(default)]
    pub new_comments_amount: u32,
    #[serde(default)]
    pub is_new: bool,
    /// Whether the viewer wrote this post.
    #[serde(rename = "self", default)]
    pub is_own: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadRecord {
    pub thread_id: Uuid,
    pub board_slug: String,
    pub posts: Vec<PostRecord>,
    #[serde(default)]
    pub thread_new_posts_amount: u32,
    #[serde(default)]
    pub thread_new_comments_amount: u32,
    #[serde(default)]
    pub thread_total_comments_amount: u32,
    #[serde(default)]
    pub thread_total_posts_amount: u32,
    #[serde(default)]
    pub thread_direct_threads_amount: u32,
    #[serde(default)]
    pub thread_last_activity: Option<String>,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_view: ThreadView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardActivityRecord {
    #[serde(default)]
    pub next_page_cursor: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activity: Vec<ThreadRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSettingsRecord {
    #[serde(rename = "accentColor", default)]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub index: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostingIdentityRecord {
    pub id: String,
    pub name: String,
    #[serde(default, alias = "avatar_url")]
    pub avatar: Option<String>,
}

/// The server sends the pinned order either as a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PinnedOrderRecord {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub slug: String,
    #[serde(rename = "avatarUrl")]
    pub avatar_url: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: BoardSettingsRecord,
    #[serde(rename = "loggedInOnly", default)]
    pub logged_in_only: bool,
    #[serde(default)]
    pub delisted: bool,
    #[serde(default)]
    pub last_post: Option<String>,
    #[serde(default)]
    pub last_comment: Option<String>,
    #[serde(default)]
    pub last_activity_from_others: Option<String>,
    #[serde(default)]
    pub last_visit: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub descriptions: Vec<DescriptionRecord>,
    #[serde(default)]
    pub has_updates: bool,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub pinned_order: Option<PinnedOrderRecord>,
    #[serde(rename = "postingIdentities", default, deserialize_with = "null_as_default")]
    pub posting_identities: Vec<PostingIdentityRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub permissions: Vec<String>,
}

/// Body of `PATCH posts/{id}/contribution`.
pub type EditTagsRequest = TagsRecord;

/// Response of `PATCH posts/{id}/contribution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditContributionResponse {
    pub contribution: PostRecord,
}

/// Body of `POST threads/{id}/update/view`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateViewRequest {
    #[serde(rename = "defaultView")]
    pub default_view: ThreadView,
}
