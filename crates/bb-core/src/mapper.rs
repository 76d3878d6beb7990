//! # Record Mapper
//!
//! Pure functions turning server records into client entities. This is the
//! only place timestamps are parsed and the only place payloads are
//! validated; anything that gets past here is well-formed.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::models::{
    BoardActivityPage, BoardData, BoardDescription, Comment, Identity, Post, PostOptions,
    PostingIdentity, Tags, Thread, DEFAULT_USER_AVATAR, DEFAULT_USER_NAME,
};
use crate::records::{
    BoardActivityRecord, BoardRecord, CommentRecord, DescriptionRecord, PinnedOrderRecord,
    PostRecord, SecretIdentityRecord, TagsRecord, ThreadRecord, UserIdentityRecord,
};

/// Parses an RFC 3339 timestamp, or a naive one which is taken as UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ClientError::MalformedPayload(format!("invalid {field} timestamp: {raw:?}")))
}

fn parse_optional_timestamp(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|value| parse_timestamp(field, value)).transpose()
}

fn map_secret_identity(record: SecretIdentityRecord) -> Identity {
    Identity::new(record.name, record.avatar)
}

fn map_user_identity(record: Option<UserIdentityRecord>) -> Option<Identity> {
    record.map(|user| {
        let name = user
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        let avatar = user
            .avatar
            .filter(|avatar| !avatar.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AVATAR.to_string());
        Identity::new(name, Some(avatar))
    })
}

pub fn map_tags(record: TagsRecord) -> Tags {
    Tags {
        whisper_tags: record.whisper_tags,
        index_tags: record.index_tags,
        category_tags: record.category_tags,
        content_warnings: record.content_warnings,
    }
}

/// Inverse of [`map_tags`], used for request bodies.
pub fn tags_record(tags: &Tags) -> TagsRecord {
    TagsRecord {
        whisper_tags: tags.whisper_tags.clone(),
        index_tags: tags.index_tags.clone(),
        category_tags: tags.category_tags.clone(),
        content_warnings: tags.content_warnings.clone(),
    }
}

pub fn map_comment(record: CommentRecord, parent_post_id: Uuid) -> Result<Comment> {
    Ok(Comment {
        comment_id: record.comment_id,
        chain_parent_id: record.chain_parent_id,
        parent_comment_id: record.parent_comment,
        parent_post_id,
        secret_identity: map_secret_identity(record.secret_identity),
        user_identity: map_user_identity(record.user_identity),
        accessory: record.accessory_avatar,
        created: parse_timestamp("comment created", &record.created)?,
        content: record.content,
        is_new: record.is_new,
        is_own: record.is_own,
    })
}

pub fn map_post(record: PostRecord) -> Result<Post> {
    let post_id = record.post_id;
    let comments = record
        .comments
        .into_iter()
        .map(|comment| map_comment(comment, post_id))
        .collect::<Result<Vec<_>>>()?;

    Ok(Post {
        post_id,
        thread_id: record.parent_thread_id,
        parent_post_id: record.parent_post_id,
        secret_identity: map_secret_identity(record.secret_identity),
        user_identity: map_user_identity(record.user_identity),
        accessory: record.accessory_avatar,
        created: parse_timestamp("post created", &record.created)?,
        content: record.content,
        options: PostOptions {
            wide: record.options.wide.unwrap_or(false),
        },
        tags: map_tags(record.tags),
        comments,
        posts_amount: record.posts_amount,
        threads_amount: record.threads_amount,
        comments_amount: record.comments_amount,
        new_posts_amount: record.new_posts_amount,
        new_comments_amount: record.new_comments_amount,
        is_new: record.is_new,
        is_own: record.is_own,
    })
}

/// Secret identity of the viewer's first own post, falling back to their
/// first own comment.
pub fn personal_identity(posts: &[Post]) -> Option<Identity> {
    posts
        .iter()
        .find(|post| post.is_own)
        .map(|post| post.secret_identity.clone())
        .or_else(|| {
            posts
                .iter()
                .flat_map(|post| post.comments.iter())
                .find(|comment| comment.is_own)
                .map(|comment| comment.secret_identity.clone())
        })
}

pub fn map_thread(record: ThreadRecord) -> Result<Thread> {
    let thread_id = record.thread_id;
    let posts = record
        .posts
        .into_iter()
        .map(map_post)
        .collect::<Result<Vec<_>>>()?;
    let head = posts.first().ok_or_else(|| {
        ClientError::MalformedPayload(format!("thread {thread_id} has no head post"))
    })?;

    Ok(Thread {
        thread_id,
        is_new: head.is_new,
        personal_identity: personal_identity(&posts),
        board_slug: record.board_slug,
        new_posts_amount: record.thread_new_posts_amount,
        new_comments_amount: record.thread_new_comments_amount,
        total_comments_amount: record.thread_total_comments_amount,
        total_posts_amount: record.thread_total_posts_amount,
        direct_threads_amount: record.thread_direct_threads_amount,
        last_activity: parse_optional_timestamp(
            "thread last activity",
            record.thread_last_activity.as_deref(),
        )?,
        muted: record.muted,
        hidden: record.hidden,
        default_view: record.default_view,
        posts,
    })
}

pub fn map_activity_page(record: BoardActivityRecord) -> Result<BoardActivityPage> {
    let activity = record
        .activity
        .into_iter()
        .map(|thread| map_thread(thread).map(std::sync::Arc::new))
        .collect::<Result<Vec<_>>>()?;
    Ok(BoardActivityPage {
        activity,
        next_page_cursor: record.next_page_cursor.filter(|cursor| !cursor.is_empty()),
    })
}

/// Section types this client does not know are skipped, not rejected.
fn map_description(record: DescriptionRecord) -> Option<BoardDescription> {
    match record.kind.as_str() {
        "text" => Some(BoardDescription::Text {
            id: record.id,
            index: record.index,
            title: record.title,
            description: record.description.unwrap_or_default(),
        }),
        "category_filter" => Some(BoardDescription::CategoryFilter {
            id: record.id,
            index: record.index,
            title: record.title,
            categories: record.categories.unwrap_or_default(),
        }),
        other => {
            warn!(kind = other, title = %record.title, "skipping unknown board description type");
            None
        }
    }
}

fn map_pinned_order(record: Option<PinnedOrderRecord>) -> Result<Option<i64>> {
    // A zero or empty order means "not pinned".
    match record {
        None | Some(PinnedOrderRecord::Number(0)) => Ok(None),
        Some(PinnedOrderRecord::Number(order)) => Ok(Some(order)),
        Some(PinnedOrderRecord::Text(raw)) if raw.trim().is_empty() => Ok(None),
        Some(PinnedOrderRecord::Text(raw)) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ClientError::MalformedPayload(format!("invalid pinned order {raw:?}"))),
    }
}

pub fn map_board(record: BoardRecord) -> Result<BoardData> {
    let last_post = parse_optional_timestamp("board last post", record.last_post.as_deref())?;
    let last_comment =
        parse_optional_timestamp("board last comment", record.last_comment.as_deref())?;
    let last_update = match (last_post, last_comment) {
        (Some(post), Some(comment)) => Some(post.max(comment)),
        (post, comment) => post.or(comment),
    };

    Ok(BoardData {
        slug: record.slug,
        avatar_url: record.avatar_url,
        tagline: record.tagline,
        accent_color: record.settings.accent_color,
        logged_in_only: record.logged_in_only,
        delisted: record.delisted,
        muted: record.muted,
        has_updates: record.has_updates,
        last_update,
        last_update_from_others: parse_optional_timestamp(
            "board last activity from others",
            record.last_activity_from_others.as_deref(),
        )?,
        last_visit: parse_optional_timestamp("board last visit", record.last_visit.as_deref())?,
        descriptions: record
            .descriptions
            .into_iter()
            .filter_map(map_description)
            .collect(),
        pinned_order: map_pinned_order(record.pinned_order)?,
        posting_identities: record
            .posting_identities
            .into_iter()
            .map(|identity| PostingIdentity {
                id: identity.id,
                name: identity.name,
                avatar: identity.avatar,
            })
            .collect(),
        permissions: record.permissions,
    })
}
