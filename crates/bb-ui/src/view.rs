//! # Thread Cards
//!
//! View models for one thread in a board feed. Every decision about what a
//! card shows is made here so the templates only print fields.

use bb_core::{Identity, Tags, Thread};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::menu::MenuAction;
use crate::relative::from_now;

/// Site-relative link to a thread.
pub fn thread_path(board_slug: &str, thread_id: Uuid) -> String {
    format!("/!{board_slug}/thread/{thread_id}")
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThreadCard {
    Visible(PostCard),
    /// Collapsed placeholder with an unhide link.
    Hidden(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostCard {
    pub thread_id: Uuid,
    pub post_id: Uuid,
    pub thread_url: String,
    pub content: String,
    pub secret_identity: Identity,
    pub user_identity: Option<Identity>,
    pub accessory: Option<String>,
    pub tags: Tags,
    pub wide: bool,
    pub created_label: String,
    pub new_post: bool,
    /// `None` when unread counts are not shown (logged out or muted).
    pub new_comments: Option<u32>,
    pub new_contributions: Option<u32>,
    pub total_comments: u32,
    pub total_contributions: u32,
    pub direct_contributions: u32,
    pub muted: bool,
    pub menu: Vec<MenuAction>,
}

impl ThreadCard {
    /// `None` for a thread without a head post.
    pub fn from_thread(thread: &Thread, board_slug: &str, logged_in: bool, now: DateTime<Utc>) -> Option<Self> {
        if thread.hidden {
            return Some(ThreadCard::Hidden(thread.thread_id));
        }
        let head = thread.head()?;
        let show_unread = logged_in && !thread.muted;

        let mut created_label = from_now(head.created, now);
        if let (true, Some(last_activity)) = (thread.has_replies(), thread.last_activity) {
            created_label.push_str(&format!(" [updated: {}]", from_now(last_activity, now)));
        }

        Some(ThreadCard::Visible(PostCard {
            thread_id: thread.thread_id,
            post_id: head.post_id,
            thread_url: thread_path(board_slug, thread.thread_id),
            content: head.content.clone(),
            secret_identity: head.secret_identity.clone(),
            user_identity: head.user_identity.clone(),
            accessory: head.accessory.clone(),
            tags: head.tags.clone(),
            wide: head.options.wide,
            created_label,
            new_post: show_unread && head.is_new,
            new_comments: show_unread.then_some(thread.new_comments_amount),
            // The head post counts among the thread's new posts.
            new_contributions: show_unread
                .then(|| thread.new_posts_amount.saturating_sub(u32::from(head.is_new))),
            total_comments: thread.total_comments_amount,
            total_contributions: thread.total_posts_amount.saturating_sub(1),
            direct_contributions: thread.direct_threads_amount,
            muted: logged_in && thread.muted,
            menu: MenuAction::for_thread(thread, logged_in),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::thread;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 3, 10, 0, 0).unwrap()
    }

    fn visible(card: Option<ThreadCard>) -> PostCard {
        match card {
            Some(ThreadCard::Visible(card)) => card,
            other => panic!("expected a visible card, got {other:?}"),
        }
    }

    #[test]
    fn logged_in_card_shows_unread_counts() {
        let thread = thread("gore", 3);

        let card = visible(ThreadCard::from_thread(&thread, "gore", true, now()));

        assert!(card.new_post);
        assert_eq!(card.new_comments, Some(3));
        assert_eq!(card.new_contributions, Some(1));
        assert_eq!(card.total_contributions, 1);
        assert_eq!(card.thread_url, format!("/!gore/thread/{}", thread.thread_id));
        assert_eq!(
            card.menu,
            vec![
                MenuAction::CopyLink,
                MenuAction::MarkVisited,
                MenuAction::Mute,
                MenuAction::Hide
            ]
        );
    }

    #[test]
    fn muted_and_logged_out_cards_hide_counts() {
        let mut thread = thread("gore", 3);
        thread.muted = true;

        let muted = visible(ThreadCard::from_thread(&thread, "gore", true, now()));
        assert!(muted.muted);
        assert!(!muted.new_post);
        assert_eq!(muted.new_comments, None);
        assert!(muted.menu.contains(&MenuAction::Unmute));

        let logged_out = visible(ThreadCard::from_thread(&thread, "gore", false, now()));
        assert!(!logged_out.muted);
        assert_eq!(logged_out.new_contributions, None);
        assert_eq!(logged_out.menu, vec![MenuAction::CopyLink]);
    }

    #[test]
    fn created_label_mentions_update_when_replied() {
        let mut thread = thread("gore", 0);
        thread.posts[0].created = now() - Duration::days(3);
        thread.last_activity = Some(now() - Duration::hours(2));

        let card = visible(ThreadCard::from_thread(&thread, "gore", true, now()));
        assert_eq!(card.created_label, "3 days ago [updated: 2 hours ago]");

        thread.total_posts_amount = 1;
        thread.total_comments_amount = 0;
        let card = visible(ThreadCard::from_thread(&thread, "gore", true, now()));
        assert_eq!(card.created_label, "3 days ago");
    }

    #[test]
    fn hidden_thread_is_a_placeholder() {
        let mut thread = thread("gore", 1);
        thread.hidden = true;

        assert_eq!(
            ThreadCard::from_thread(&thread, "gore", true, now()),
            Some(ThreadCard::Hidden(thread.thread_id))
        );
    }
}
