use std::sync::Arc;

use bb_core::{
    BoardActivityPage, BoardData, BoardDescription, Comment, Identity, Post, PostOptions, Tags, Thread, ThreadView,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

fn post(thread_id: Uuid, parent_post_id: Option<Uuid>, new_comments: u32) -> Post {
    let post_id = Uuid::new_v4();
    Post {
        post_id,
        thread_id,
        parent_post_id,
        secret_identity: Identity::new("Outdated Meme", Some("/outdated-meme.png".into())),
        user_identity: None,
        accessory: None,
        created: Utc.with_ymd_and_hms(2020, 4, 30, 3, 23, 0).unwrap(),
        content: "Remember to be excellent to each other and only be mean to fictional characters!".into(),
        options: PostOptions::default(),
        tags: Tags {
            whisper_tags: vec!["An order of samosas".into()],
            category_tags: vec!["blood".into()],
            ..Tags::default()
        },
        comments: vec![Comment {
            comment_id: Uuid::new_v4(),
            chain_parent_id: None,
            parent_comment_id: None,
            parent_post_id: post_id,
            secret_identity: Identity::new("Tuxedo Mask", None),
            user_identity: None,
            accessory: None,
            created: Utc.with_ymd_and_hms(2020, 5, 1, 5, 42, 0).unwrap(),
            content: "BIG FAN".into(),
            is_new: true,
            is_own: false,
        }],
        posts_amount: 2,
        threads_amount: 1,
        comments_amount: 1,
        new_posts_amount: 1,
        new_comments_amount: new_comments,
        is_new: true,
        is_own: false,
    }
}

pub fn thread(board_slug: &str, new_comments: u32) -> Thread {
    let thread_id = Uuid::new_v4();
    let head = post(thread_id, None, new_comments);
    let reply = post(thread_id, Some(head.post_id), 0);
    Thread {
        thread_id,
        board_slug: board_slug.to_string(),
        posts: vec![head, reply],
        is_new: true,
        new_posts_amount: 2,
        new_comments_amount: new_comments,
        total_comments_amount: 2,
        total_posts_amount: 2,
        direct_threads_amount: 1,
        last_activity: Some(Utc.with_ymd_and_hms(2020, 5, 3, 9, 47, 0).unwrap()),
        muted: false,
        hidden: false,
        default_view: ThreadView::Thread,
        personal_identity: None,
    }
}

pub fn page(threads: Vec<Thread>, cursor: Option<&str>) -> BoardActivityPage {
    BoardActivityPage {
        activity: threads.into_iter().map(Arc::new).collect(),
        next_page_cursor: cursor.map(str::to_owned),
    }
}

pub fn board(slug: &str, has_updates: bool) -> BoardData {
    BoardData {
        slug: slug.to_string(),
        avatar_url: format!("/{slug}.png"),
        tagline: "Blood! Blood! Blood!".into(),
        accent_color: Some("#f96680".into()),
        logged_in_only: false,
        delisted: false,
        muted: false,
        has_updates,
        last_update: None,
        last_update_from_others: None,
        last_visit: None,
        descriptions: vec![
            BoardDescription::CategoryFilter {
                id: Some("a".into()),
                index: 2,
                title: "Gore Categories".into(),
                categories: vec!["blood".into(), "bruises".into()],
            },
            BoardDescription::Text {
                id: Some("b".into()),
                index: 1,
                title: "Gore description".into(),
                description: "pls b nice".into(),
            },
        ],
        pinned_order: None,
        posting_identities: vec![],
        permissions: vec![],
    }
}
