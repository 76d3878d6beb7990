//! # Board Feed
//!
//! The board page: mounts the board's activity, renders it as thread cards
//! and turns menu clicks and scrolling into mutations and page fetches.

use std::sync::Arc;

use askama::Template;
use bb_core::{ClientError, Notifier, Result};
use bb_query::{CacheEntry, MutationHandle, PageFetch, QueryClient, QueryKey, ReadOptions, ThreadMutations, ThreadTarget};
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::menu::MenuAction;
use crate::view::{thread_path, ThreadCard};

const LINK_COPIED: &str = "Link copied!";

#[derive(Template)]
#[template(path = "feed.html")]
struct FeedTemplate<'a> {
    slug: &'a str,
    cards: Vec<ThreadCard>,
    show_empty: bool,
    footer: Option<&'static str>,
}

/// What a menu action produced.
#[derive(Debug)]
pub enum Dispatched {
    /// Absolute thread link, ready for the clipboard.
    Link(String),
    Pending(MutationHandle),
}

pub struct BoardFeed {
    slug: String,
    queries: QueryClient,
    mutations: ThreadMutations,
    notifier: Arc<dyn Notifier>,
    public_origin: Url,
}

impl BoardFeed {
    pub fn new(
        slug: impl Into<String>,
        queries: QueryClient,
        mutations: ThreadMutations,
        notifier: Arc<dyn Notifier>,
        public_origin: Url,
    ) -> Self {
        Self {
            slug: slug.into(),
            queries,
            mutations,
            notifier,
            public_origin,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Marks the board visited (logged-in users only) and loads its first
    /// page.
    pub async fn mount(&self) -> Result<Arc<CacheEntry>> {
        if self.mutations.visit_board(&self.slug).is_some() {
            debug!(board = %self.slug, "marking board as visited");
        }
        self.queries.board_activity(&self.slug).await
    }

    fn entry(&self) -> Option<Arc<CacheEntry>> {
        self.queries.cache().get(&QueryKey::board_activity(self.slug.as_str()))
    }

    pub fn cards(&self, now: DateTime<Utc>) -> Vec<ThreadCard> {
        let Some(entry) = self.entry() else {
            return Vec::new();
        };
        let logged_in = self.queries.session().is_logged_in();
        entry
            .threads()
            .filter_map(|thread| ThreadCard::from_thread(thread, &self.slug, logged_in, now))
            .collect()
    }

    /// The board has been fetched and has nothing in it.
    pub fn is_empty(&self) -> bool {
        self.entry()
            .and_then(|entry| entry.pages().first().map(|page| page.activity.is_empty()))
            .unwrap_or(false)
    }

    pub fn footer(&self) -> Option<&'static str> {
        let entry = self.entry()?;
        if entry.pages().is_empty() || self.is_empty() {
            return None;
        }
        Some(if self.queries.is_fetching_more(&self.slug) {
            "Loading more..."
        } else if self.queries.can_fetch_more(&self.slug) {
            "..."
        } else {
            "Nothing more to load"
        })
    }

    pub fn render(&self, now: DateTime<Utc>) -> askama::Result<String> {
        FeedTemplate {
            slug: &self.slug,
            cards: self.cards(now),
            show_empty: self.is_empty(),
            footer: self.footer(),
        }
        .render()
    }

    /// Loads the next page when there is one and none is loading.
    pub async fn on_reach_end(&self) -> Result<PageFetch> {
        debug!(board = %self.slug, "attempting to fetch more");
        let fetched = self.queries.fetch_next_page(&self.slug).await?;
        if let PageFetch::Skipped(reason) = &fetched {
            debug!(board = %self.slug, ?reason, "nothing more fetched");
        }
        Ok(fetched)
    }

    pub fn dispatch(&self, thread_id: Uuid, action: MenuAction) -> Result<Dispatched> {
        let target = ThreadTarget::new(thread_id, self.slug.as_str());
        let handle = match action {
            MenuAction::CopyLink => {
                let link = self
                    .public_origin
                    .join(&thread_path(&self.slug, thread_id))
                    .map_err(|err| ClientError::Internal(format!("invalid thread link: {err}")))?;
                self.notifier.success(LINK_COPIED);
                return Ok(Dispatched::Link(link.into()));
            }
            MenuAction::MarkVisited => self.mutations.read_thread(target, ReadOptions::default())?,
            MenuAction::Mute => self.mutations.mute_thread(target, true),
            MenuAction::Unmute => self.mutations.mute_thread(target, false),
            MenuAction::Hide => self.mutations.hide_thread(target, true),
            MenuAction::Unhide => self.mutations.hide_thread(target, false),
        };
        Ok(Dispatched::Pending(handle))
    }
}
