//! # bb-http
//!
//! The [`ForumApi`] port over the backend's JSON HTTP API. Responses are
//! decoded into wire records and mapped into client entities before they
//! leave this crate.

use std::time::Duration;

use async_trait::async_trait;
use bb_core::mapper::{map_activity_page, map_board, map_post, map_thread, tags_record};
use bb_core::records::{BoardActivityRecord, BoardRecord, EditContributionResponse, ThreadRecord, UpdateViewRequest};
use bb_core::{BoardActivityPage, BoardData, ClientError, ForumApi, Post, Result, Tags, Thread, ThreadView};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

pub struct HttpForumApi {
    client: reqwest::Client,
    base: Url,
    token: Option<SecretString>,
}

impl HttpForumApi {
    pub fn new(base: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ClientError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            token: None,
        })
    }

    /// Sends `token` as the `Authorization` header of every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ClientError::Internal(format!("invalid request path {path}: {err}")))?;
        debug!(%method, %url, "backend request");
        let builder = self.client.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.header(AUTHORIZATION, token.expose_secret()),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|err| ClientError::Network(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            body
        };
        Err(ClientError::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let bytes = response.bytes().await.map_err(|err| ClientError::Network(err.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|err| ClientError::MalformedPayload(err.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await.map(drop)
    }

    /// `POST` to set a thread flag, `DELETE` to clear it.
    async fn toggle(&self, thread_id: Uuid, flag: &str, on: bool) -> Result<()> {
        let method = if on { Method::POST } else { Method::DELETE };
        self.execute(self.request(method, &format!("threads/{thread_id}/{flag}"))?)
            .await
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

#[async_trait]
impl ForumApi for HttpForumApi {
    #[instrument(skip(self))]
    async fn board_activity(&self, slug: &str, cursor: Option<String>) -> Result<BoardActivityPage> {
        let mut builder = self.request(Method::GET, &format!("boards/{slug}/activity/latest"))?;
        if let Some(cursor) = cursor {
            builder = builder.query(&[("cursor", cursor)]);
        }
        let record: BoardActivityRecord = self.fetch(builder).await?;
        map_activity_page(record)
    }

    #[instrument(skip(self))]
    async fn thread(&self, thread_id: Uuid) -> Result<Thread> {
        let record: ThreadRecord = self
            .fetch(self.request(Method::GET, &format!("threads/{thread_id}/"))?)
            .await?;
        map_thread(record)
    }

    #[instrument(skip(self))]
    async fn all_boards(&self) -> Result<Vec<BoardData>> {
        let records: Vec<BoardRecord> = self.fetch(self.request(Method::GET, "boards")?).await?;
        records.into_iter().map(map_board).collect()
    }

    async fn mark_thread_read(&self, thread_id: Uuid) -> Result<()> {
        self.execute(self.request(Method::GET, &format!("threads/{thread_id}/visit"))?)
            .await
    }

    async fn mute_thread(&self, thread_id: Uuid, mute: bool) -> Result<()> {
        self.toggle(thread_id, "mute", mute).await
    }

    async fn hide_thread(&self, thread_id: Uuid, hide: bool) -> Result<()> {
        self.toggle(thread_id, "hide", hide).await
    }

    async fn update_thread_view(&self, thread_id: Uuid, view: ThreadView) -> Result<()> {
        let builder = self
            .request(Method::POST, &format!("threads/{thread_id}/update/view"))?
            .json(&UpdateViewRequest { default_view: view });
        self.execute(builder).await
    }

    #[instrument(skip(self, tags))]
    async fn edit_post_tags(&self, post_id: Uuid, tags: Tags) -> Result<Post> {
        let builder = self
            .request(Method::PATCH, &format!("posts/{post_id}/contribution"))?
            .json(&tags_record(&tags));
        let response: EditContributionResponse = self.fetch(builder).await?;
        map_post(response.contribution)
    }

    async fn visit_board(&self, slug: &str) -> Result<()> {
        self.execute(self.request(Method::GET, &format!("boards/{slug}/visit"))?)
            .await
    }
}
