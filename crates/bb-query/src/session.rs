//! Who is logged in. Queries and mutations read it at call time; views can
//! `watch` it to re-render on login or logout.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone)]
pub struct Session {
    state: Arc<watch::Sender<Option<CurrentUser>>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::logged_out()
    }
}

impl Session {
    pub fn logged_out() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn logged_in(user: CurrentUser) -> Self {
        let session = Self::logged_out();
        session.log_in(user);
        session
    }

    pub fn log_in(&self, user: CurrentUser) {
        tracing::info!(username = %user.username, "session started");
        self.state.send_replace(Some(user));
    }

    pub fn log_out(&self) {
        if self.state.send_replace(None).is_some() {
            tracing::info!("session ended");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Option<CurrentUser>> {
        self.state.subscribe()
    }
}
