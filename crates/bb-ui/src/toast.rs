use std::sync::{Mutex, PoisonError};

use bb_core::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

/// Collects toasts raised by mutations until the presentation layer shows
/// them.
#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: Mutex<Vec<Toast>>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, kind: ToastKind, message: &str) {
        tracing::debug!(?kind, text = message, "toast raised");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Toast {
                kind,
                message: message.to_string(),
            });
    }

    /// Removes and returns everything raised so far, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn peek(&self) -> Vec<Toast> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier for ToastQueue {
    fn success(&self, message: &str) {
        self.push(ToastKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.push(ToastKind::Error, message);
    }
}
