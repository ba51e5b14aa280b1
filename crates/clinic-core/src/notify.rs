//! User-visible notification surface.
//!
//! Identity-affecting operations (login, logout, registration) report their
//! outcome as a [`Toast`]. Delivery is fire-and-forget: a [`Notifier`] never
//! reports back, and a dropped toast is not an error.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Visual treatment of a toast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    /// Informational or success.
    #[default]
    Default,
    /// Failure.
    Destructive,
}

/// A single notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Short headline.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Visual treatment.
    #[serde(default)]
    pub variant: ToastVariant,
}

impl Toast {
    /// A success / informational toast.
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    /// A failure toast.
    pub fn failure(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }

    /// Whether this toast reports a failure.
    pub fn is_failure(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

/// Receiver of user-visible notifications.
pub trait Notifier: Send + Sync {
    /// Deliver a toast. Must not block.
    fn notify(&self, toast: Toast);
}

/// Notifier that writes toasts to the log. Used by the console binary when
/// no interactive surface is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, toast: Toast) {
        if toast.is_failure() {
            tracing::warn!(title = %toast.title, "{}", toast.description);
        } else {
            tracing::info!(title = %toast.title, "{}", toast.description);
        }
    }
}

/// Notifier that forwards toasts over an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Toast>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, toast: Toast) {
        // Receiver gone means nobody is listening; the toast is dropped.
        let _ = self.tx.send(toast);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
