//! Chat assistant client.
//!
//! Each request carries the new message plus the last
//! [`CHAT_HISTORY_WINDOW`] messages of the conversation so far. The backend
//! answers `{ "response": ... }` or, when it declines, `{ "error": ... }`;
//! both become an assistant turn in the history.

use clinic_core::constants::{CHAT_HISTORY_WINDOW, CHAT_PATH};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::errors::Result;

/// Assistant turn recorded when a request fails outright.
pub const CHAT_FAILURE_TEXT: &str = "Sorry, the assistant is unavailable right now.";

/// Who wrote a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The signed-in staff member.
    User,
    /// The assistant.
    Assistant,
}

/// One message in a chat conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author.
    pub role: ChatRole,
    /// Text.
    pub content: String,
}

impl ChatMessage {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A chat conversation with its own history buffer.
///
/// Sends are serialized: a second `send` waits for the first to finish so
/// the history stays in turn order.
#[derive(Debug)]
pub struct ChatSession {
    client: ApiClient,
    history: Mutex<Vec<ChatMessage>>,
}

impl ChatSession {
    /// Start an empty conversation.
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Send a message and return the assistant's reply.
    ///
    /// Blank input is ignored and yields `Ok(None)`. On failure the history
    /// records [`CHAT_FAILURE_TEXT`] as the assistant turn and the error is
    /// returned.
    pub async fn send(&self, input: &str) -> Result<Option<ChatMessage>> {
        let message = input.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let mut history = self.history.lock().await;
        let window_start = history.len().saturating_sub(CHAT_HISTORY_WINDOW);
        let request = ChatRequest {
            message,
            history: &history[window_start..],
        };
        debug!(history = request.history.len(), "sending chat message");
        let result: Result<ChatResponse> = self.client.post_json(CHAT_PATH, &request).await;
        history.push(ChatMessage::user(message));

        match result {
            Ok(body) => {
                let text = match (body.error, body.response) {
                    (Some(error), _) => error,
                    (None, Some(response)) => response,
                    (None, None) => String::new(),
                };
                let reply = ChatMessage::assistant(text);
                history.push(reply.clone());
                Ok(Some(reply))
            }
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "chat request failed");
                history.push(ChatMessage::assistant(CHAT_FAILURE_TEXT));
                Err(e)
            }
        }
    }

    /// Copy of the conversation so far.
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }

    /// Forget the conversation.
    pub async fn clear(&self) {
        self.history.lock().await.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
