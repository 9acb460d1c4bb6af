//! Conversation log controller.
//!
//! Owns the append-only message log of the assistant screen. Each send
//! forwards the whole log (greeting included) to the completion service;
//! a failed call turns into a local apology instead of an error.

#[cfg(test)]
mod tests;

use crate::completion::{ChatMessage, CompletionClient, Role};
use crate::error::EatMateError;
use crate::screen::ScreenScope;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

pub const GREETING: &str = "Hi! I'm EatMate, your cooking and nutrition assistant. \
How can I help you today? You can ask me about recipes, cooking techniques, \
ingredient substitutions, or nutrition advice.";

/// Appended in place of a reply when the completion call fails.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't process your request. Please try again.";

/// Prompts offered before the user has said anything.
pub const SUGGESTIONS: [&str; 6] = [
    "How do I make pasta sauce from scratch?",
    "What can I substitute for eggs in baking?",
    "How many calories are in an avocado?",
    "What's a quick dinner with chicken?",
    "How do I cook quinoa?",
    "What are some healthy breakfast ideas?",
];

/// One entry in the log.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Millisecond timestamp ids, bumped so they never repeat within a log.
#[derive(Debug, Default)]
struct MessageIds {
    last: i64,
}

impl MessageIds {
    fn next(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last + 1);
        self.last = id;
        id.to_string()
    }
}

/// A send that has been accepted and is waiting for its reply.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub context: Vec<ChatMessage>,
}

/// Assistant screen state.
pub struct ConversationLog {
    client: Arc<CompletionClient>,
    messages: Vec<ConversationMessage>,
    loading: bool,
    ids: MessageIds,
    scope: ScreenScope,
}

impl ConversationLog {
    /// A fresh log holding only the greeting.
    pub fn new(client: Arc<CompletionClient>) -> Self {
        let mut log = Self {
            client,
            messages: Vec::new(),
            loading: false,
            ids: MessageIds::default(),
            scope: ScreenScope::new(),
        };
        log.push(Role::Assistant, GREETING);
        log
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether the send action is enabled for `draft`.
    pub fn can_send(&self, draft: &str) -> bool {
        !self.loading && !self.scope.is_torn_down() && !draft.trim().is_empty()
    }

    /// Suggestion prompts, only while the greeting is the sole message.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.messages.len() == 1 {
            &SUGGESTIONS
        } else {
            &[]
        }
    }

    /// Id of the newest entry; views scroll to it whenever it changes.
    pub fn scroll_anchor(&self) -> Option<&str> {
        self.messages.last().map(|m| m.id.as_str())
    }

    pub fn scope(&self) -> &ScreenScope {
        &self.scope
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    /// Everything the completion service sees, in log order.
    pub fn context(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| matches!(m.role, Role::User | Role::Assistant))
            .map(|m| ChatMessage::new(m.role, m.content.clone()))
            .collect()
    }

    fn push(&mut self, role: Role, content: &str) {
        let created_at = Utc::now();
        self.messages.push(ConversationMessage {
            id: self.ids.next(created_at),
            role,
            content: content.to_string(),
            created_at,
        });
    }

    /// Accept `text` as the next user turn.
    ///
    /// Returns `None` and leaves the log untouched for blank text, while a
    /// reply is outstanding, or after teardown.
    pub fn begin(&mut self, text: &str) -> Option<PendingTurn> {
        if !self.can_send(text) {
            return None;
        }

        self.push(Role::User, text.trim());
        self.loading = true;
        Some(PendingTurn {
            context: self.context(),
        })
    }

    /// Append the reply, or the fallback apology on failure. Returns false
    /// when the screen is already gone.
    pub fn complete(&mut self, result: Result<String, EatMateError>) -> bool {
        if self.scope.is_torn_down() {
            tracing::debug!("Completion reply dropped after teardown");
            return false;
        }

        match result {
            Ok(reply) => self.push(Role::Assistant, &reply),
            Err(e) => {
                tracing::error!("Error getting completion: {} [{}]", e, e.error_type());
                self.push(Role::Assistant, FALLBACK_REPLY);
            }
        }
        self.loading = false;
        true
    }

    /// Send `text` and wait for the reply. Returns whether a turn was
    /// added.
    pub async fn send(&mut self, text: &str) -> bool {
        let Some(turn) = self.begin(text) else {
            return false;
        };

        let client = Arc::clone(&self.client);
        let scope = self.scope.clone();
        match scope.run(async move { client.complete(&turn.context).await }).await {
            Some(result) => self.complete(result),
            None => false,
        }
    }
}
