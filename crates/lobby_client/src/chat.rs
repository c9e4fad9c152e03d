//! Client-side chat log.
//!
//! Broadcast messages accumulate in a single lobby history. Directed messages
//! are keyed by the counterpart's external messaging id into per-conversation
//! logs with unread counters; the counter only accumulates while the
//! conversation is not the one currently open. Host messages carry a flag so
//! views can badge them.

use std::collections::HashMap;

use shared::protocol::{ChatDelivery, ChatScope};

/// One displayed chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub sender: String,
    pub sender_is_host: bool,
    pub body: String,
    /// Set on directed entries this client sent itself (local echo).
    pub outgoing: bool,
}

#[derive(Debug, Default)]
pub struct Conversation {
    pub entries: Vec<ChatEntry>,
    pub unread: usize,
}

#[derive(Debug, Default)]
pub struct ChatLog {
    lobby: Vec<ChatEntry>,
    conversations: HashMap<String, Conversation>,
    open_conversation: Option<String>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a delivery from the server into the matching log.
    pub fn record(&mut self, delivery: ChatDelivery) {
        let entry = ChatEntry {
            sender: delivery.sender,
            sender_is_host: delivery.sender_is_host,
            body: delivery.body,
            outgoing: false,
        };
        match delivery.scope {
            ChatScope::Broadcast => self.lobby.push(entry),
            ChatScope::Directed { sender_chat_id } => {
                let open = self.open_conversation.as_deref() == Some(sender_chat_id.as_str());
                let conversation = self.conversations.entry(sender_chat_id).or_default();
                conversation.entries.push(entry);
                if !open {
                    conversation.unread += 1;
                }
            }
        }
    }

    /// Local echo for a directed message this client sent. The server never
    /// reflects directed messages back to the sender.
    pub fn record_outgoing_directed(&mut self, target_chat_id: &str, body: String) {
        let conversation = self
            .conversations
            .entry(target_chat_id.to_string())
            .or_default();
        conversation.entries.push(ChatEntry {
            sender: String::new(),
            sender_is_host: false,
            body,
            outgoing: true,
        });
    }

    /// Opens a conversation, clearing its unread counter.
    pub fn open_conversation(&mut self, chat_id: &str) {
        self.open_conversation = Some(chat_id.to_string());
        if let Some(conversation) = self.conversations.get_mut(chat_id) {
            conversation.unread = 0;
        }
    }

    /// Returns to the lobby channel view.
    pub fn close_conversation(&mut self) {
        self.open_conversation = None;
    }

    pub fn lobby_history(&self) -> &[ChatEntry] {
        &self.lobby
    }

    pub fn conversation(&self, chat_id: &str) -> Option<&Conversation> {
        self.conversations.get(chat_id)
    }

    pub fn unread_total(&self) -> usize {
        self.conversations.values().map(|c| c.unread).sum()
    }
}
