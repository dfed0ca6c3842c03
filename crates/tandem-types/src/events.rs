use serde::{Deserialize, Serialize};

use crate::models::{ChatMessage, ConversationScope, LocalUser, UserId};

/// Events sent FROM client TO server over the chat channel.
///
/// Encoded as `{"event": "<name>", "data": {...}}`. Event and field names
/// are fixed by the server and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Announce presence in a conversation. Not acknowledged.
    JoinChat {
        first_name: String,
        user_id: UserId,
        target_user_id: UserId,
    },

    /// Post a message to the conversation. The server echoes it back
    /// to every joined participant as `messageReceived`.
    SendMessage {
        first_name: String,
        last_name: String,
        user_id: UserId,
        target_user_id: UserId,
        text: String,
    },
}

impl ClientEvent {
    pub fn join(user: &LocalUser, scope: &ConversationScope) -> Self {
        Self::JoinChat {
            first_name: user.first_name.clone(),
            user_id: scope.local_user_id.clone(),
            target_user_id: scope.target_user_id.clone(),
        }
    }

    pub fn send_message(user: &LocalUser, scope: &ConversationScope, text: String) -> Self {
        Self::SendMessage {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_id: scope.local_user_id.clone(),
            target_user_id: scope.target_user_id.clone(),
            text,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinChat { .. } => "joinChat",
            Self::SendMessage { .. } => "sendMessage",
        }
    }
}

/// Events sent FROM server TO client over the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A message was posted to the joined conversation (including our own).
    MessageReceived {
        first_name: String,
        last_name: String,
        text: String,
    },

    /// The server refused something we sent.
    MessageError { error: String },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageReceived { .. } => "messageReceived",
            Self::MessageError { .. } => "messageError",
        }
    }
}

impl From<ChatMessage> for ServerEvent {
    fn from(msg: ChatMessage) -> Self {
        Self::MessageReceived {
            first_name: msg.sender_first_name,
            last_name: msg.sender_last_name,
            text: msg.text,
        }
    }
}
