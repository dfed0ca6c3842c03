use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identifier as issued by the matching service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The signed-in user's resolved profile. The join and send payloads
/// carry its display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

/// The (local, counterparty) pair a channel is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationScope {
    pub local_user_id: UserId,
    pub target_user_id: UserId,
}

impl ConversationScope {
    pub fn new(local_user_id: UserId, target_user_id: UserId) -> Self {
        Self {
            local_user_id,
            target_user_id,
        }
    }
}

impl fmt::Display for ConversationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.local_user_id, self.target_user_id)
    }
}

/// One transcript entry. Sender names are a snapshot taken at send time,
/// not a reference to the author's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub text: String,
}

impl ChatMessage {
    pub fn new(
        sender_first_name: impl Into<String>,
        sender_last_name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            sender_first_name: sender_first_name.into(),
            sender_last_name: sender_last_name.into(),
            text: text.into(),
        }
    }

    /// Whether the message should be rendered as the local user's own.
    /// Matching is by first name only, since that is all the stream carries.
    pub fn is_from(&self, user: &LocalUser) -> bool {
        self.sender_first_name == user.first_name
    }

    pub fn sender_display_name(&self) -> String {
        format!("{} {}", self.sender_first_name, self.sender_last_name)
    }
}
