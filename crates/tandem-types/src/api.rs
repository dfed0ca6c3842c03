use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{ChatMessage, LocalUser, UserId};

// -- History --

/// Placeholder names used when a stored message has lost its sender.
pub const UNKNOWN_FIRST_NAME: &str = "Unknown";
pub const UNKNOWN_LAST_NAME: &str = "User";

/// Body of `GET /chat/{targetUserId}`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub messages: Option<Vec<HistoryEntry>>,
}

/// One stored message. Fields with an unexpected shape (an unpopulated
/// sender id, a non-string text) read as absent so the row still renders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub sender_id: Option<SenderRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

/// Populated sender reference. Either name may be absent on old records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderRef {
    #[serde(default, deserialize_with = "lenient")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub last_name: Option<String>,
}

impl HistoryEntry {
    pub fn into_message(self) -> ChatMessage {
        let (first_name, last_name) = match self.sender_id {
            Some(sender) => (sender.first_name, sender.last_name),
            None => (None, None),
        };
        ChatMessage {
            sender_first_name: non_empty_or(first_name, UNKNOWN_FIRST_NAME),
            sender_last_name: non_empty_or(last_name, UNKNOWN_LAST_NAME),
            text: self.text.unwrap_or_default(),
        }
    }
}

impl HistoryResponse {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
            .unwrap_or_default()
            .into_iter()
            .map(HistoryEntry::into_message)
            .collect()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Each row decodes on its own; a row that is not an object at all becomes
/// a placeholder entry instead of failing the whole history.
fn lenient_rows<'de, D>(deserializer: D) -> Result<Option<Vec<HistoryEntry>>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Array(rows) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(Some(
        rows.into_iter()
            .map(|row| serde_json::from_value(row).unwrap_or_default())
            .collect(),
    ))
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback.to_string(),
    }
}

// -- Profile --

/// Body of `GET /profile/view`. Only the fields the chat needs are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<ProfileResponse> for LocalUser {
    fn from(profile: ProfileResponse) -> Self {
        Self {
            id: profile.id,
            first_name: profile.first_name,
            last_name: profile.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sender_metadata_gets_placeholders() {
        let body = r#"{"messages":[
            {"senderId":{"firstName":"Ada","lastName":"Lovelace"},"text":"hello"},
            {"senderId":null,"text":"orphan"},
            {"senderId":{"firstName":"Grace"}},
            {"senderId":{"firstName":"","lastName":""},"text":"blank names"}
        ]}"#;
        let messages = serde_json::from_str::<HistoryResponse>(body)
            .unwrap()
            .into_messages();

        assert_eq!(
            messages,
            vec![
                ChatMessage::new("Ada", "Lovelace", "hello"),
                ChatMessage::new("Unknown", "User", "orphan"),
                ChatMessage::new("Grace", "User", ""),
                ChatMessage::new("Unknown", "User", "blank names"),
            ]
        );
    }

    #[test]
    fn malformed_rows_do_not_sink_the_history() {
        let body = r#"{"messages":[
            {"senderId":{"firstName":"Ada","lastName":"Lovelace"},"text":"hello"},
            {"senderId":"65f0c0ffee","text":"unpopulated sender"},
            {"senderId":{"firstName":42,"lastName":"Hopper"},"text":{"rich":true}},
            "not a row"
        ]}"#;
        let messages = serde_json::from_str::<HistoryResponse>(body)
            .unwrap()
            .into_messages();

        assert_eq!(
            messages,
            vec![
                ChatMessage::new("Ada", "Lovelace", "hello"),
                ChatMessage::new("Unknown", "User", "unpopulated sender"),
                ChatMessage::new("Unknown", "Hopper", ""),
                ChatMessage::new("Unknown", "User", ""),
            ]
        );
    }

    #[test]
    fn non_array_messages_is_empty_history() {
        let messages = serde_json::from_str::<HistoryResponse>(r#"{"messages":"nope"}"#)
            .unwrap()
            .into_messages();
        assert!(messages.is_empty());
    }

    #[test]
    fn missing_messages_field_is_empty_history() {
        let messages = serde_json::from_str::<HistoryResponse>("{}")
            .unwrap()
            .into_messages();
        assert!(messages.is_empty());
    }

    #[test]
    fn profile_maps_to_local_user() {
        let profile: ProfileResponse = serde_json::from_str(
            r#"{"_id":"abc","firstName":"Ada","lastName":"Lovelace","age":36}"#,
        )
        .unwrap();
        let user = LocalUser::from(profile);
        assert_eq!(user.id, UserId::new("abc"));
        assert_eq!(user.first_name, "Ada");
    }
}
