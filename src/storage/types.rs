use crate::conversation::{placeholder_title, Conversation, Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Serialized form of a conversation
///
/// This is both the on-device encoding and the element shape of the remote
/// history endpoint. Field order is fixed so that encoding an unmodified
/// list always produces the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConversation {
    /// Conversation identifier
    pub id: String,
    /// Conversation title
    pub title: String,
    /// Messages in order
    pub messages: Vec<StoredMessage>,
    /// Creation time (RFC 3339)
    pub created_at: DateTime<Utc>,
    /// Last update time (RFC 3339)
    pub updated_at: DateTime<Utc>,
}

/// Serialized form of a message; attachments have no representation here
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message identifier
    pub id: String,
    /// Text body
    pub content: String,
    /// Author
    pub role: Role,
    /// Creation time (RFC 3339)
    pub timestamp: DateTime<Utc>,
}

impl From<&Conversation> for StoredConversation {
    fn from(conv: &Conversation) -> Self {
        Self {
            id: conv.id.clone(),
            title: conv.title.clone(),
            messages: conv.messages.iter().map(StoredMessage::from).collect(),
            created_at: conv.created_at,
            updated_at: conv.updated_at,
        }
    }
}

impl From<&Message> for StoredMessage {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.clone(),
            content: msg.content.clone(),
            role: msg.role,
            timestamp: msg.timestamp,
        }
    }
}

impl From<StoredConversation> for Conversation {
    fn from(stored: StoredConversation) -> Self {
        Self {
            id: stored.id,
            title: stored.title,
            messages: stored.messages.into_iter().map(Message::from).collect(),
            created_at: stored.created_at,
            updated_at: stored.updated_at.max(stored.created_at),
        }
    }
}

impl From<StoredMessage> for Message {
    fn from(stored: StoredMessage) -> Self {
        Self {
            id: stored.id,
            content: stored.content,
            role: stored.role,
            timestamp: stored.timestamp,
        }
    }
}

/// Decode a persisted conversation list, tolerating malformed content
///
/// Anything that is not a JSON array yields an empty list. Elements without
/// a string `id` are skipped; a missing or non-array `messages` becomes an
/// empty list; unparseable timestamps fall back to the current time.
pub fn decode_lenient(bytes: &[u8]) -> Vec<Conversation> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Stored conversations are not valid JSON: {}", e);
            return Vec::new();
        }
    };

    let items = match value.as_array() {
        Some(items) => items,
        None => {
            tracing::warn!("Stored conversations are not a JSON array, ignoring");
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let conv = conversation_from_value(index, item);
            if conv.is_none() {
                tracing::warn!("Skipping malformed stored conversation at index {}", index);
            }
            conv
        })
        .collect()
}

fn conversation_from_value(index: usize, value: &Value) -> Option<Conversation> {
    let obj = value.as_object()?;
    let id = obj.get("id")?.as_str()?.to_string();

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| placeholder_title(index + 1));

    let created_at = parse_timestamp(obj.get("createdAt"));
    let updated_at = obj
        .get("updatedAt")
        .map(|v| parse_timestamp(Some(v)))
        .unwrap_or(created_at)
        .max(created_at);

    let messages = match obj.get("messages").and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(message_from_value).collect(),
        None => {
            tracing::warn!("Conversation {} has no message array, defaulting to empty", id);
            Vec::new()
        }
    };

    Some(Conversation {
        id,
        title,
        messages,
        created_at,
        updated_at,
    })
}

fn message_from_value(value: &Value) -> Option<Message> {
    let obj = value.as_object()?;
    let role: Role = obj.get("role")?.as_str()?.parse().ok()?;

    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let content = obj
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(Message {
        id,
        content,
        role,
        timestamp: parse_timestamp(obj.get("timestamp")),
    })
}

fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    value
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now) // Fallback if parsing fails
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_conversation_uses_camel_case() {
        let conv = Conversation::new(1);
        let json = serde_json::to_value(StoredConversation::from(&conv)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn test_decode_lenient_not_json() {
        assert!(decode_lenient(b"not json at all").is_empty());
    }

    #[test]
    fn test_decode_lenient_not_array() {
        assert!(decode_lenient(br#"{"conversations": []}"#).is_empty());
    }

    #[test]
    fn test_decode_lenient_defaults_missing_messages() {
        let raw = br#"[{"id":"c1","title":"T","createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z"}]"#;
        let convs = decode_lenient(raw);
        assert_eq!(convs.len(), 1);
        assert!(convs[0].messages.is_empty());
        assert_eq!(convs[0].title, "T");
    }

    #[test]
    fn test_decode_lenient_defaults_non_array_messages() {
        let raw = br#"[{"id":"c1","title":"T","messages":"oops"}]"#;
        let convs = decode_lenient(raw);
        assert_eq!(convs.len(), 1);
        assert!(convs[0].messages.is_empty());
    }

    #[test]
    fn test_decode_lenient_skips_elements_without_id() {
        let raw = br#"[{"title":"no id"},{"id":"c2","title":"ok","messages":[]}]"#;
        let convs = decode_lenient(raw);
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].id, "c2");
    }

    #[test]
    fn test_decode_lenient_ignores_file_fields() {
        let raw = br#"[{"id":"c1","title":"T","messages":[
            {"id":"m1","content":"hi","role":"user","timestamp":"2024-01-01T00:00:00Z","files":[{"name":"a"}]}
        ],"createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}]"#;
        let convs = decode_lenient(raw);
        assert_eq!(convs[0].messages.len(), 1);
        assert_eq!(convs[0].messages[0].content, "hi");
    }

    #[test]
    fn test_decode_lenient_skips_messages_with_unknown_role() {
        let raw = br#"[{"id":"c1","title":"T","messages":[
            {"id":"m1","content":"sys","role":"system"},
            {"id":"m2","content":"hi","role":"user"}
        ]}]"#;
        let convs = decode_lenient(raw);
        assert_eq!(convs[0].messages.len(), 1);
        assert_eq!(convs[0].messages[0].id, "m2");
    }

    #[test]
    fn test_decode_lenient_reconstructs_timestamps() {
        let raw = br#"[{"id":"c1","title":"T","messages":[],
            "createdAt":"2024-03-01T10:00:00.000Z","updatedAt":"2024-03-02T10:00:00Z"}]"#;
        let convs = decode_lenient(raw);
        let expected = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(convs[0].created_at, expected);
        assert!(convs[0].updated_at > convs[0].created_at);
    }
}
