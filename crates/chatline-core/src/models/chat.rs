use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Chatbot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // pad() so column widths apply in listings
        f.pad(match self {
            Sender::User => "User",
            Sender::Chatbot => "Chatbot",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    // The server emits integer primary keys; ids are opaque strings client-side
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub sender: Sender,
    pub content: String,
    // The message serializer names this field "timestamp"
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub unique_key: String,
    pub user: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Messages in insertion (chronological) order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Request body for sending a message into a session
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    pub chat_session_id: &'a str,
    pub content: &'a str,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
