use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Current time as an ISO-8601 / RFC 3339 string, the format every
/// persisted timestamp uses.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Metadata for a file the user attached to a message. Only the
/// descriptor is stored; extracted text goes into the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileAttachment>>,
    #[serde(
        default,
        rename = "isError",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_error: Option<bool>,
}

impl Message {
    pub fn user(id: u64, text: impl Into<String>, files: Option<Vec<FileAttachment>>) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::User,
            timestamp: now_iso(),
            files,
            is_error: None,
        }
    }

    pub fn bot(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            sender: Sender::Bot,
            timestamp: now_iso(),
            files: None,
            is_error: None,
        }
    }

    pub fn error(id: u64, text: impl Into<String>) -> Self {
        Self {
            is_error: Some(true),
            ..Self::bot(id, text)
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error == Some(true)
    }
}

/// A durable conversation record, stored as JSON under `chat_<id>`.
/// `messages` is append-only and `name` is derived once from the first
/// user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub messages: Vec<Message>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPrefs {
    pub sound: bool,
    pub desktop: bool,
}

/// Singleton onboarding record. Absence of the stored profile is
/// meaningful: it is what triggers onboarding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub medical_history: Option<String>,
    pub current_medications: Option<String>,
    pub concerns: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationPrefs>,
}

impl UserProfile {
    /// True when at least one context field would appear in the system
    /// prompt.
    pub fn has_context(&self) -> bool {
        [
            &self.name,
            &self.age,
            &self.gender,
            &self.medical_history,
            &self.current_medications,
            &self.concerns,
        ]
        .iter()
        .any(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }
}
