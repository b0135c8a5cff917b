use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Typed from a speech transcript rather than the keyboard
    pub from_speech: bool,
    /// Backend round trip for bot replies
    pub latency_ms: Option<u64>,
    /// The synthetic reply shown when the backend call failed
    pub is_error: bool,
}

/// One chat turn
///
/// Fields are private: a message never changes after it is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    id: Uuid,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    metadata: MessageMetadata,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Role::Bot, content)
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }
}
