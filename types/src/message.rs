use crate::payload::{AgentPayload, Clarification};
use crate::summary::TurnSummary;

/// Position of a message in its transcript. Strictly increasing within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum MessageRole {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One transcript entry. Immutable once built.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Message {
    id: MessageId,

    role: MessageRole,

    text: String,

    /// Digest of the agent payload (assistant messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<TurnSummary>,

    /// The raw agent payload this message was built from
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<AgentPayload>,
}

impl Message {
    pub fn builder(id: MessageId) -> MessageBuilder {
        MessageBuilder::new(id)
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn summary(&self) -> Option<&TurnSummary> {
        self.summary.as_ref()
    }

    pub fn payload(&self) -> Option<&AgentPayload> {
        self.payload.as_ref()
    }

    /// The clarification the agent attached to this message, if it offers any options.
    pub fn clarification(&self) -> Option<&Clarification> {
        self.payload.as_ref().and_then(AgentPayload::clarification)
    }
}

pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new(id: MessageId) -> Self {
        Self {
            message: Message {
                id,
                role: MessageRole::User,
                text: String::new(),
                summary: None,
                payload: None,
            },
        }
    }

    pub fn with_role(mut self, role: MessageRole) -> Self {
        self.message.role = role;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.message.text = text.to_string();
        self
    }

    pub fn with_summary(mut self, summary: TurnSummary) -> Self {
        self.message.summary = Some(summary);
        self
    }

    pub fn with_payload(mut self, payload: AgentPayload) -> Self {
        self.message.payload = Some(payload);
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}
