use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::types::{
    AgentPayload, Clarification, Message, MessageId, MessageRole, TurnSummary, UserProfile,
};

/// Identity sent with every turn. The agent keys its per-thread memory on `thread_id`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ThreadContext {
    user_id: String,
    thread_id: String,
}

impl ThreadContext {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            thread_id: generate_thread_id(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

/// A random UUID, or a millisecond timestamp when the OS random source is unavailable.
fn generate_thread_id() -> String {
    let mut bytes = [0u8; 16];
    match OsRng.try_fill_bytes(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string(),
        Err(e) => {
            tracing::warn!("OS random source unavailable ({}), using a timestamp thread id", e);
            timestamp_thread_id(SystemTime::now())
        }
    }
}

fn timestamp_thread_id(now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    format!("thread-{}", millis)
}

/// Transcript and profile snapshot of one conversation.
///
/// Only the turn controller mutates a session; everything else reads it.
#[derive(Debug)]
pub struct ConversationSession {
    context: ThreadContext,
    transcript: Vec<Message>,
    profile: UserProfile,
    next_seq: u64,
}

impl ConversationSession {
    pub fn new(user_id: &str) -> Self {
        Self {
            context: ThreadContext::new(user_id),
            transcript: Vec::new(),
            profile: UserProfile::default(),
            next_seq: 0,
        }
    }

    pub fn context(&self) -> &ThreadContext {
        &self.context
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Options offered by the newest assistant message, if it asked for clarification.
    pub fn latest_clarification(&self) -> Option<&Clarification> {
        self.transcript
            .iter()
            .rev()
            .find(|message| message.role() == MessageRole::Assistant)
            .and_then(Message::clarification)
    }

    pub(crate) fn append_user(&mut self, text: &str) -> MessageId {
        let message = Message::builder(self.next_id())
            .with_role(MessageRole::User)
            .with_text(text)
            .build();
        self.push(message)
    }

    pub(crate) fn append_assistant(
        &mut self,
        text: &str,
        summary: Option<TurnSummary>,
        payload: Option<AgentPayload>,
    ) -> MessageId {
        let mut builder = Message::builder(self.next_id())
            .with_role(MessageRole::Assistant)
            .with_text(text);
        if let Some(summary) = summary {
            builder = builder.with_summary(summary);
        }
        if let Some(payload) = payload {
            builder = builder.with_payload(payload);
        }
        self.push(builder.build())
    }

    pub(crate) fn merge_profile(&mut self, patch: &UserProfile) {
        self.profile.merge(patch);
    }

    fn next_id(&mut self) -> MessageId {
        self.next_seq += 1;
        MessageId::new(self.next_seq)
    }

    fn push(&mut self, message: Message) -> MessageId {
        let id = message.id();
        self.transcript.push(message);
        id
    }
}
