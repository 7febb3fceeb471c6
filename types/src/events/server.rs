use crate::payload::AgentPayload;

/// Discriminators the agent is allowed to send. Anything else is dropped by the classifier.
pub const EVENT_TYPES: [&str; 3] = ["thinking", "result", "error"];

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum AgentEvent {
    #[serde(rename = "thinking")]
    Thinking(ThinkingEvent),
    #[serde(rename = "result")]
    Result(ResultEvent),
    #[serde(rename = "error")]
    Error(ErrorEvent),
}

impl AgentEvent {
    pub fn thinking(message: &str) -> Self {
        AgentEvent::Thinking(ThinkingEvent::new(message))
    }

    pub fn result(payload: AgentPayload) -> Self {
        AgentEvent::Result(ResultEvent::new(payload))
    }

    pub fn error(message: &str) -> Self {
        AgentEvent::Error(ErrorEvent::new(message))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::Thinking(_) => "thinking",
            AgentEvent::Result(_) => "result",
            AgentEvent::Error(_) => "error",
        }
    }
}

/// `thinking` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ThinkingEvent {
    /// Human readable progress line, e.g. "Searching the catalog"
    #[serde(default)]
    message: String,
}

impl ThinkingEvent {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `result` event
///
/// The agent wraps the payload in a `payload` field; a payload inlined next to
/// the `type` tag is accepted as well.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(from = "ResultBody")]
pub struct ResultEvent {
    payload: AgentPayload,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ResultBody {
    Wrapped { payload: AgentPayload },
    Inline(AgentPayload),
}

impl From<ResultBody> for ResultEvent {
    fn from(body: ResultBody) -> Self {
        match body {
            ResultBody::Wrapped { payload } | ResultBody::Inline(payload) => Self { payload },
        }
    }
}

impl ResultEvent {
    pub fn new(payload: AgentPayload) -> Self {
        Self { payload }
    }

    pub fn payload(&self) -> &AgentPayload {
        &self.payload
    }

    pub fn into_payload(self) -> AgentPayload {
        self.payload
    }
}

/// `error` event
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ErrorEvent {
    #[serde(default, alias = "error")]
    message: String,
}

impl ErrorEvent {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_wrapped_and_inline_results() {
        let wrapped: AgentEvent = serde_json::from_str(
            r#"{"type":"result","payload":{"stylist_response":"Try linen.","products":[]}}"#,
        )
        .unwrap();
        let inline: AgentEvent =
            serde_json::from_str(r#"{"type":"result","stylist_response":"Try linen."}"#).unwrap();

        for event in [wrapped, inline] {
            match event {
                AgentEvent::Result(result) => {
                    assert_eq!(result.payload().stylist_response(), Some("Try linen."))
                }
                other => panic!("expected result, got {:?}", other),
            }
        }
    }

    #[test]
    fn error_accepts_either_field_name() {
        let a: AgentEvent = serde_json::from_str(r#"{"type":"error","message":"boom"}"#).unwrap();
        let b: AgentEvent = serde_json::from_str(r#"{"type":"error","error":"boom"}"#).unwrap();
        assert_eq!(a, AgentEvent::error("boom"));
        assert_eq!(b, AgentEvent::error("boom"));
    }
}
