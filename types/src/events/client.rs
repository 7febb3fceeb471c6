#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum UiEvent {
    #[serde(rename = "clarification_choice")]
    ClarificationChoice {
        payload: String,
    },
}

impl UiEvent {
    pub fn clarification_choice(payload: &str) -> Self {
        UiEvent::ClarificationChoice {
            payload: payload.to_string(),
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            UiEvent::ClarificationChoice { payload } => payload,
        }
    }
}

/// Body of a `POST /turn` request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct TurnRequest {
    #[serde(rename = "userId")]
    user_id: String,

    /// Server-side conversation key, constant for one client lifetime
    #[serde(rename = "threadId")]
    thread_id: String,

    message: String,

    #[serde(default)]
    ui_events: Vec<UiEvent>,
}

impl TurnRequest {
    pub fn new(user_id: &str, thread_id: &str, message: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            thread_id: thread_id.to_string(),
            message: message.to_string(),
            ui_events: Vec::new(),
        }
    }

    pub fn with_ui_events(mut self, ui_events: Vec<UiEvent>) -> Self {
        self.ui_events = ui_events;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ui_events(&self) -> &[UiEvent] {
        &self.ui_events
    }
}
