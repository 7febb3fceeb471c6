//! Per-event state changes of a turn. The controller decides when to call
//! these; they only touch the session they are handed.

use crate::client::consts::{APOLOGY_REPLY, FALLBACK_REPLY};
use crate::client::TurnOutcome;
use crate::session::ConversationSession;
use crate::types::{AgentEvent, AgentPayload, TurnSummary};

pub(crate) enum Fold {
    /// Advisory status line; the turn keeps going.
    Thinking(String),
    /// The turn reached its terminal state.
    Finished(TurnOutcome),
}

pub(crate) fn fold_event(session: &mut ConversationSession, event: AgentEvent) -> Fold {
    match event {
        AgentEvent::Thinking(thinking) => Fold::Thinking(thinking.message().to_string()),
        AgentEvent::Result(result) => {
            Fold::Finished(TurnOutcome::Completed(fold_result(session, result.into_payload())))
        }
        AgentEvent::Error(error) => {
            tracing::warn!("agent reported an error: {}", error.message());
            Fold::Finished(TurnOutcome::Failed(fold_failure(session)))
        }
    }
}

/// One assistant message per result, plus the profile patch it carries.
pub(crate) fn fold_result(
    session: &mut ConversationSession,
    payload: AgentPayload,
) -> crate::types::MessageId {
    let text = payload
        .stylist_response()
        .unwrap_or(FALLBACK_REPLY)
        .to_string();
    let summary = TurnSummary::from_payload(&payload);
    if let Some(patch) = payload.user_profile() {
        session.merge_profile(patch);
    }
    session.append_assistant(&text, Some(summary), Some(payload))
}

pub(crate) fn fold_failure(session: &mut ConversationSession) -> crate::types::MessageId {
    session.append_assistant(APOLOGY_REPLY, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;
    use serde_json::json;

    #[test]
    fn result_without_text_uses_fallback_reply() {
        let mut session = ConversationSession::new("u1");
        let payload: AgentPayload = serde_json::from_value(json!({
            "stylist_response": "",
            "products": [{"title": "Kurta", "color": "saffron"}]
        }))
        .unwrap();

        let Fold::Finished(TurnOutcome::Completed(id)) =
            fold_event(&mut session, AgentEvent::result(payload))
        else {
            panic!("result should finish the turn");
        };

        let message = &session.transcript()[0];
        assert_eq!(message.id(), id);
        assert_eq!(message.role(), MessageRole::Assistant);
        assert_eq!(message.text(), FALLBACK_REPLY);
        assert_eq!(message.summary().unwrap().top_pieces(), ["Kurta"]);
        assert!(message.payload().is_some());
    }

    #[test]
    fn error_appends_apology_without_raw_text() {
        let mut session = ConversationSession::new("u1");
        let fold = fold_event(&mut session, AgentEvent::error("qdrant timeout"));
        assert!(matches!(fold, Fold::Finished(TurnOutcome::Failed(_))));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].text(), APOLOGY_REPLY);
        assert!(!session.transcript()[0].text().contains("qdrant"));
    }

    #[test]
    fn thinking_leaves_transcript_alone() {
        let mut session = ConversationSession::new("u1");
        let fold = fold_event(&mut session, AgentEvent::thinking("Checking the weather"));
        assert!(matches!(fold, Fold::Thinking(ref m) if m == "Checking the weather"));
        assert!(session.transcript().is_empty());
    }
}
