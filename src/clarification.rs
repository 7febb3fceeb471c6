use crate::types::{ClarificationOption, UiEvent};

/// Message text used when the picked option has no label.
pub const FALLBACK_LABEL: &str = "Refine my search";
/// Choice payload used when the option has neither id nor label.
pub const FALLBACK_PAYLOAD: &str = "clarification_choice";

/// The follow-up turn produced by picking a clarification option.
///
/// The client attaches no meaning to the choice; it is relayed back to the
/// agent, which owns the disambiguation state for the thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClarificationChoice {
    message: String,
    ui_events: Vec<UiEvent>,
}

impl ClarificationChoice {
    pub fn from_option(option: &ClarificationOption) -> Self {
        let message = option.label().unwrap_or(FALLBACK_LABEL);
        let payload = option
            .id()
            .or_else(|| option.label())
            .unwrap_or(FALLBACK_PAYLOAD);

        Self {
            message: message.to_string(),
            ui_events: vec![UiEvent::clarification_choice(payload)],
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn ui_events(&self) -> &[UiEvent] {
        &self.ui_events
    }

    pub fn into_parts(self) -> (String, Vec<UiEvent>) {
        (self.message, self.ui_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_preferred_as_payload() {
        let option = ClarificationOption::new()
            .with_id("a1")
            .with_label("Smart casual");
        let choice = ClarificationChoice::from_option(&option);
        assert_eq!(choice.message(), "Smart casual");
        assert_eq!(choice.ui_events(), [UiEvent::clarification_choice("a1")]);
    }

    #[test]
    fn label_stands_in_for_missing_id() {
        let option = ClarificationOption::new().with_label("Smart casual");
        let choice = ClarificationChoice::from_option(&option);
        assert_eq!(choice.message(), "Smart casual");
        assert_eq!(
            choice.ui_events(),
            [UiEvent::clarification_choice("Smart casual")]
        );
    }

    #[test]
    fn bare_option_falls_back_to_generic_values() {
        let choice = ClarificationChoice::from_option(
            &ClarificationOption::new().with_short_description("Something else"),
        );
        assert_eq!(choice.message(), FALLBACK_LABEL);
        assert_eq!(choice.ui_events()[0].payload(), FALLBACK_PAYLOAD);

        let id_only = ClarificationChoice::from_option(&ClarificationOption::new().with_id("k9"));
        assert_eq!(id_only.message(), FALLBACK_LABEL);
        assert_eq!(id_only.ui_events()[0].payload(), "k9");
    }
}
