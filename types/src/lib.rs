pub mod events;
pub mod payload;
pub mod profile;
mod message;
mod summary;
mod value;

pub use events::{AgentEvent, TurnRequest, UiEvent};
pub use message::*;
pub use payload::{AgentPayload, Clarification, ClarificationOption, Outfit, Price, Product};
pub use profile::{ProfileUpdate, UserProfile};
pub use summary::TurnSummary;
