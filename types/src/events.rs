pub mod client;
pub mod server;

pub use client::{TurnRequest, UiEvent};
pub use server::{AgentEvent, ErrorEvent, ResultEvent, ThinkingEvent};

/// Reserved payload that marks the intentional end of a turn stream.
pub const DONE_SENTINEL: &str = "[DONE]";
