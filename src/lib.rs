mod clarification;
mod classifier;
mod client;
mod decoder;
mod session;

pub use stylist_stream_types as types;

pub use clarification::ClarificationChoice;
pub use classifier::{classify, decode_events, events, Classified};
pub use client::{
    connect, connect_with_config, ByteStream, Client, ClientError, Config, ConfigBuilder,
    ConfigError, HttpTransport, StatusRx, Transport, TurnOutcome, TurnRejected, TurnState,
    TurnStatus, APOLOGY_REPLY, FALLBACK_REPLY,
};
pub use decoder::{frames, Frame, FrameDecoder, Frames};
pub use session::{ConversationSession, ThreadContext};
