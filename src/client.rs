use std::sync::{Mutex, MutexGuard, PoisonError};

use futures_util::StreamExt;
use tokio::sync::watch;

use crate::clarification::ClarificationChoice;
use crate::classifier;
use crate::session::{ConversationSession, ThreadContext};
use crate::types::{
    Clarification, ClarificationOption, Message, MessageId, ProfileUpdate, TurnRequest, UiEvent,
    UserProfile,
};

mod config;
mod consts;
mod error;
mod fold;
mod transport;

pub use config::{Config, ConfigBuilder, ConfigError};
pub use consts::{APOLOGY_REPLY, FALLBACK_REPLY};
pub use error::ClientError;
pub use transport::{ByteStream, HttpTransport, Transport};

#[cfg(test)]
pub(crate) use transport::MockTransport;

use fold::Fold;

pub type StatusRx = watch::Receiver<TurnStatus>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    /// Request sent, response not open yet
    Sending,
    /// Reading the event stream
    Streaming,
}

/// What a front end needs to render while a turn runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnStatus {
    state: TurnState,
    /// Latest `thinking` line of the open turn. Cleared when the turn ends.
    thinking: Option<String>,
}

impl TurnStatus {
    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn thinking(&self) -> Option<&str> {
        self.thinking.as_deref()
    }

    pub fn is_idle(&self) -> bool {
        self.state == TurnState::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRejected {
    /// Blank text and no ui events
    Empty,
    /// Another turn is still open
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A `result` was folded into this assistant message.
    Completed(MessageId),
    /// The agent reported an error or the transport failed; an apology was appended.
    Failed(MessageId),
    /// The stream closed without a terminal event. Nothing was appended.
    Ended,
    /// The turn never started.
    Rejected(TurnRejected),
}

/// Holds the turn lock for as long as it lives.
///
/// Dropping it, on any path including a cancelled future, returns the
/// status to `Idle` and clears the thinking line.
struct TurnGuard<'a> {
    status: &'a watch::Sender<TurnStatus>,
}

impl<'a> TurnGuard<'a> {
    fn acquire(status: &'a watch::Sender<TurnStatus>) -> Option<Self> {
        let acquired = status.send_if_modified(|current| {
            if current.is_idle() {
                current.state = TurnState::Sending;
                current.thinking = None;
                true
            } else {
                false
            }
        });
        acquired.then(|| Self { status })
    }

    fn streaming(&self) {
        self.status.send_modify(|current| current.state = TurnState::Streaming);
    }

    fn thinking(&self, message: String) {
        self.status.send_modify(|current| current.thinking = Some(message));
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.status.send_modify(|current| {
            current.state = TurnState::Idle;
            current.thinking = None;
        });
    }
}

/// A conversation with the stylist agent.
///
/// Owns the session and serializes turns: at most one turn is open at a
/// time, and every turn ends in exactly one of [`TurnOutcome`]'s states.
pub struct Client<T = HttpTransport> {
    transport: T,
    thread: ThreadContext,
    session: Mutex<ConversationSession>,
    status: watch::Sender<TurnStatus>,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, user_id: &str) -> Self {
        let session = ConversationSession::new(user_id);
        let (status, _) = watch::channel(TurnStatus::default());
        Self {
            transport,
            thread: session.context().clone(),
            session: Mutex::new(session),
            status,
        }
    }

    pub fn thread(&self) -> &ThreadContext {
        &self.thread
    }

    /// Subscribes to state and thinking updates.
    pub fn status(&self) -> StatusRx {
        self.status.subscribe()
    }

    pub fn state(&self) -> TurnState {
        self.status.borrow().state
    }

    pub fn is_idle(&self) -> bool {
        self.state() == TurnState::Idle
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.session().transcript().to_vec()
    }

    pub fn profile(&self) -> UserProfile {
        self.session().profile().clone()
    }

    pub fn latest_clarification(&self) -> Option<Clarification> {
        self.session().latest_clarification().cloned()
    }

    fn session(&self) -> MutexGuard<'_, ConversationSession> {
        // The lock is never held across an await, so a poisoned guard still holds consistent data.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a streamed turn and drives it to its terminal state.
    pub async fn submit_turn(&self, text: &str, ui_events: Vec<UiEvent>) -> TurnOutcome {
        let (guard, request) = match self.begin_turn(text, ui_events) {
            Ok(started) => started,
            Err(rejected) => return TurnOutcome::Rejected(rejected),
        };

        let stream = match self.transport.open_turn(&request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!("failed to open turn stream: {}", e);
                return self.fail_turn();
            }
        };
        guard.streaming();

        let mut events = std::pin::pin!(classifier::decode_events(stream));
        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!("turn stream broke off: {}", e);
                    return self.fail_turn();
                }
            };
            tracing::debug!("received event: {}", event.kind());

            let fold = fold::fold_event(&mut self.session(), event);
            match fold {
                Fold::Thinking(message) => guard.thinking(message),
                Fold::Finished(outcome) => {
                    tracing::info!("turn finished: {:?}", outcome);
                    return outcome;
                }
            }
        }

        tracing::info!("turn stream ended without a result");
        TurnOutcome::Ended
    }

    /// Same turn through the non-streaming endpoint: one request, one payload.
    pub async fn submit_turn_unstreamed(
        &self,
        text: &str,
        ui_events: Vec<UiEvent>,
    ) -> TurnOutcome {
        let (_guard, request) = match self.begin_turn(text, ui_events) {
            Ok(started) => started,
            Err(rejected) => return TurnOutcome::Rejected(rejected),
        };

        match self.transport.analyze(&request).await {
            Ok(payload) => {
                let id = fold::fold_result(&mut self.session(), payload);
                tracing::info!("unstreamed turn completed");
                TurnOutcome::Completed(id)
            }
            Err(e) => {
                tracing::warn!("unstreamed turn failed: {}", e);
                self.fail_turn()
            }
        }
    }

    /// Relays a picked clarification option back to the agent as a new turn.
    /// Ignored while a turn is open.
    pub async fn select_clarification(&self, option: &ClarificationOption) -> TurnOutcome {
        if !self.is_idle() {
            tracing::debug!("ignoring clarification pick while a turn is open");
            return TurnOutcome::Rejected(TurnRejected::Busy);
        }
        let (message, ui_events) = ClarificationChoice::from_option(option).into_parts();
        self.submit_turn(&message, ui_events).await
    }

    /// Pulls the stored profile and merges it into the session snapshot.
    pub async fn refresh_profile(&self) -> Result<UserProfile, ClientError> {
        let profile = self.transport.fetch_profile(self.thread.user_id()).await?;
        Ok(self.merge_profile(&profile))
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserProfile, ClientError> {
        let update = update.with_user_id(self.thread.user_id());
        let profile = self.transport.update_profile(&update).await?;
        Ok(self.merge_profile(&profile))
    }

    /// Uploads a portrait for analysis. Never touches the turn lock.
    pub async fn upload_portrait(
        &self,
        image: Vec<u8>,
        file_name: &str,
    ) -> Result<UserProfile, ClientError> {
        let profile = self.transport.upload_portrait(image, file_name).await?;
        Ok(self.merge_profile(&profile))
    }

    fn merge_profile(&self, patch: &UserProfile) -> UserProfile {
        let mut session = self.session();
        session.merge_profile(patch);
        session.profile().clone()
    }

    /// Takes the turn lock and records the user's side of the turn.
    fn begin_turn(
        &self,
        text: &str,
        ui_events: Vec<UiEvent>,
    ) -> Result<(TurnGuard<'_>, TurnRequest), TurnRejected> {
        let text = text.trim();
        if text.is_empty() && ui_events.is_empty() {
            return Err(TurnRejected::Empty);
        }
        let Some(guard) = TurnGuard::acquire(&self.status) else {
            tracing::debug!("turn rejected, another turn is open");
            return Err(TurnRejected::Busy);
        };

        self.session().append_user(text);
        tracing::info!(
            "starting turn thread={} ui_events={}",
            self.thread.thread_id(),
            ui_events.len()
        );

        let request = TurnRequest::new(self.thread.user_id(), self.thread.thread_id(), text)
            .with_ui_events(ui_events);
        Ok((guard, request))
    }

    fn fail_turn(&self) -> TurnOutcome {
        TurnOutcome::Failed(fold::fold_failure(&mut self.session()))
    }
}

pub fn connect_with_config(config: Config) -> Result<Client, ClientError> {
    let user_id = config.user_id().to_string();
    let transport = HttpTransport::new(config)?;
    Ok(Client::new(transport, &user_id))
}

/// Builds a client from the environment (see [`Config::from_env`]).
pub fn connect() -> Result<Client, ClientError> {
    let config = Config::from_env()?;
    connect_with_config(config)
}
