//! Chat collaborator interface behind `POST /chat`.

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use weaver_tools::UiCommand;

pub const DEFAULT_SESSION_KEY: &str = "rest:default";
pub const DEFAULT_CHANNEL: &str = "rest";
pub const DEFAULT_CHAT_ID: &str = "api";

/// A chat request with defaults applied, as handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub session_key: String,
    pub message: String,
    pub channel: String,
    pub chat_id: String,
}

/// What the agent produced for one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub ui_commands: Vec<UiCommand>,
}

/// Processing failure. Keeps whatever the agent produced before failing so
/// the caller can still use it.
#[derive(Debug, Error)]
#[error("{:#}", .cause)]
pub struct ChatError {
    pub partial: ChatReply,
    cause: anyhow::Error,
}

impl ChatError {
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self::with_partial(ChatReply::default(), err)
    }

    pub fn with_partial(partial: ChatReply, err: impl Into<anyhow::Error>) -> Self {
        Self {
            partial,
            cause: err.into(),
        }
    }

    /// Error text for the response body; never empty.
    pub fn message(&self) -> String {
        let msg = format!("{:#}", self.cause);
        if msg.trim().is_empty() {
            "chat processing failed".to_string()
        } else {
            msg
        }
    }

    pub fn into_parts(self) -> (ChatReply, anyhow::Error) {
        (self.partial, self.cause)
    }
}

impl From<anyhow::Error> for ChatError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

/// The agent side of `/chat`.
///
/// `cancel` is scoped to the HTTP request: it fires when the request
/// finishes or the client disconnects.
#[async_trait::async_trait]
pub trait ChatProcessor: Send + Sync {
    async fn process(
        &self,
        cancel: CancellationToken,
        turn: &ChatTurn,
    ) -> Result<ChatReply, ChatError>;
}
