//! Weaver status server.
//!
//! Serves liveness (`/health`), readiness (`/ready`) and a REST chat
//! passthrough (`/chat`) for the gateway. Other subsystems publish their
//! status through [`HealthServer::register_check`]; the chat endpoint hands
//! turns to an injected [`ChatProcessor`].

mod chat;
mod error;
mod handlers;
mod server;
mod types;

#[cfg(test)]
mod tests;

pub use chat::{
    ChatError, ChatProcessor, ChatReply, ChatTurn, DEFAULT_CHANNEL, DEFAULT_CHAT_ID,
    DEFAULT_SESSION_KEY,
};
pub use error::HealthServerError;
pub use server::{HealthServer, ServerPhase, REQUEST_TIMEOUT};
pub use tokio_util::sync::CancellationToken;
pub use types::{format_uptime, ChatRequest, ChatResponse, Check, CheckStatus, StatusResponse};
