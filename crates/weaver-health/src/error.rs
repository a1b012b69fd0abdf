use thiserror::Error;

use crate::server::ServerPhase;

/// Errors returned by the status server lifecycle.
#[derive(Debug, Error)]
pub enum HealthServerError {
    #[error("Failed to bind health server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Health server listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Health server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Health server cannot start from phase {0:?}")]
    InvalidPhase(ServerPhase),
}
