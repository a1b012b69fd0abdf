//! `weaver serve`: run the status server with a direct-command chat handler.
//!
//! The LLM agent loop is hosted elsewhere; this gateway answers `/chat` by
//! itself only for `/canvas {json}` commands, which go straight to the
//! canvas tool so frontends can be exercised without a model.

use anyhow::{Context, Result};
use std::sync::Arc;
use weaver_core::config::HealthConfig;
use weaver_health::{
    CancellationToken, ChatError, ChatProcessor, ChatReply, ChatTurn, HealthServer,
};
use weaver_tools::{CanvasTool, Tool};

const CANVAS_PREFIX: &str = "/canvas";

/// Chat handler used when no agent is attached to the gateway. Each turn
/// gets its own canvas queue so concurrent sessions never see each other's
/// commands.
#[derive(Debug, Default)]
pub struct DirectCommands;

impl DirectCommands {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl ChatProcessor for DirectCommands {
    async fn process(
        &self,
        _cancel: CancellationToken,
        turn: &ChatTurn,
    ) -> Result<ChatReply, ChatError> {
        let Some(raw_args) = turn.message.trim().strip_prefix(CANVAS_PREFIX) else {
            return Err(ChatError::new(anyhow::anyhow!(
                "No agent is attached to this gateway; only {} commands are handled",
                CANVAS_PREFIX
            )));
        };

        let args: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(raw_args.trim())
                .context("Canvas command arguments must be a JSON object")?;
        let canvas = CanvasTool::new();
        let result = canvas.execute(args).await;
        tracing::info!(
            session_key = %turn.session_key,
            result = %result.content,
            "Executed direct canvas command"
        );
        Ok(ChatReply {
            response: result.content,
            ui_commands: canvas.drain(),
        })
    }
}

/// Entry point for `weaver serve`.
pub fn run_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = HealthConfig::from_env().with_overrides(host, port);
    let bind_addr = config.bind_addr();

    let server = HealthServer::new(config, Arc::new(DirectCommands::new()));
    server.register_check("gateway", || (true, format!("configured for {}", bind_addr)));

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(async move {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down gateway...");
            }
            on_signal.cancel();
        });

        server
            .start_with_cancel(cancel)
            .await
            .context("Health server failed")
    })
}
