//! Wire types for the status endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::chat::{
    ChatError, ChatReply, ChatTurn, DEFAULT_CHANNEL, DEFAULT_CHAT_ID, DEFAULT_SESSION_KEY,
};
use weaver_tools::UiCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Fail,
}

impl CheckStatus {
    pub fn from_passed(passed: bool) -> Self {
        if passed {
            Self::Ok
        } else {
            Self::Fail
        }
    }
}

/// Last reported result of a named health check. Replaced wholesale on
/// every registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `/health` and `/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<BTreeMap<String, Check>>,
}

impl StatusResponse {
    pub fn alive(uptime: Duration) -> Self {
        Self {
            status: "ok".to_string(),
            uptime: Some(format_uptime(uptime)),
            checks: None,
        }
    }

    pub fn ready(uptime: Duration, checks: BTreeMap<String, Check>) -> Self {
        Self {
            status: "ready".to_string(),
            uptime: Some(format_uptime(uptime)),
            checks: Some(checks),
        }
    }

    pub fn not_ready(checks: BTreeMap<String, Check>) -> Self {
        Self {
            status: "not ready".to_string(),
            uptime: None,
            checks: Some(checks),
        }
    }
}

/// `POST /chat` body. Absent, `null` and empty fields are all treated as blank.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub session_key: Option<String>,
    pub message: Option<String>,
    pub channel: Option<String>,
    pub chat_id: Option<String>,
}

impl ChatRequest {
    /// Decode a request body. Only a JSON object is accepted; arrays would
    /// otherwise fill the fields positionally.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "chat request must be a JSON object",
            ));
        }
        serde_json::from_value(value)
    }

    /// Apply defaults. `None` when there is no message to process.
    pub fn into_turn(self) -> Option<ChatTurn> {
        let message = self.message.filter(|m| !m.is_empty())?;
        let or_default = |v: Option<String>, default: &str| {
            v.filter(|s| !s.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Some(ChatTurn {
            session_key: or_default(self.session_key, DEFAULT_SESSION_KEY),
            message,
            channel: or_default(self.channel, DEFAULT_CHANNEL),
            chat_id: or_default(self.chat_id, DEFAULT_CHAT_ID),
        })
    }
}

/// `POST /chat` response. Always sent with 200; processing failures show up
/// in `error` next to whatever partial output exists.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ui_commands: Vec<UiCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<ChatReply, ChatError>> for ChatResponse {
    fn from(outcome: Result<ChatReply, ChatError>) -> Self {
        match outcome {
            Ok(reply) => Self {
                response: reply.response,
                ui_commands: reply.ui_commands,
                error: None,
            },
            Err(err) => {
                let message = err.message();
                let (partial, _) = err.into_parts();
                Self {
                    response: partial.response,
                    ui_commands: partial.ui_commands,
                    error: Some(message),
                }
            }
        }
    }
}

/// Render a duration the way the status endpoints report uptime: `250ms`, `3.5s`,
/// `2m0s`, `1h2m3.042s`.
pub fn format_uptime(uptime: Duration) -> String {
    let millis = uptime.as_millis();
    if millis == 0 {
        return "0s".to_string();
    }
    if millis < 1000 {
        return format!("{}ms", millis);
    }

    let total_secs = uptime.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let mut secs = (total_secs % 60).to_string();
    let frac = uptime.subsec_millis();
    if frac > 0 {
        let frac = format!("{:03}", frac);
        secs.push('.');
        secs.push_str(frac.trim_end_matches('0'));
    }

    match (hours, minutes) {
        (0, 0) => format!("{}s", secs),
        (0, m) => format!("{}m{}s", m, secs),
        (h, m) => format!("{}h{}m{}s", h, m, secs),
    }
}
