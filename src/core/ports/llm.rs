use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    System,
    User,
    Model,
}

/// One entry of the model session's context. The first turn is always
/// the profile-derived system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("model API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("model returned no content")]
    Empty,
    #[error("no API key configured; set GEMINI_API_KEY or add google_api_key to the config file")]
    MissingApiKey,
}

/// Remote model port. Stateless per call: the caller passes the full
/// ordered context and receives the generated reply as plain text.
/// No retry happens at or below this boundary.
pub trait ChatBackend: Send + Sync {
    fn generate<'a>(&'a self, turns: &'a [ChatTurn]) -> BoxFuture<'a, Result<String, LlmError>>;
}
