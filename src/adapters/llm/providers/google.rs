//! Gemini `generateContent` backend. One-shot (non-streaming): the
//! session's full context goes up, plain text comes back.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::ports::llm::{ChatBackend, ChatTurn, LlmError, TurnRole};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
struct GoogleRequest {
    contents: Vec<GoogleContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<GoogleContent>,
    #[serde(rename = "generationConfig")]
    generation_config: Value,
}

#[derive(Debug, Serialize)]
struct GoogleContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn text_content(turn: &ChatTurn) -> GoogleContent {
    let role = match turn.role {
        TurnRole::System => None,
        TurnRole::User => Some("user".to_string()),
        TurnRole::Model => Some("model".to_string()),
    };
    GoogleContent {
        role,
        parts: vec![json!({ "text": turn.text })],
    }
}

fn build_request(turns: &[ChatTurn]) -> GoogleRequest {
    let system_instruction = turns
        .iter()
        .find(|t| t.role == TurnRole::System)
        .map(text_content);
    let contents = turns
        .iter()
        .filter(|t| t.role != TurnRole::System)
        .map(text_content)
        .collect();

    GoogleRequest {
        contents,
        system_instruction,
        generation_config: json!({
            "temperature": 0.5,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": 8192
        }),
    }
}

fn reply_text(response: GoogleResponse) -> Result<String, LlmError> {
    let text: String = response
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|c| c.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect();
    if text.is_empty() {
        Err(LlmError::Empty)
    } else {
        Ok(text)
    }
}

pub struct GoogleBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GoogleBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    async fn generate_inner(&self, turns: &[ChatTurn]) -> Result<String, LlmError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        let base_url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let request_body = build_request(turns);

        log::debug!(
            "Google request ({} contents)",
            request_body.contents.len()
        );

        // AIza… keys go as a query parameter; anything else is treated
        // as an OAuth bearer token.
        let request = if api_key.starts_with("AIza") {
            self.client
                .post(format!("{base_url}?key={api_key}"))
                .json(&request_body)
        } else {
            self.client
                .post(&base_url)
                .bearer_auth(api_key)
                .json(&request_body)
        };

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GoogleResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("error parsing response: {e}")))?;
        reply_text(parsed)
    }
}

impl ChatBackend for GoogleBackend {
    fn generate<'a>(&'a self, turns: &'a [ChatTurn]) -> BoxFuture<'a, Result<String, LlmError>> {
        Box::pin(self.generate_inner(turns))
    }
}
