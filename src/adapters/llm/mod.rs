//! Remote model client.
//!
//! `ChatSession` is the live, stateful binding between the active
//! conversation and the model's multi-turn context. It is owned by the
//! session manager — there is no module-level "current session"
//! singleton — and holds the profile-derived system prompt plus the
//! ordered history that every call sends in full.

pub mod providers;

use crate::core::ports::llm::{ChatBackend, ChatTurn, LlmError, TurnRole};
use crate::core::types::{Message, Sender, UserProfile};

/// Fixed assistant persona; profile context is appended beneath it.
const PERSONA: &str = "You are an expert and experienced from the healthcare and biomedical domain \
with extensive medical knowledge and practical experience. Your name is Vita, and you were \
developed by Vital Health Solutions. who's willing to help answer the user's query with \
explanation. In your explanation, leverage your deep medical expertise such as relevant \
anatomical structures, physiological processes, diagnostic criteria, treatment guidelines, or \
other pertinent medical concepts. Use precise medical terminology while still aiming to make \
the explanation clear and accessible to a general audience.";

/// Builds the system prompt: persona plus one line per present profile
/// field, in a fixed field order. Absent fields are omitted entirely.
pub fn build_system_prompt(profile: Option<&UserProfile>) -> String {
    let mut prompt = PERSONA.to_string();
    let Some(profile) = profile else {
        return prompt;
    };
    if !profile.has_context() {
        return prompt;
    }

    prompt.push_str("\n\nUser Context:");
    let fields = [
        ("Name", &profile.name),
        ("Age", &profile.age),
        ("Gender", &profile.gender),
        ("Medical History", &profile.medical_history),
        ("Current Medications", &profile.current_medications),
        ("Health Concerns", &profile.concerns),
    ];
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            prompt.push_str(&format!("\n{label}: {value}"));
        }
    }
    prompt
}

pub struct ChatSession {
    turns: Vec<ChatTurn>,
}

impl ChatSession {
    /// Opens a fresh session seeded with the profile-derived system
    /// prompt and nothing else.
    pub fn new(profile: Option<&UserProfile>) -> Self {
        Self {
            turns: vec![ChatTurn::new(TurnRole::System, build_system_prompt(profile))],
        }
    }

    /// Re-seeds the context from persisted history, so a reloaded
    /// conversation continues where it left off. Error placeholders
    /// never reached the model and are skipped.
    pub fn replay(&mut self, messages: &[Message]) {
        for message in messages.iter().filter(|m| !m.is_error()) {
            let role = match message.sender {
                Sender::User => TurnRole::User,
                Sender::Bot => TurnRole::Model,
            };
            self.turns.push(ChatTurn::new(role, message.text.clone()));
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Appends the user turn, calls the backend with the full context,
    /// and records the reply. On failure the user turn is rolled back
    /// so the session context stays aligned with what the model has
    /// actually seen.
    pub async fn send(&mut self, backend: &dyn ChatBackend, text: &str) -> Result<String, LlmError> {
        self.turns.push(ChatTurn::new(TurnRole::User, text));
        match backend.generate(&self.turns).await {
            Ok(reply) => {
                self.turns.push(ChatTurn::new(TurnRole::Model, reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                self.turns.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::BoxFuture;

    use super::*;
    use crate::core::types::Message;

    struct EchoBackend;

    impl ChatBackend for EchoBackend {
        fn generate<'a>(
            &'a self,
            turns: &'a [ChatTurn],
        ) -> BoxFuture<'a, Result<String, LlmError>> {
            Box::pin(async move {
                let last = turns.last().map(|t| t.text.clone()).unwrap_or_default();
                Ok(format!("echo: {last}"))
            })
        }
    }

    struct FailingBackend;

    impl ChatBackend for FailingBackend {
        fn generate<'a>(
            &'a self,
            _turns: &'a [ChatTurn],
        ) -> BoxFuture<'a, Result<String, LlmError>> {
            Box::pin(async { Err(LlmError::Transport("connection reset".into())) })
        }
    }

    fn full_profile() -> UserProfile {
        UserProfile {
            name: Some("Ana".into()),
            age: Some("34".into()),
            gender: Some("female".into()),
            medical_history: Some("asthma".into()),
            current_medications: Some("albuterol".into()),
            concerns: Some("sleep quality".into()),
            ..Default::default()
        }
    }

    #[test]
    fn system_prompt_lists_fields_in_fixed_order() {
        let prompt = build_system_prompt(Some(&full_profile()));
        let name = prompt.find("Name: Ana").expect("name present");
        let age = prompt.find("Age: 34").expect("age present");
        let gender = prompt.find("Gender: female").expect("gender present");
        let history = prompt
            .find("Medical History: asthma")
            .expect("history present");
        let meds = prompt
            .find("Current Medications: albuterol")
            .expect("medications present");
        let concerns = prompt
            .find("Health Concerns: sleep quality")
            .expect("concerns present");
        assert!(name < age && age < gender && gender < history && history < meds && meds < concerns);
    }

    #[test]
    fn system_prompt_omits_absent_fields_and_header() {
        let prompt = build_system_prompt(Some(&UserProfile::default()));
        assert!(!prompt.contains("User Context:"));

        let partial = UserProfile {
            age: Some("70".into()),
            ..Default::default()
        };
        let prompt = build_system_prompt(Some(&partial));
        assert!(prompt.contains("User Context:"));
        assert!(prompt.contains("Age: 70"));
        assert!(!prompt.contains("Name:"));
    }

    #[tokio::test]
    async fn successful_send_grows_context_by_two_turns() {
        let mut session = ChatSession::new(None);
        let reply = session.send(&EchoBackend, "hello").await.expect("reply");
        assert_eq!(reply, "echo: hello");
        assert_eq!(session.turns().len(), 3); // system + user + model
        assert_eq!(session.turns()[2].role, TurnRole::Model);
    }

    #[tokio::test]
    async fn failed_send_rolls_back_the_user_turn() {
        let mut session = ChatSession::new(None);
        let err = session.send(&FailingBackend, "hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
        assert_eq!(session.turns().len(), 1); // only the system prompt
    }

    #[test]
    fn replay_skips_error_placeholders() {
        let mut session = ChatSession::new(None);
        session.replay(&[
            Message::user(1, "hi", None),
            Message::bot(2, "hello"),
            Message::user(3, "again", None),
            Message::error(4, "could not reach the service"),
        ]);
        assert_eq!(session.turns().len(), 4); // system + user + model + user
        assert!(session.turns().iter().all(|t| t.text != "could not reach the service"));
    }
}
