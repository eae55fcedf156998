//! Session manager: owns the single active conversation and mediates
//! between the runtime surface, the persistence adapter, and the
//! remote model client.
//!
//! This is the error containment boundary: remote-call and extraction
//! failures become visible error messages in the conversation; nothing
//! below this layer surfaces to the presentation layer.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::extract::{mime_type, synthesize_prompt};
use crate::adapters::llm::ChatSession;
use crate::core::classifier::classify;
use crate::core::ports::extract::TextExtractor;
use crate::core::ports::llm::{ChatBackend, LlmError};
use crate::core::ports::store::ConversationStore;
use crate::core::types::{now_iso, Conversation, FileAttachment, Message, UserProfile};

const SEND_FAILURE_TEXT: &str = "I'm having trouble reaching the assistant service right now. \
Please try sending your message again.";
const FILE_FAILURE_TEXT: &str = "I had trouble processing that file. Please try another file or \
paste the text directly.";

pub struct SessionManager {
    store: Box<dyn ConversationStore>,
    backend: Arc<dyn ChatBackend>,
    extractor: Option<Box<dyn TextExtractor>>,
    profile: Option<UserProfile>,
    conversation_id: Option<String>,
    title: Option<String>,
    messages: Vec<Message>,
    next_message_id: u64,
    chat: Option<ChatSession>,
    loading: bool,
}

impl SessionManager {
    pub fn new(
        store: Box<dyn ConversationStore>,
        backend: Arc<dyn ChatBackend>,
        extractor: Option<Box<dyn TextExtractor>>,
    ) -> Self {
        let profile = store.load_profile();
        Self {
            store,
            backend,
            extractor,
            profile,
            conversation_id: None,
            title: None,
            messages: Vec::new(),
            next_message_id: 1,
            chat: None,
            loading: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    /// Clears the in-memory conversation and discards the live model
    /// session; a fresh one is created lazily on the next send.
    /// Idempotent.
    pub fn start_new_conversation(&mut self) {
        self.conversation_id = None;
        self.title = None;
        self.messages.clear();
        self.next_message_id = 1;
        self.chat = None;
    }

    /// Replaces the active conversation with a stored one. A missing
    /// record changes nothing; the return value only tells the caller
    /// whether a switch happened. The model session is discarded so
    /// its context is rebuilt from the profile and the loaded history
    /// on the next send.
    pub fn load_conversation(&mut self, id: &str) -> bool {
        let Some(record) = self.store.load_conversation(id) else {
            log::debug!("conversation {id} not found; keeping current state");
            return false;
        };
        self.next_message_id = record.messages.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        self.conversation_id = Some(record.id);
        self.title = Some(record.name);
        self.messages = record.messages;
        self.chat = None;
        true
    }

    /// Appends the user message, obtains the assistant reply, and
    /// persists the conversation. The first send of a fresh session
    /// assigns the conversation id and derives its title; a failed
    /// remote call appends an error placeholder instead and persists
    /// nothing for the turn.
    pub async fn send_message(&mut self, text: &str, files: Option<Vec<FileAttachment>>) {
        if self.loading {
            log::warn!("send ignored: another message is in flight");
            return;
        }
        self.loading = true;

        // The session is (re)built before the new message so replayed
        // history matches what was already exchanged.
        if self.chat.is_none() {
            let mut session = ChatSession::new(self.profile.as_ref());
            session.replay(&self.messages);
            self.chat = Some(session);
        }

        let id = self.next_id();
        self.messages.push(Message::user(id, text, files));

        if self.conversation_id.is_none() {
            let classification = classify(text);
            self.conversation_id = Some(uuid::Uuid::new_v4().to_string());
            self.title = Some(classification.title);
        }

        let backend = Arc::clone(&self.backend);
        let result = match self.chat.as_mut() {
            Some(chat) => chat.send(backend.as_ref(), text).await,
            None => Err(LlmError::Transport("no live session".into())),
        };

        match result {
            Ok(reply) => {
                let id = self.next_id();
                self.messages.push(Message::bot(id, reply));
                self.persist();
            }
            Err(e) => {
                log::error!("model call failed: {e}");
                let id = self.next_id();
                self.messages.push(Message::error(id, SEND_FAILURE_TEXT));
            }
        }
        self.loading = false;
    }

    /// Runs a file through the matching extractor and forwards the
    /// synthesized prompt like a normal send. Extraction failures only
    /// append an in-memory error message; nothing is persisted.
    pub async fn send_file(&mut self, path: &Path, instruction: Option<&str>) {
        if self.loading {
            log::warn!("send ignored: another message is in flight");
            return;
        }

        let extracted = match self.extractor.as_deref() {
            Some(extractor) => extractor.extract(path).await,
            None => {
                log::warn!("no extractor configured; ignoring {}", path.display());
                return;
            }
        };

        match extracted {
            Ok(text) => {
                let attachment = FileAttachment {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                    mime_type: mime_type(path).to_string(),
                    size: std::fs::metadata(path).map(|m| m.len()).unwrap_or(0),
                };
                let prompt = synthesize_prompt(&text, instruction);
                self.send_message(&prompt, Some(vec![attachment])).await;
            }
            Err(e) => {
                log::error!("extraction failed for {}: {e}", path.display());
                let id = self.next_id();
                self.messages.push(Message::error(id, FILE_FAILURE_TEXT));
            }
        }
    }

    /// Deletes the active conversation's durable record, then behaves
    /// like `start_new_conversation`.
    pub fn delete_current_conversation(&mut self) {
        if let Some(id) = self.conversation_id.take() {
            self.store.delete_conversation(&id);
        }
        self.start_new_conversation();
    }

    pub fn list_conversations(&self) -> Vec<Conversation> {
        self.store.list_conversations()
    }

    /// Stores the profile and resets the model session so the next
    /// send is seeded with the updated context.
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.store.save_profile(&profile);
        self.profile = Some(profile);
        self.chat = None;
    }

    /// Clears the in-memory profile and its durable record; stored
    /// conversations are untouched.
    pub fn delete_profile(&mut self) {
        self.store.clear_profile();
        self.profile = None;
        self.chat = None;
    }

    /// "Delete my data": every conversation record plus the profile.
    pub fn wipe_all_data(&mut self) {
        self.store.clear_all();
        self.profile = None;
        self.start_new_conversation();
    }

    fn persist(&self) {
        let Some(id) = self.conversation_id.as_deref() else {
            return;
        };
        let Some(name) = self.title.as_deref() else {
            return;
        };
        self.store.save_conversation(&Conversation {
            id: id.to_string(),
            name: name.to_string(),
            messages: self.messages.clone(),
            last_updated: now_iso(),
        });
    }
}
