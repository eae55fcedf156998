use crate::core::types::{Conversation, UserProfile};

/// Persistence port over the local key-value store.
///
/// Every operation fails closed: adapters log and return the empty
/// case instead of surfacing storage errors to the session layer.
pub trait ConversationStore: Send {
    /// Overwrites any record stored under the same id.
    fn save_conversation(&self, conversation: &Conversation);
    fn load_conversation(&self, id: &str) -> Option<Conversation>;
    /// Idempotent; deleting an absent record is not an error.
    fn delete_conversation(&self, id: &str);
    /// All stored conversations, newest first. Records that no longer
    /// deserialize are purged rather than surfaced.
    fn list_conversations(&self) -> Vec<Conversation>;

    fn save_profile(&self, profile: &UserProfile);
    fn load_profile(&self) -> Option<UserProfile>;
    fn clear_profile(&self);

    /// Removes every conversation record and the profile ("delete my
    /// data"). Keys outside this crate's namespace are left alone.
    fn clear_all(&self);
}
