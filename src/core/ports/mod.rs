pub mod extract;
pub mod llm;
pub mod store;
