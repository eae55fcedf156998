pub mod config;
pub mod extract;
pub mod llm;
pub mod storage;
