use std::path::Path;

use futures::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("could not launch {tool}: {source}")]
    Launch {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} failed: {stderr}")]
    Failed { tool: &'static str, stderr: String },
    #[error("no text could be extracted from {0}")]
    NoText(String),
}

/// File-to-text port. Adapters wrap opaque converters (OCR engine,
/// PDF text extraction); the session manager turns failures into a
/// generic in-conversation error.
pub trait TextExtractor: Send {
    fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ExtractError>>;
}
