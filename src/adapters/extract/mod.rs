//! File-to-text extraction.
//!
//! Images go through the Tesseract OCR engine, PDFs through Poppler's
//! `pdftotext`; both are external binaries treated as opaque
//! converters. Extracted text is folded into a synthesized prompt that
//! flows through the normal send path.

use std::path::Path;

use futures::future::BoxFuture;
use tokio::process::Command;

use crate::core::ports::extract::{ExtractError, TextExtractor};

const TESSERACT: &str = "tesseract";
const PDFTOTEXT: &str = "pdftotext";

const DEFAULT_INSTRUCTION: &str = "summarize the key points.";

/// Separator between extracted PDF pages in the synthesized prompt.
const PAGE_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Pdf,
}

pub fn detect_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" => Some(FileKind::Image),
        "pdf" => Some(FileKind::Pdf),
        _ => None,
    }
}

pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Builds the prompt forwarded to the model after extraction. With no
/// user instruction a default one is appended.
pub fn synthesize_prompt(extracted: &str, instruction: Option<&str>) -> String {
    let instruction = instruction
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_INSTRUCTION);
    format!("Based on this text: '{}', {}", extracted.trim(), instruction)
}

/// `pdftotext` marks page boundaries with form feeds; normalize them
/// into a plain blank-line separator and drop empty trailing pages.
fn join_pages(raw: &str) -> String {
    raw.split('\u{c}')
        .map(str::trim)
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}

async fn run_tool(tool: &'static str, args: &[&str]) -> Result<String, ExtractError> {
    let output = Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|source| ExtractError::Launch { tool, source })?;
    if !output.status.success() {
        return Err(ExtractError::Failed {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub struct FileExtractors;

impl FileExtractors {
    pub fn new() -> Self {
        Self
    }

    /// Probes the external engines once at startup so a missing binary
    /// is reported before any conversation touches it.
    pub async fn missing_tools(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (tool, probe_arg) in [(TESSERACT, "--version"), (PDFTOTEXT, "-v")] {
            if Command::new(tool).arg(probe_arg).output().await.is_err() {
                missing.push(tool);
            }
        }
        missing
    }

    async fn ocr_image(&self, path: &Path) -> Result<String, ExtractError> {
        let path_arg = path.to_string_lossy();
        let text = run_tool(TESSERACT, &[path_arg.as_ref(), "stdout", "-l", "eng"]).await?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(ExtractError::NoText(path.display().to_string()));
        }
        Ok(text)
    }

    async fn pdf_text(&self, path: &Path) -> Result<String, ExtractError> {
        let path_arg = path.to_string_lossy();
        let raw = run_tool(PDFTOTEXT, &["-layout", path_arg.as_ref(), "-"]).await?;
        let text = join_pages(&raw);
        if text.is_empty() {
            return Err(ExtractError::NoText(path.display().to_string()));
        }
        Ok(text)
    }
}

impl Default for FileExtractors {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for FileExtractors {
    fn extract<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<String, ExtractError>> {
        Box::pin(async move {
            match detect_kind(path) {
                Some(FileKind::Image) => self.ocr_image(path).await,
                Some(FileKind::Pdf) => self.pdf_text(path).await,
                None => Err(ExtractError::UnsupportedType(path.display().to_string())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn prompt_synthesis_uses_default_instruction_when_absent() {
        let prompt = synthesize_prompt("lab results\n", None);
        assert_eq!(
            prompt,
            "Based on this text: 'lab results', summarize the key points."
        );
    }

    #[test]
    fn prompt_synthesis_keeps_user_instruction() {
        let prompt = synthesize_prompt("lab results", Some("explain the glucose value"));
        assert_eq!(
            prompt,
            "Based on this text: 'lab results', explain the glucose value"
        );
        // Blank instructions fall back to the default.
        assert!(synthesize_prompt("x", Some("  ")).ends_with(DEFAULT_INSTRUCTION));
    }

    #[test]
    fn kind_detection_covers_images_and_pdf_only() {
        assert_eq!(detect_kind(&PathBuf::from("scan.JPG")), Some(FileKind::Image));
        assert_eq!(detect_kind(&PathBuf::from("report.pdf")), Some(FileKind::Pdf));
        assert_eq!(detect_kind(&PathBuf::from("notes.docx")), None);
        assert_eq!(detect_kind(&PathBuf::from("no_extension")), None);
    }

    #[test]
    fn pages_are_joined_in_order_with_separator() {
        let raw = "page one\u{c}page two\u{c}\u{c}";
        assert_eq!(join_pages(raw), "page one\n\npage two");
    }

    #[test]
    fn mime_mapping_matches_extension() {
        assert_eq!(mime_type(&PathBuf::from("a.png")), "image/png");
        assert_eq!(mime_type(&PathBuf::from("a.pdf")), "application/pdf");
        assert_eq!(mime_type(&PathBuf::from("a.bin")), "application/octet-stream");
    }

    #[tokio::test]
    async fn unsupported_type_is_rejected_at_the_boundary() {
        let extractors = FileExtractors::new();
        let err = extractors
            .extract(&PathBuf::from("notes.docx"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType(_)));
    }
}
