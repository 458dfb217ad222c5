//! Raw document text loading.
//!
//! Plain text files and stdin are read directly. PDFs are handed to the
//! external `pdftotext` tool; its output is treated as opaque text.

use crate::command::CommandExecutor;
use crate::defaults::PDFTOTEXT_BINARY;
use crate::error::{RehearseError, Result};
use std::io::Read;
use std::path::Path;

/// Where a document's text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentSource<'a> {
    Stdin,
    Text(&'a Path),
    Pdf(&'a Path),
}

impl<'a> DocumentSource<'a> {
    /// Classify a path. `-` means stdin; a `.pdf` extension (any case) means PDF.
    pub fn from_path(path: &'a Path) -> Self {
        if path.as_os_str() == "-" {
            return Self::Stdin;
        }
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf { Self::Pdf(path) } else { Self::Text(path) }
    }
}

/// Load document text, rejecting documents with no readable text at all.
pub fn load_document(path: &Path, executor: &dyn CommandExecutor) -> Result<String> {
    let text = match DocumentSource::from_path(path) {
        DocumentSource::Stdin => read_stdin()?,
        DocumentSource::Text(path) => {
            std::fs::read_to_string(path).map_err(|e| RehearseError::DocumentRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?
        }
        DocumentSource::Pdf(path) => extract_pdf_text(path, executor)?,
    };

    if text.trim().is_empty() {
        return Err(RehearseError::DocumentEmpty);
    }

    tracing::debug!(bytes = text.len(), "loaded document text");
    Ok(text)
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .lock()
        .read_to_string(&mut buffer)
        .map_err(|e| RehearseError::DocumentRead {
            path: "<stdin>".to_string(),
            message: e.to_string(),
        })?;
    Ok(buffer)
}

/// Run `pdftotext -layout <file> -` and join pages with newlines.
fn extract_pdf_text(path: &Path, executor: &dyn CommandExecutor) -> Result<String> {
    let path_str = path.to_string_lossy();
    let stdout = executor
        .execute(PDFTOTEXT_BINARY, &["-layout", &path_str, "-"])
        .map_err(|e| match e {
            RehearseError::ToolNotFound { tool } => RehearseError::ToolFailed {
                tool,
                message: "not installed. Install poppler-utils:\n\
                    Ubuntu/Debian: sudo apt install poppler-utils\n\
                    Arch: sudo pacman -S poppler"
                    .to_string(),
            },
            other => other,
        })?;

    // pdftotext separates pages with form feeds
    Ok(String::from_utf8_lossy(&stdout).replace('\u{c}', "\n"))
}
