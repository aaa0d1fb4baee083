//! Types shared by the document extractors.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading office documents.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file could not be read from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file was read but its contents could not be parsed.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
    /// The extension is not one of the supported office formats.
    #[error("unsupported file type: {}", .path.display())]
    UnsupportedFileType {
        /// Rejected file.
        path: PathBuf,
    },
}

/// Office formats the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Word processor document.
    Docx,
    /// Spreadsheet workbook.
    Xlsx,
}

impl FileType {
    /// Classify a path by its extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    /// Lowercase identifier stored in record metadata.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Plain text pulled out of a single office document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    /// File name without directories.
    pub file_name: String,
    /// Detected format.
    pub file_type: FileType,
    /// Normalized text content.
    pub text: String,
    /// Sheet names in workbook order; empty for word processor files.
    pub sheets: Vec<String>,
}

pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("unknown")
        .to_string()
}
