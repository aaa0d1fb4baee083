//! Office document to text conversion.

mod docx;
mod types;
mod xlsx;

pub use docx::extract_docx;
pub use types::{ExtractError, ExtractedDocument, FileType};
pub use xlsx::{Grid, extract_xlsx, flatten_sheet};

use std::path::Path;

/// Extract text from a supported office document, dispatching on the file extension.
pub fn extract_file(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    match FileType::from_path(path) {
        Some(FileType::Docx) => extract_docx(path),
        Some(FileType::Xlsx) => extract_xlsx(path),
        None => Err(ExtractError::UnsupportedFileType {
            path: path.to_path_buf(),
        }),
    }
}
