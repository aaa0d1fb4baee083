//! Reading and writing processed record files.

use super::types::{IngestError, Record};
use std::fs;
use std::path::Path;

/// Write records as a pretty-printed JSON array, keeping non-ASCII text verbatim.
pub fn save_records(path: &Path, records: &[Record]) -> Result<(), IngestError> {
    let json = serde_json::to_string_pretty(records).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), records = records.len(), "Saved records");
    Ok(())
}

/// Read a JSON array of records.
pub fn load_records(path: &Path) -> Result<Vec<Record>, IngestError> {
    let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })
}
