//! Vector store creation and record upload.

mod service;
mod types;

pub use service::{
    UploadService, build_upload_payload, load_processed_data, load_store_id, save_store_id,
};
pub use types::{UploadEntry, UploadError};
