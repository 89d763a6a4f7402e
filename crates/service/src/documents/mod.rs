//! Professional verification documents: storage and the verify/reject workflow.

pub mod service;
pub mod store;

pub use service::{DocumentService, UploadPolicy, UploadedDocument, UploadedFile};
pub use store::{FileStore, LocalFileStore};
