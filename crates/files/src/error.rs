//! Error types for the files crate.

use thiserror::Error;

/// Failures reported by a [`VirtualFileStore`](crate::VirtualFileStore) or
/// [`ContentReader`](crate::ContentReader).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("path already exists: {path}")]
    AlreadyExists { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("invalid path '{path}': paths must be absolute")]
    InvalidPath { path: String },

    #[error("the store root cannot be removed")]
    RootRemoval,

    #[error("unknown content: {content_id}")]
    UnknownContent { content_id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors surfaced by ingest, listing and deletion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilesError {
    #[error("store is still initializing, please wait")]
    StoreNotReady,

    #[error("invalid file name: {name:?}")]
    InvalidFileName { name: String },

    #[error("nothing to add: the batch is empty")]
    EmptyBatch,

    #[error("failed to write {path}: {source}")]
    WriteFailure {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete {path}: {source}")]
    DeleteFailure {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, FilesError>;
