//! Directory-wrapped ingest of user files and snippets.
//!
//! Content addressing loses filenames, so every ingest creates a fresh
//! directory at the store root and writes the files inside it. The directory
//! id is what gets shared.

use std::sync::Arc;

use chrono::Utc;
use snipshare_types::{AddFileState, ContentId};
use tracing::{debug, info};

use crate::actions::FilesAction;
use crate::dispatch::FilesDispatch;
use crate::error::{FilesError, Result};
use crate::store::{bytes_stream, join_path, StoreHandle, VirtualFileStore};
use crate::unique_name::resolve_in_store;

/// Directory prefix for a single snippet.
pub const SNIPPET_DIR_PREFIX: &str = "file";
/// Directory prefix for a batch of files.
pub const BATCH_DIR_PREFIX: &str = "files";

const STORE_ROOT: &str = "/";

/// An in-memory file waiting to be ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestFile {
    pub name: String,
    pub content: Vec<u8>,
}

impl IngestFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Outcome of a completed ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    pub dir_name: String,
    /// Id of the wrapping directory.
    pub content_id: ContentId,
    /// Per-file states, in ingest order, with resolved names.
    pub files: Vec<AddFileState>,
}

/// Writes files into freshly created wrapping directories.
pub struct FileIngestSession<S: VirtualFileStore + ?Sized> {
    store: StoreHandle<S>,
    dispatch: Arc<dyn FilesDispatch>,
}

impl<S: VirtualFileStore + ?Sized> FileIngestSession<S> {
    pub fn new(store: StoreHandle<S>, dispatch: Arc<dyn FilesDispatch>) -> Self {
        Self { store, dispatch }
    }

    /// False while the store is starting; ingest calls would fail.
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// Ingest several files into one `files-<ms>` directory.
    pub async fn add_files(&self, files: Vec<IngestFile>) -> Result<IngestReceipt> {
        self.ingest(BATCH_DIR_PREFIX, files).await
    }

    /// Ingest one text snippet into its own `file-<ms>` directory.
    pub async fn add_snippet(&self, code: &str, filename: &str) -> Result<IngestReceipt> {
        self.ingest(
            SNIPPET_DIR_PREFIX,
            vec![IngestFile::new(filename, code.as_bytes())],
        )
        .await
    }

    async fn ingest(&self, prefix: &str, files: Vec<IngestFile>) -> Result<IngestReceipt> {
        let store = self.store.get()?;
        if files.is_empty() {
            return Err(FilesError::EmptyBatch);
        }
        for file in &files {
            validate_file_name(&file.name)?;
        }

        let desired_dir = format!("{prefix}-{}", Utc::now().timestamp_millis());
        let dir_name = resolve_in_store(store.as_ref(), STORE_ROOT, &desired_dir).await?;
        let dir_path = join_path(STORE_ROOT, &dir_name);
        store
            .make_directory(&dir_path)
            .await
            .map_err(|source| FilesError::WriteFailure {
                path: dir_path.clone(),
                source,
            })?;
        debug!(dir = %dir_path, count = files.len(), "wrapping directory created");

        let mut added = Vec::with_capacity(files.len());
        for file in files {
            let name = resolve_in_store(store.as_ref(), &dir_path, &file.name).await?;
            let path = join_path(&dir_path, &name);
            let size = file.content.len() as u64;

            store
                .write_content(&path, bytes_stream(file.content))
                .await
                .map_err(|source| FilesError::WriteFailure {
                    path: path.clone(),
                    source,
                })?;

            let stat = store.stat(&path).await?;
            let state = AddFileState::started(stat.content_id, name, size);
            self.dispatch.dispatch(FilesAction::AddStart(state.clone()));
            added.push(state);
        }

        let dir = store.stat(&dir_path).await?;
        self.dispatch.dispatch(FilesAction::AddSuccess {
            id: dir.content_id.to_string(),
            content_id: dir.content_id.clone(),
        });
        info!(dir = %dir_path, content_id = %dir.content_id, files = added.len(), "ingest complete");

        Ok(IngestReceipt {
            dir_name,
            content_id: dir.content_id,
            files: added,
        })
    }
}

/// Reject names that cannot live inside a wrapping directory.
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(FilesError::InvalidFileName {
            name: name.to_string(),
        });
    }
    Ok(())
}
