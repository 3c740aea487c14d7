//! Events emitted by ingest, deletion and retrieval.

use snipshare_p2p::Multiaddr;
use snipshare_types::{AddFileState, ContentId};

/// A pending retrieval of shared content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub content_id: ContentId,
    /// Empty until the shared directory has been listed.
    pub filename: String,
    /// Peers advertised by the share link, possibly none.
    pub providers: Vec<Multiaddr>,
}

/// Closed set of state transitions, consumed by
/// [`FilesState::apply`](crate::FilesState::apply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesAction {
    /// A file was written and stat'ed inside its wrapping directory.
    AddStart(AddFileState),
    /// Every file of an ingest was written; `content_id` is the directory id.
    AddSuccess { id: String, content_id: ContentId },
    /// Forget all tracked files and pending fetches.
    ResetFiles,
    FetchStart(FetchRequest),
    FetchSuccess {
        content_id: ContentId,
        files: Vec<AddFileState>,
    },
    FetchFail {
        content_id: ContentId,
        error: String,
    },
    /// The shared directory was deleted; stop advertising it.
    PublishResetDir,
}

impl FilesAction {
    /// Short, stable label used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            FilesAction::AddStart(_) => "add_start",
            FilesAction::AddSuccess { .. } => "add_success",
            FilesAction::ResetFiles => "reset_files",
            FilesAction::FetchStart(_) => "fetch_start",
            FilesAction::FetchSuccess { .. } => "fetch_success",
            FilesAction::FetchFail { .. } => "fetch_fail",
            FilesAction::PublishResetDir => "publish_reset_dir",
        }
    }
}
