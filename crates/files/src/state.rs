use std::collections::BTreeMap;

use snipshare_types::{AddFileState, ContentId, PROGRESS_COMPLETE};
use tracing::debug;

use crate::actions::{FetchRequest, FilesAction};

/// Files tracked by the local session, keyed by [`AddFileState::id`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilesState {
    pub files: BTreeMap<String, AddFileState>,
    pub files_to_fetch: Vec<FetchRequest>,
    /// Directory id of the last completed ingest or retrieval.
    pub shared_dir: Option<ContentId>,
    /// Message of the last failed retrieval.
    pub fetch_error: Option<String>,
}

impl FilesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one transition.
    pub fn apply(&mut self, action: FilesAction) {
        debug!(action = action.kind(), "applying files action");
        match action {
            FilesAction::AddStart(file) => {
                self.files.insert(file.id.clone(), file);
            }
            FilesAction::AddSuccess { content_id, .. } => {
                for file in self.files.values_mut().filter(|file| !file.is_complete()) {
                    file.progress = PROGRESS_COMPLETE;
                    file.published = true;
                }
                self.shared_dir = Some(content_id);
            }
            FilesAction::ResetFiles => {
                self.files.clear();
                self.files_to_fetch.clear();
                self.shared_dir = None;
                self.fetch_error = None;
            }
            FilesAction::FetchStart(request) => {
                self.fetch_error = None;
                self.files_to_fetch
                    .retain(|pending| pending.content_id != request.content_id);
                self.files_to_fetch.push(request);
            }
            FilesAction::FetchSuccess { content_id, files } => {
                self.files_to_fetch
                    .retain(|pending| pending.content_id != content_id);
                for file in files {
                    self.files.insert(file.id.clone(), file);
                }
                self.shared_dir = Some(content_id);
            }
            FilesAction::FetchFail { content_id, error } => {
                self.files_to_fetch
                    .retain(|pending| pending.content_id != content_id);
                self.fetch_error = Some(error);
            }
            FilesAction::PublishResetDir => {
                self.shared_dir = None;
            }
        }
    }

    /// True while a retrieval is pending or nothing has arrived yet.
    pub fn is_loading(&self) -> bool {
        !self.files_to_fetch.is_empty() || (self.files.is_empty() && self.fetch_error.is_none())
    }
}
