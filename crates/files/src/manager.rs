//! Listing and deletion of locally stored files.

use std::sync::Arc;

use snipshare_types::FileEntry;
use tracing::{debug, info, warn};

use crate::actions::FilesAction;
use crate::dispatch::FilesDispatch;
use crate::error::{FilesError, Result};
use crate::fetch;
use crate::store::{join_path, ContentReader, StoreHandle, VirtualFileStore};

const STORE_ROOT: &str = "/";

/// Result of a delete: the reloaded listing plus the failure, if any.
///
/// The listing is always fresh so callers show what the store actually holds
/// even when only the first removal step succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    pub entries: Vec<FileEntry>,
    pub error: Option<FilesError>,
}

pub struct FileManager<S: VirtualFileStore + ?Sized> {
    store: StoreHandle<S>,
    dispatch: Arc<dyn FilesDispatch>,
}

impl<S: VirtualFileStore + ?Sized> FileManager<S> {
    pub fn new(store: StoreHandle<S>, dispatch: Arc<dyn FilesDispatch>) -> Self {
        Self { store, dispatch }
    }

    /// Every file inside every wrapping directory at the store root.
    ///
    /// Directories that cannot be listed are skipped with a warning.
    pub async fn list_entries(&self) -> Result<Vec<FileEntry>> {
        let store = self.store.get()?;
        let mut entries = Vec::new();

        for dir in store.list(STORE_ROOT).await? {
            if !dir.is_directory {
                continue;
            }
            let dir_path = join_path(STORE_ROOT, &dir.name);
            let files = match store.list(&dir_path).await {
                Ok(files) => files,
                Err(err) => {
                    warn!(dir = %dir_path, error = %err, "skipping unreadable directory");
                    continue;
                }
            };
            entries.extend(files.into_iter().filter(|f| !f.is_directory).map(|file| {
                FileEntry {
                    name: file.name,
                    dir_name: dir.name.clone(),
                    file_content_id: file.content_id,
                    dir_content_id: dir.content_id.clone(),
                    size: file.size,
                }
            }));
        }

        debug!(count = entries.len(), "listed stored files");
        Ok(entries)
    }

    /// Remove a file and then its wrapping directory.
    ///
    /// The two removals are not atomic; a failure between them leaves an empty
    /// directory behind, which [`FileManager::clear_all`] later sweeps.
    pub async fn delete(&self, entry: &FileEntry) -> Result<DeleteReport> {
        let store = self.store.get()?;

        let mut error = None;
        for path in [entry.file_path(), entry.dir_path()] {
            if let Err(source) = store.remove(&path).await {
                warn!(path = %path, error = %source, "delete failed");
                error = Some(FilesError::DeleteFailure { path, source });
                break;
            }
        }

        let entries = self.list_entries().await?;
        if error.is_none() {
            info!(file = %entry.file_path(), "file deleted");
            self.dispatch.dispatch(FilesAction::PublishResetDir);
        }
        Ok(DeleteReport { entries, error })
    }

    /// Remove every wrapping directory, including empty orphans.
    ///
    /// Returns the number of directories removed.
    pub async fn clear_all(&self) -> Result<usize> {
        let store = self.store.get()?;
        let mut removed = 0;

        for dir in store.list(STORE_ROOT).await? {
            if !dir.is_directory {
                continue;
            }
            let dir_path = join_path(STORE_ROOT, &dir.name);
            for file in store.list(&dir_path).await? {
                let path = join_path(&dir_path, &file.name);
                store
                    .remove(&path)
                    .await
                    .map_err(|source| FilesError::DeleteFailure { path, source })?;
            }
            store
                .remove(&dir_path)
                .await
                .map_err(|source| FilesError::DeleteFailure {
                    path: dir_path.clone(),
                    source,
                })?;
            removed += 1;
        }

        self.dispatch.dispatch(FilesAction::ResetFiles);
        info!(directories = removed, "cleared all files");
        Ok(removed)
    }
}

impl<S: VirtualFileStore + ContentReader + ?Sized> FileManager<S> {
    /// Text of a stored file, e.g. to build an edit link.
    pub async fn read_text(&self, entry: &FileEntry) -> Result<String> {
        let store = self.store.get()?;
        Ok(fetch::read_text(store.as_ref(), &entry.file_content_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::ActionLog;
    use crate::ingest::FileIngestSession;
    use crate::memory::MemoryFileStore;
    use crate::store::bytes_stream;

    struct Fixture {
        store: Arc<MemoryFileStore>,
        ingest: FileIngestSession<MemoryFileStore>,
        manager: FileManager<MemoryFileStore>,
        log: ActionLog,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryFileStore::new());
        let handle = StoreHandle::ready(Arc::clone(&store));
        let log = ActionLog::new();
        Fixture {
            ingest: FileIngestSession::new(handle.clone(), Arc::new(log.clone())),
            manager: FileManager::new(handle, Arc::new(log.clone())),
            store,
            log,
        }
    }

    #[tokio::test]
    async fn lists_files_with_their_directory_ids() {
        let fx = fixture();
        let receipt = fx.ingest.add_snippet("SELECT 1;", "q.sql").await.expect("add");

        let entries = fx.manager.list_entries().await.expect("list");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "q.sql");
        assert_eq!(entries[0].dir_name, receipt.dir_name);
        assert_eq!(entries[0].dir_content_id, receipt.content_id);
        assert_eq!(entries[0].file_content_id, receipt.files[0].content_id);
        assert_eq!(
            fx.manager.read_text(&entries[0]).await.expect("read"),
            "SELECT 1;"
        );
    }

    #[tokio::test]
    async fn delete_removes_file_and_directory() {
        let fx = fixture();
        fx.ingest.add_snippet("a", "a.txt").await.expect("add");
        fx.ingest.add_snippet("b", "b.txt").await.expect("add");
        fx.log.take();

        let entries = fx.manager.list_entries().await.expect("list");
        let report = fx.manager.delete(&entries[0]).await.expect("delete");

        assert_eq!(report.error, None);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(fx.log.take(), vec![FilesAction::PublishResetDir]);
    }

    #[tokio::test]
    async fn failed_delete_still_reloads() {
        let fx = fixture();
        fx.ingest.add_snippet("a", "a.txt").await.expect("add");
        let mut entry = fx.manager.list_entries().await.expect("list").remove(0);
        fx.log.take();

        entry.name = "missing.txt".into();
        let report = fx.manager.delete(&entry).await.expect("delete");

        assert!(matches!(report.error, Some(FilesError::DeleteFailure { .. })));
        assert_eq!(report.entries.len(), 1);
        assert!(fx.log.take().is_empty());
    }

    #[tokio::test]
    async fn clear_all_sweeps_orphan_directories() {
        let fx = fixture();
        fx.ingest.add_snippet("a", "a.txt").await.expect("add");
        fx.store.make_directory("/files-orphan").await.expect("mkdir");
        fx.store
            .write_content("/loose.txt", bytes_stream(b"loose".to_vec()))
            .await
            .expect("write");
        fx.log.take();

        assert_eq!(fx.manager.clear_all().await.expect("clear"), 2);
        assert!(fx.manager.list_entries().await.expect("list").is_empty());
        assert_eq!(fx.log.take(), vec![FilesAction::ResetFiles]);
    }
}
