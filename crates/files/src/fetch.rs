//! Retrieval of shared content by id.

use std::sync::Arc;

use snipshare_types::{AddFileState, ContentId};
use tracing::{debug, warn};

use crate::actions::{FetchRequest, FilesAction};
use crate::dispatch::FilesDispatch;
use crate::error::StoreError;
use crate::store::{collect_bytes, ContentReader};

/// Read a whole file and decode it as UTF-8, replacing invalid sequences.
pub async fn read_text<R>(reader: &R, content_id: &ContentId) -> Result<String, StoreError>
where
    R: ContentReader + ?Sized,
{
    let bytes = collect_bytes(reader.cat(content_id)).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Resolve a shared id to its files.
///
/// A shared id normally addresses a wrapping directory; a bare file id is
/// accepted too and yields one nameless entry.
pub async fn fetch_shared<R>(reader: &R, content_id: &ContentId) -> Result<Vec<AddFileState>, StoreError>
where
    R: ContentReader + ?Sized,
{
    match reader.list_content(content_id).await {
        Ok(listing) => Ok(listing
            .into_iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| AddFileState::fetched(entry.content_id, entry.name, entry.size))
            .collect()),
        Err(StoreError::NotADirectory { .. }) => {
            let bytes = collect_bytes(reader.cat(content_id)).await?;
            Ok(vec![AddFileState::fetched(
                content_id.clone(),
                content_id.to_string(),
                bytes.len() as u64,
            )])
        }
        Err(err) => Err(err),
    }
}

/// Runs [`FetchRequest`]s against a reader and reports the outcome.
pub struct Retriever<R: ContentReader + ?Sized> {
    reader: Arc<R>,
    dispatch: Arc<dyn FilesDispatch>,
}

impl<R: ContentReader + ?Sized> Retriever<R> {
    pub fn new(reader: Arc<R>, dispatch: Arc<dyn FilesDispatch>) -> Self {
        Self { reader, dispatch }
    }

    /// Resolve the request, dispatching `FetchSuccess` or `FetchFail`.
    ///
    /// Dropping the returned future abandons the retrieval.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Vec<AddFileState>, StoreError> {
        debug!(
            content_id = %request.content_id,
            providers = request.providers.len(),
            "fetching shared content"
        );
        match fetch_shared(self.reader.as_ref(), &request.content_id).await {
            Ok(files) => {
                self.dispatch.dispatch(FilesAction::FetchSuccess {
                    content_id: request.content_id.clone(),
                    files: files.clone(),
                });
                Ok(files)
            }
            Err(err) => {
                warn!(content_id = %request.content_id, error = %err, "fetch failed");
                self.dispatch.dispatch(FilesAction::FetchFail {
                    content_id: request.content_id.clone(),
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::StateDispatch;
    use crate::memory::MemoryFileStore;
    use crate::store::{bytes_stream, VirtualFileStore};
    use snipshare_types::CODEC_RAW;

    async fn shared_dir(store: &MemoryFileStore) -> ContentId {
        store.make_directory("/files-1").await.expect("mkdir");
        for (name, body) in [("a.py", "print(1)"), ("b.py", "print(2)")] {
            store
                .write_content(&format!("/files-1/{name}"), bytes_stream(body.into()))
                .await
                .expect("write");
        }
        store.stat("/files-1").await.expect("stat").content_id
    }

    fn request(content_id: ContentId) -> FetchRequest {
        FetchRequest {
            content_id,
            filename: String::new(),
            providers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn lossy_decoding_keeps_valid_text() {
        let store = MemoryFileStore::new();
        store.make_directory("/d").await.expect("mkdir");
        store
            .write_content("/d/bin", bytes_stream(vec![b'o', b'k', 0xff]))
            .await
            .expect("write");
        let id = store.stat("/d/bin").await.expect("stat").content_id;
        assert_eq!(read_text(&store, &id).await.expect("read"), "ok\u{fffd}");
    }

    #[tokio::test]
    async fn retriever_dispatches_success() {
        let store = Arc::new(MemoryFileStore::with_chunk_size(3));
        let dir = shared_dir(&store).await;
        let state = StateDispatch::new();
        let retriever = Retriever::new(Arc::clone(&store), Arc::new(state.clone()));

        let files = retriever.fetch(&request(dir.clone())).await.expect("fetch");
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.is_complete() && f.published));

        let snapshot = state.snapshot();
        assert_eq!(snapshot.files.len(), 2);
        assert_eq!(snapshot.shared_dir, Some(dir));
        assert_eq!(read_text(store.as_ref(), &files[1].content_id).await.expect("read"), "print(2)");
    }

    #[tokio::test]
    async fn file_ids_are_accepted() {
        let store = MemoryFileStore::new();
        shared_dir(&store).await;
        let file = store.stat("/files-1/a.py").await.expect("stat").content_id;

        let files = fetch_shared(&store, &file).await.expect("fetch");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 8);
    }

    #[tokio::test]
    async fn unknown_content_dispatches_failure() {
        let store = Arc::new(MemoryFileStore::new());
        let state = StateDispatch::new();
        let retriever = Retriever::new(store, Arc::new(state.clone()));

        let missing = ContentId::blake3(CODEC_RAW, b"nobody has this");
        assert!(retriever.fetch(&request(missing)).await.is_err());
        assert!(state.snapshot().fetch_error.is_some());
    }
}
