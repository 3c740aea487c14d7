//! Narrow interface over the mutable, path-addressed store.
//!
//! The storage engine itself is an external collaborator: it hashes content,
//! keeps blocks and maintains the mutable directory tree. This crate only
//! needs the handful of operations below.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::RwLock;
use snipshare_types::ContentId;

use crate::error::{FilesError, StoreError};

/// Lazy, finite, non-restartable sequence of byte chunks.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StoreError>>;

/// Result of `stat` on a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStat {
    pub content_id: ContentId,
    pub size: u64,
    pub is_directory: bool,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEntry {
    pub name: String,
    pub content_id: ContentId,
    pub size: u64,
    pub is_directory: bool,
}

/// Mutable, path-addressed view over content-addressed storage.
///
/// All paths are absolute. Every method may suspend.
#[async_trait]
pub trait VirtualFileStore: Send + Sync {
    /// Create a directory; its parent must already exist.
    async fn make_directory(&self, path: &str) -> Result<(), StoreError>;

    /// Write (or overwrite) a file from a stream of chunks.
    async fn write_content(&self, path: &str, content: ByteStream) -> Result<(), StoreError>;

    /// Resolve a path to its content id and size; missing paths yield
    /// [`StoreError::NotFound`].
    async fn stat(&self, path: &str) -> Result<StoreStat, StoreError>;

    /// List a directory, sorted by name.
    async fn list(&self, path: &str) -> Result<Vec<StoreEntry>, StoreError>;

    /// Remove a file or a whole directory.
    async fn remove(&self, path: &str) -> Result<(), StoreError>;
}

/// Read access to immutable content by id.
#[async_trait]
pub trait ContentReader: Send + Sync {
    /// Stream the bytes of a file.
    fn cat(&self, content_id: &ContentId) -> ByteStream;

    /// List a directory by its content id.
    async fn list_content(&self, content_id: &ContentId) -> Result<Vec<StoreEntry>, StoreError>;
}

/// Wrap an in-memory buffer as a single-chunk stream.
pub fn bytes_stream(data: Vec<u8>) -> ByteStream {
    stream::once(async move { Ok(data) }).boxed()
}

/// Drain a byte stream into one buffer.
pub async fn collect_bytes(mut content: ByteStream) -> Result<Vec<u8>, StoreError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = content.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer)
}

/// Join a directory path and a child name.
pub fn join_path(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{name}")
}

/// Stat a path, mapping `NotFound` to `false`.
pub async fn path_exists<S>(store: &S, path: &str) -> Result<bool, StoreError>
where
    S: VirtualFileStore + ?Sized,
{
    match store.stat(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

/// Slot holding the store once the storage engine has started.
///
/// Until [`StoreHandle::set_ready`] is called every access fails fast with
/// [`FilesError::StoreNotReady`]; callers can check [`StoreHandle::is_ready`]
/// to disable actions instead.
pub struct StoreHandle<S: ?Sized> {
    slot: Arc<RwLock<Option<Arc<S>>>>,
}

impl<S: ?Sized> Clone for StoreHandle<S> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<S: ?Sized> Default for StoreHandle<S> {
    fn default() -> Self {
        Self::starting()
    }
}

impl<S: ?Sized> StoreHandle<S> {
    /// A handle whose store is not available yet.
    pub fn starting() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    pub fn ready(store: Arc<S>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(store))),
        }
    }

    /// Publish the started store to every clone of this handle.
    pub fn set_ready(&self, store: Arc<S>) {
        *self.slot.write() = Some(store);
    }

    pub fn is_ready(&self) -> bool {
        self.slot.read().is_some()
    }

    pub fn get(&self) -> Result<Arc<S>, FilesError> {
        self.slot.read().clone().ok_or(FilesError::StoreNotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_path_handles_root() {
        assert_eq!(join_path("/", "a.txt"), "/a.txt");
        assert_eq!(join_path("/files-1", "a.txt"), "/files-1/a.txt");
        assert_eq!(join_path("/files-1/", "a.txt"), "/files-1/a.txt");
    }

    #[tokio::test]
    async fn collect_bytes_concatenates_chunks() {
        let chunks = stream::iter(vec![Ok(b"ab".to_vec()), Ok(b"cd".to_vec())]).boxed();
        assert_eq!(collect_bytes(chunks).await.expect("collect"), b"abcd".to_vec());
    }

    #[tokio::test]
    async fn collect_bytes_stops_at_first_error() {
        let chunks = stream::iter(vec![
            Ok(b"ab".to_vec()),
            Err(StoreError::Backend("disk gone".into())),
        ])
        .boxed();
        assert_eq!(
            collect_bytes(chunks).await,
            Err(StoreError::Backend("disk gone".into()))
        );
    }

    #[test]
    fn handle_becomes_ready_for_all_clones() {
        let handle: StoreHandle<String> = StoreHandle::starting();
        let clone = handle.clone();
        assert_eq!(clone.get(), Err(FilesError::StoreNotReady));

        handle.set_ready(Arc::new("store".to_string()));
        assert!(clone.is_ready());
        assert_eq!(clone.get().expect("ready").as_str(), "store");
    }
}
