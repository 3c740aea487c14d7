//! In-memory store: a mutable directory tree over an immutable block map.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use snipshare_types::{ContentId, CODEC_DAG_PB, CODEC_RAW};
use tracing::debug;

use crate::error::StoreError;
use crate::store::{collect_bytes, ByteStream, ContentReader, StoreEntry, StoreStat, VirtualFileStore};

/// Default chunk size used when streaming file bytes back out.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// In-memory implementation of [`VirtualFileStore`] and [`ContentReader`]
/// (for tests and single-process use).
///
/// Files are addressed by the BLAKE3 hash of their bytes; directories by the
/// hash of their sorted listing, so identical trees share ids. Every block
/// ever computed stays readable by id, even after the tree moves on.
///
/// Blocks are never evicted: each distinct directory state that gets stat'ed
/// or listed adds one block, so memory grows with the history of the tree.
#[derive(Clone)]
pub struct MemoryFileStore {
    inner: Arc<MemoryFileStoreInner>,
}

struct MemoryFileStoreInner {
    /// Mutable path tree.
    root: RwLock<DirNode>,

    /// Immutable blocks: content id -> bytes or listing.
    blocks: RwLock<HashMap<ContentId, Block>>,

    chunk_size: usize,
}

#[derive(Debug, Clone, Default)]
struct DirNode {
    entries: BTreeMap<String, Node>,
}

#[derive(Debug, Clone)]
enum Node {
    File { content_id: ContentId, size: u64 },
    Directory(DirNode),
}

#[derive(Debug, Clone)]
enum Block {
    File(Arc<Vec<u8>>),
    Directory(Vec<StoreEntry>),
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a store that streams file bytes back in `chunk_size` pieces.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            inner: Arc::new(MemoryFileStoreInner {
                root: RwLock::new(DirNode::default()),
                blocks: RwLock::new(HashMap::new()),
                chunk_size: chunk_size.max(1),
            }),
        }
    }

    /// Number of immutable blocks currently retained.
    pub fn block_count(&self) -> usize {
        self.inner.blocks.read().len()
    }
}

impl Default for MemoryFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileStoreInner {
    /// Compute (and retain) the block for a directory.
    fn seal(&self, dir: &DirNode) -> (ContentId, u64) {
        let listing = self.listing(dir);
        let size = listing.iter().map(|entry| entry.size).sum();

        let mut encoded = Vec::new();
        for entry in &listing {
            encoded.extend_from_slice(entry.name.as_bytes());
            encoded.push(0);
            encoded.extend_from_slice(entry.content_id.as_str().as_bytes());
            encoded.push(0);
            encoded.extend_from_slice(&entry.size.to_le_bytes());
            encoded.push(u8::from(entry.is_directory));
        }

        let content_id = ContentId::blake3(CODEC_DAG_PB, &encoded);
        self.blocks
            .write()
            .insert(content_id.clone(), Block::Directory(listing));
        (content_id, size)
    }

    fn listing(&self, dir: &DirNode) -> Vec<StoreEntry> {
        dir.entries
            .iter()
            .map(|(name, node)| {
                let stat = self.stat_node(node);
                StoreEntry {
                    name: name.clone(),
                    content_id: stat.content_id,
                    size: stat.size,
                    is_directory: stat.is_directory,
                }
            })
            .collect()
    }

    fn stat_node(&self, node: &Node) -> StoreStat {
        match node {
            Node::File { content_id, size } => StoreStat {
                content_id: content_id.clone(),
                size: *size,
                is_directory: false,
            },
            Node::Directory(dir) => {
                let (content_id, size) = self.seal(dir);
                StoreStat {
                    content_id,
                    size,
                    is_directory: true,
                }
            }
        }
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    if !path.starts_with('/') {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
        });
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

fn find_dir<'a>(root: &'a DirNode, segments: &[&str], path: &str) -> Result<&'a DirNode, StoreError> {
    let mut current = root;
    for segment in segments {
        current = match current.entries.get(*segment) {
            Some(Node::Directory(dir)) => dir,
            Some(Node::File { .. }) => {
                return Err(StoreError::NotADirectory {
                    path: path.to_string(),
                })
            }
            None => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
        };
    }
    Ok(current)
}

fn find_dir_mut<'a>(
    root: &'a mut DirNode,
    segments: &[&str],
    path: &str,
) -> Result<&'a mut DirNode, StoreError> {
    let mut current = root;
    for segment in segments {
        current = match current.entries.get_mut(*segment) {
            Some(Node::Directory(dir)) => dir,
            Some(Node::File { .. }) => {
                return Err(StoreError::NotADirectory {
                    path: path.to_string(),
                })
            }
            None => {
                return Err(StoreError::NotFound {
                    path: path.to_string(),
                })
            }
        };
    }
    Ok(current)
}

#[async_trait]
impl VirtualFileStore for MemoryFileStore {
    async fn make_directory(&self, path: &str) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        };

        let mut root = self.inner.root.write();
        let parent = find_dir_mut(&mut root, parents, path)?;
        if parent.entries.contains_key(*name) {
            return Err(StoreError::AlreadyExists {
                path: path.to_string(),
            });
        }
        parent
            .entries
            .insert((*name).to_string(), Node::Directory(DirNode::default()));
        debug!(path, "directory created");
        Ok(())
    }

    async fn write_content(&self, path: &str, content: ByteStream) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(StoreError::IsADirectory {
                path: path.to_string(),
            });
        };

        // Fail before draining the stream if the parent is missing.
        find_dir(&self.inner.root.read(), parents, path)?;

        let bytes = collect_bytes(content).await?;
        let size = bytes.len() as u64;
        let content_id = ContentId::blake3(CODEC_RAW, &bytes);
        self.inner
            .blocks
            .write()
            .insert(content_id.clone(), Block::File(Arc::new(bytes)));

        let mut root = self.inner.root.write();
        let parent = find_dir_mut(&mut root, parents, path)?;
        if let Some(Node::Directory(_)) = parent.entries.get(*name) {
            return Err(StoreError::IsADirectory {
                path: path.to_string(),
            });
        }
        parent.entries.insert(
            (*name).to_string(),
            Node::File {
                content_id: content_id.clone(),
                size,
            },
        );
        debug!(path, %content_id, size, "file written");
        Ok(())
    }

    async fn stat(&self, path: &str) -> Result<StoreStat, StoreError> {
        let segments = split_path(path)?;
        let root = self.inner.root.read();
        let Some((name, parents)) = segments.split_last() else {
            let (content_id, size) = self.inner.seal(&root);
            return Ok(StoreStat {
                content_id,
                size,
                is_directory: true,
            });
        };

        let parent = find_dir(&root, parents, path)?;
        let node = parent.entries.get(*name).ok_or_else(|| StoreError::NotFound {
            path: path.to_string(),
        })?;
        Ok(self.inner.stat_node(node))
    }

    async fn list(&self, path: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let segments = split_path(path)?;
        let root = self.inner.root.read();
        let dir = find_dir(&root, &segments, path)?;
        Ok(self.inner.listing(dir))
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let segments = split_path(path)?;
        let Some((name, parents)) = segments.split_last() else {
            return Err(StoreError::RootRemoval);
        };

        let mut root = self.inner.root.write();
        let parent = find_dir_mut(&mut root, parents, path)?;
        parent
            .entries
            .remove(*name)
            .map(|_| debug!(path, "path removed"))
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_string(),
            })
    }
}

#[async_trait]
impl ContentReader for MemoryFileStore {
    fn cat(&self, content_id: &ContentId) -> ByteStream {
        let block = self.inner.blocks.read().get(content_id).cloned();
        let bytes = match block {
            Some(Block::File(bytes)) => bytes,
            Some(Block::Directory(_)) => {
                let err = StoreError::IsADirectory {
                    path: content_id.to_string(),
                };
                return stream::once(async move { Err(err) }).boxed();
            }
            None => {
                let err = StoreError::UnknownContent {
                    content_id: content_id.to_string(),
                };
                return stream::once(async move { Err(err) }).boxed();
            }
        };

        let chunk_size = self.inner.chunk_size;
        stream::unfold(0usize, move |offset| {
            let bytes = Arc::clone(&bytes);
            async move {
                if offset >= bytes.len() {
                    return None;
                }
                let end = (offset + chunk_size).min(bytes.len());
                Some((Ok(bytes[offset..end].to_vec()), end))
            }
        })
        .boxed()
    }

    async fn list_content(&self, content_id: &ContentId) -> Result<Vec<StoreEntry>, StoreError> {
        match self.inner.blocks.read().get(content_id) {
            Some(Block::Directory(listing)) => Ok(listing.clone()),
            Some(Block::File(_)) => Err(StoreError::NotADirectory {
                path: content_id.to_string(),
            }),
            None => Err(StoreError::UnknownContent {
                content_id: content_id.to_string(),
            }),
        }
    }
}
