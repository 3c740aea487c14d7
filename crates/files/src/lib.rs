//! SnipShare file handling.
//!
//! User files are written into uniquely named wrapping directories on a
//! mutable, path-addressed store so their names survive content addressing.
//! The directory id is what gets shared; retrieval lists it back by id.
//! Every state change is reported as a [`FilesAction`] to an injected
//! [`FilesDispatch`] sink.

pub mod actions;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod manager;
pub mod memory;
pub mod state;
pub mod store;
pub mod unique_name;

pub use actions::{FetchRequest, FilesAction};
pub use dispatch::{ActionLog, ChannelDispatch, FanoutDispatch, FilesDispatch, StateDispatch};
pub use error::{FilesError, Result, StoreError};
pub use fetch::{fetch_shared, read_text, Retriever};
pub use ingest::{validate_file_name, FileIngestSession, IngestFile, IngestReceipt};
pub use manager::{DeleteReport, FileManager};
pub use memory::{MemoryFileStore, DEFAULT_CHUNK_SIZE};
pub use state::FilesState;
pub use store::{
    bytes_stream, collect_bytes, join_path, path_exists, ByteStream, ContentReader, StoreEntry,
    StoreHandle, StoreStat, VirtualFileStore,
};
pub use unique_name::{candidates, resolve_in_store, resolve_unique_name};
