//! Shared domain types for SnipShare.
//!
//! Content identifiers are minted by the store whenever a file or a directory
//! listing is written, and double as the public address of shared content.
//! File records describe user files nested inside their wrapping directory.

pub mod content_id;
pub mod file;
pub mod snippet;

pub use content_id::*;
pub use file::*;
pub use snippet::*;
