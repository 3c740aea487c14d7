use crate::ContentId;
use serde::{Deserialize, Serialize};

/// Progress value of an add that has been written but not yet acknowledged.
pub const PROGRESS_STARTED: u8 = 0;
/// Progress value of a finished add or a fetched file.
pub const PROGRESS_COMPLETE: u8 = 100;

/// One user file nested inside its wrapping directory.
///
/// `dir_content_id` addresses the directory holding exactly the files that
/// were added together; it is the id that gets shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Filename inside the wrapping directory.
    pub name: String,
    /// Name of the wrapping directory at the store root.
    pub dir_name: String,
    pub file_content_id: ContentId,
    pub dir_content_id: ContentId,
    /// File size in bytes.
    pub size: u64,
}

impl FileEntry {
    /// Absolute path of the file in the mutable store.
    pub fn file_path(&self) -> String {
        format!("/{}/{}", self.dir_name, self.name)
    }

    /// Absolute path of the wrapping directory.
    pub fn dir_path(&self) -> String {
        format!("/{}", self.dir_name)
    }
}

/// Projection of an in-flight or completed add, or of a fetched file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFileState {
    /// Stringified content id.
    pub id: String,
    pub name: String,
    pub size: u64,
    /// Either [`PROGRESS_STARTED`] or [`PROGRESS_COMPLETE`].
    pub progress: u8,
    pub content_id: ContentId,
    pub published: bool,
}

impl AddFileState {
    /// State for a file that was just written.
    pub fn started(content_id: ContentId, name: impl Into<String>, size: u64) -> Self {
        Self {
            id: content_id.to_string(),
            name: name.into(),
            size,
            progress: PROGRESS_STARTED,
            content_id,
            published: false,
        }
    }

    /// State for a file that was retrieved from a share link.
    pub fn fetched(content_id: ContentId, name: impl Into<String>, size: u64) -> Self {
        Self {
            progress: PROGRESS_COMPLETE,
            published: true,
            ..Self::started(content_id, name, size)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress == PROGRESS_COMPLETE
    }
}

/// Render a byte count with binary units, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CODEC_RAW;

    #[test]
    fn started_state_uses_content_id_as_id() {
        let id = ContentId::blake3(CODEC_RAW, b"print('hi')");
        let state = AddFileState::started(id.clone(), "hi.py", 11);

        assert_eq!(state.id, id.to_string());
        assert_eq!(state.progress, PROGRESS_STARTED);
        assert!(!state.published);
        assert!(!state.is_complete());
    }

    #[test]
    fn fetched_state_is_complete_and_published() {
        let id = ContentId::blake3(CODEC_RAW, b"x");
        let state = AddFileState::fetched(id, "x.txt", 1);
        assert!(state.is_complete());
        assert!(state.published);
    }

    #[test]
    fn entry_paths_are_absolute() {
        let id = ContentId::blake3(CODEC_RAW, b"x");
        let entry = FileEntry {
            name: "main.rs".into(),
            dir_name: "file-1700000000000".into(),
            file_content_id: id.clone(),
            dir_content_id: id,
            size: 1,
        };
        assert_eq!(entry.file_path(), "/file-1700000000000/main.rs");
        assert_eq!(entry.dir_path(), "/file-1700000000000");
    }

    #[test]
    fn bytes_are_formatted_with_binary_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5 GB");
    }
}
