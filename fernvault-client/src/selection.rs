//! File selection for an upload area.
//!
//! The native picker and drag-and-drop converge on the same slot: both go
//! through [`UploadArea::handle`] and produce the same [`FileInfoPanel`].

use crate::error::SubmitError;
use crate::types::{FileSource, SelectedFile};
use std::path::Path;
use tracing::debug;

const SIZE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

/// Formats a byte count with binary prefixes (1024 B = 1 KB), rounded to two
/// decimals with trailing zeros dropped: `0 Bytes`, `1.5 KB`, `50 MB`.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", SIZE_UNITS[unit])
}

/// Rejects files above `limit` bytes.
pub fn check_size(file: &SelectedFile, limit: u64) -> Result<(), SubmitError> {
    if file.size_bytes > limit {
        return Err(SubmitError::FileTooLarge { limit });
    }
    Ok(())
}

/// Reads name, size and guessed MIME type for a file on disk.
pub async fn file_from_path(path: &Path) -> std::io::Result<SelectedFile> {
    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a regular file", path.display()),
        ));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or_default()
        .to_string();

    Ok(SelectedFile {
        name,
        size_bytes: metadata.len(),
        mime_type,
        source: FileSource::Disk(path.to_path_buf()),
    })
}

/// Confirmation shown under an upload area once a file is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfoPanel {
    /// `name (size)`
    pub headline: String,
    pub type_line: String,
    pub size_line: String,
}

impl FileInfoPanel {
    pub fn for_file(file: &SelectedFile) -> Self {
        let size = format_file_size(file.size_bytes);
        let mime = if file.mime_type.is_empty() {
            "Unknown"
        } else {
            file.mime_type.as_str()
        };
        Self {
            headline: format!("{} ({size})", file.name),
            type_line: format!("Type: {mime}"),
            size_line: format!("Size: {size}"),
        }
    }
}

/// Input events an upload area reacts to.
#[derive(Clone, Debug)]
pub enum AreaEvent {
    /// The native file picker reported a `change`.
    PickerChanged(Vec<SelectedFile>),
    DragEnter,
    DragOver,
    DragLeave,
    Drop(Vec<SelectedFile>),
}

/// What an event did to the area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AreaUpdate {
    /// A file was committed and the info panel replaced.
    Committed(FileInfoPanel),
    /// The dragover highlight changed; nothing was committed.
    Highlight(bool),
    /// The event carried no file.
    Ignored,
    /// The file was refused; the previous selection is untouched.
    Rejected(SubmitError),
}

/// One drop zone plus its hidden picker, holding the current selection.
#[derive(Debug)]
pub struct UploadArea {
    max_upload_bytes: u64,
    selected: Option<SelectedFile>,
    panel: Option<FileInfoPanel>,
    dragover: bool,
}

impl UploadArea {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            max_upload_bytes,
            selected: None,
            panel: None,
            dragover: false,
        }
    }

    pub fn handle(&mut self, event: AreaEvent) -> AreaUpdate {
        match event {
            AreaEvent::DragEnter | AreaEvent::DragOver => {
                self.dragover = true;
                AreaUpdate::Highlight(true)
            }
            AreaEvent::DragLeave => {
                self.dragover = false;
                AreaUpdate::Highlight(false)
            }
            AreaEvent::Drop(files) => {
                self.dragover = false;
                self.on_files(files)
            }
            AreaEvent::PickerChanged(files) => self.on_files(files),
        }
    }

    /// Commits `file` as the selection if it is within the size limit.
    pub fn on_file_chosen(&mut self, file: SelectedFile) -> AreaUpdate {
        if let Err(err) = check_size(&file, self.max_upload_bytes) {
            debug!("rejected {} ({} bytes): over limit", file.name, file.size_bytes);
            return AreaUpdate::Rejected(err);
        }

        let panel = FileInfoPanel::for_file(&file);
        self.selected = Some(file);
        self.panel = Some(panel.clone());
        AreaUpdate::Committed(panel)
    }

    fn on_files(&mut self, files: Vec<SelectedFile>) -> AreaUpdate {
        match files.into_iter().next() {
            Some(file) => self.on_file_chosen(file),
            None => AreaUpdate::Ignored,
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn panel(&self) -> Option<&FileInfoPanel> {
        self.panel.as_ref()
    }

    pub fn is_dragover(&self) -> bool {
        self.dragover
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn clear(&mut self) {
        self.selected = None;
        self.panel = None;
    }
}
