//! Input resolution: turn a path or an in-memory upload into an [`UploadedFile`].
//!
//! The extension decides everything downstream, so it is normalised once
//! here (lowercased, leading dot kept) and mapped to a [`FileKind`]. An
//! unsupported extension is not an error yet: the upload is still a valid
//! object to show to the user, and [`crate::ingest`] is where it is refused.

use crate::error::SweepError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Formats the ingestor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileKind {
    Csv,
    Xlsx,
    Pdf,
}

impl FileKind {
    /// Map a lowercased extension (with leading dot) to a kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".csv" => Some(FileKind::Csv),
            ".xlsx" => Some(FileKind::Xlsx),
            ".pdf" => Some(FileKind::Pdf),
            _ => None,
        }
    }
}

/// One uploaded file, held entirely in memory.
#[derive(Clone)]
pub struct UploadedFile {
    name: String,
    extension: String,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Wrap bytes received under `name`.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let extension = extension_of(&name);
        Self {
            name,
            extension,
            bytes,
        }
    }

    /// Read a local file, validating existence and read permission.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SweepError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SweepError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => SweepError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => SweepError::FileNotFound {
                path: path.to_path_buf(),
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lowercased extension including the leading dot, or `""`.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> Option<FileKind> {
        FileKind::from_extension(&self.extension)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Name with its extension replaced by `new_ext` (given without a dot).
    pub fn renamed(&self, new_ext: &str) -> String {
        derive_file_name(&self.name, new_ext)
    }
}

/// Lowercased extension of a file name, including the leading dot.
fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

/// `<stem>.<new_ext>` for a file name; names without a stem keep the whole name.
pub fn derive_file_name(name: &str, new_ext: &str) -> String {
    let path = PathBuf::from(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    format!("{stem}.{new_ext}")
}
