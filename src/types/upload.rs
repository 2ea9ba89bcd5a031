//! Upload files, slots, and file constraints

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{NutriscopeError, Result};

/// Named place in a wizard form that holds one user-selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotKey {
    /// Meal photo (image formats)
    MealImage,
    /// Clinical/biomarker data (CSV)
    Biomarkers,
    /// Gut microbiome data (CSV)
    Microbiome,
}

impl SlotKey {
    pub fn media_kind(self) -> MediaKind {
        match self {
            Self::MealImage => MediaKind::Image,
            Self::Biomarkers | Self::Microbiome => MediaKind::Data,
        }
    }

    /// Warning shown when a file of the wrong type is selected for this slot.
    pub fn rejection_message(self) -> &'static str {
        match self {
            Self::MealImage => "Please upload an image file (JPEG, PNG, etc.)",
            Self::Biomarkers => "Please upload a CSV file with clinical data",
            Self::Microbiome => "Please upload a CSV file with microbiome data",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MealImage => "meal photo",
            Self::Biomarkers => "clinical data",
            Self::Microbiome => "microbiome data",
        };
        f.write_str(label)
    }
}

/// Broad content class a slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Data,
}

/// A user-selected file held in memory until submission.
///
/// The contents are reference-counted, so cloning a file (e.g. when a
/// wizard snapshots its form for submission) does not copy the bytes.
#[derive(Clone)]
pub struct UploadFile {
    name: String,
    mime: String,
    bytes: Arc<[u8]>,
    source: Option<PathBuf>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: Arc::from(bytes),
            source: None,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension.
    ///
    /// Files larger than `max_size_bytes` are rejected before any content is
    /// read.
    pub fn from_path(path: &Path, max_size_bytes: u64) -> Result<Self> {
        let unreadable = |e: std::io::Error| {
            NutriscopeError::Validation(format!("cannot read {}: {e}", path.display()))
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        let len = std::fs::metadata(path).map_err(unreadable)?.len();
        if len > max_size_bytes {
            return Err(too_large(&name, len, max_size_bytes));
        }
        let bytes = std::fs::read(path).map_err(unreadable)?;
        // The file may have grown between the metadata call and the read.
        if bytes.len() as u64 > max_size_bytes {
            return Err(too_large(&name, bytes.len() as u64, max_size_bytes));
        }
        let mime = extension_of(&name)
            .map(|ext| mime_for_extension(&ext))
            .unwrap_or("application/octet-stream");
        let source = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        Ok(Self {
            name,
            mime: mime.to_string(),
            bytes: Arc::from(bytes),
            source: Some(source),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension including the leading dot, e.g. `.csv`.
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }

    /// Local preview URL for images read from disk.
    pub fn preview_url(&self) -> Option<String> {
        if !self.mime.starts_with("image/") {
            return None;
        }
        self.source
            .as_ref()
            .map(|path| format!("file://{}", path.display()))
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

/// MIME type for a dotted, lowercased extension.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".csv" => "text/csv",
        ".json" => "application/json",
        ".xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// A selected file stored in a wizard slot.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    pub file: UploadFile,
    pub preview_url: Option<String>,
}

impl UploadSlot {
    pub fn new(file: UploadFile) -> Self {
        let preview_url = file.preview_url();
        Self { file, preview_url }
    }
}

/// What a slot will accept.
///
/// A file is accepted when its MIME type or its extension is in the allowed
/// set, and it is no larger than `max_size_bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConstraints {
    pub mime_types: Vec<String>,
    pub extensions: Vec<String>,
    pub max_size_bytes: u64,
}

impl FileConstraints {
    pub fn matches_type(&self, file: &UploadFile) -> bool {
        let mime = file.mime().to_ascii_lowercase();
        if self.mime_types.iter().any(|m| m.eq_ignore_ascii_case(&mime)) {
            return true;
        }
        file.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }

    /// Check a file, returning a validation error on mismatch.
    pub fn check(&self, file: &UploadFile, rejection: &str) -> Result<()> {
        if !self.matches_type(file) {
            return Err(NutriscopeError::Validation(rejection.to_string()));
        }
        if file.len() > self.max_size_bytes {
            return Err(too_large(file.name(), file.len(), self.max_size_bytes));
        }
        Ok(())
    }
}

fn too_large(name: &str, len: u64, limit: u64) -> NutriscopeError {
    NutriscopeError::Validation(format!(
        "{name} is too large ({:.1} MB, limit {:.1} MB)",
        megabytes(len),
        megabytes(limit)
    ))
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
