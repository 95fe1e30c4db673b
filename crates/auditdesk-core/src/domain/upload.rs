//! File payloads for imports and evidence uploads

use std::fmt;
use std::path::Path;

use super::errors::DomainError;

/// What a file is being uploaded as; decides the accepted extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    /// Bulk import of findings
    Spreadsheet,
    /// Remediation proof for one record
    Evidence,
}

impl UploadKind {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Spreadsheet => &["xlsx", "csv"],
            UploadKind::Evidence => &["pdf", "pptx", "png", "jpeg", "jpg"],
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadKind::Spreadsheet => f.write_str("spreadsheet"),
            UploadKind::Evidence => f.write_str("evidence"),
        }
    }
}

/// A file selected by the operator, held in memory until sent
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    file_name: String,
    bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, keeping only its final path component as the name
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
    }

    /// Checks the extension against what `kind` accepts
    ///
    /// # Errors
    /// [`DomainError::MissingFile`] for a nameless file,
    /// [`DomainError::UnsupportedFileType`] for any other extension.
    pub fn validate_for(&self, kind: UploadKind) -> Result<(), DomainError> {
        if self.file_name.trim().is_empty() {
            return Err(DomainError::MissingFile);
        }
        let allowed = kind.allowed_extensions();
        match self.extension() {
            Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
            _ => Err(DomainError::UnsupportedFileType {
                file: self.file_name.clone(),
                allowed: allowed.join(", "),
            }),
        }
    }
}

impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
