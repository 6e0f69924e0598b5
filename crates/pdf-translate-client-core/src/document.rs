//! Documents exchanged with the translation service.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Opaque identifier returned by the upload endpoint.
///
/// Scopes every later operation on the document (translate, progress channel,
/// export downloads).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text of a single page. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    #[serde(default)]
    pub content: String,
}

impl Page {
    pub fn new(page_number: u32, content: impl Into<String>) -> Self {
        Self {
            page_number,
            content: content.into(),
        }
    }
}

/// Find the page with the given number in an ordered page list.
pub fn find_page(pages: &[Page], page_number: u32) -> Option<&Page> {
    pages.iter().find(|page| page.page_number == page_number)
}

/// A PDF accepted by the server, with its extracted page text.
///
/// Immutable once created; replaced wholesale by the next successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_id: FileId,
    pub file_name: String,
    pub pages: Vec<Page>,
}

impl UploadedDocument {
    pub const fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, page_number: u32) -> Option<&Page> {
        find_page(&self.pages, page_number)
    }
}

/// Final payload of a translation, from either the translate POST or the re-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub pages: Vec<Page>,
    pub export_url: Option<String>,
}

/// A user-supplied file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct PdfFile {
    pub name: String,
    /// Declared media type, e.g. `application/pdf`
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Read a file from disk. The media type is guessed from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("Invalid file name: {}", path.display())))?
            .to_string();

        Ok(Self::new(name, media_type, bytes))
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.to_ascii_lowercase().contains("pdf")
    }
}
