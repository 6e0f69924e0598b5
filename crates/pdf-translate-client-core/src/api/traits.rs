use async_trait::async_trait;

use crate::document::{FileId, PdfFile, TranslationResult, UploadedDocument};
use crate::error::Result;

/// What the service reports about itself at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStatus {
    /// False when the server has no usable translation API key
    pub translation_available: bool,
    /// Free-form description of the key state, when the server sends one
    pub api_key_status: Option<String>,
}

/// The translation service as seen by the client.
///
/// Every method is one request; none of them retry. Non-success responses map
/// to [`crate::Error::Server`] carrying the server's `detail` text when present.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/status`
    async fn status(&self) -> Result<ServiceStatus>;

    /// `GET /api/languages`, in server order
    async fn languages(&self) -> Result<Vec<String>>;

    /// `POST /api/upload` with the file as multipart field `file`
    async fn upload(&self, file: &PdfFile) -> Result<UploadedDocument>;

    /// `POST /api/translate`; resolves once the whole document is translated
    async fn translate(&self, file_id: &FileId, target_language: &str)
    -> Result<TranslationResult>;

    /// `GET /api/translate`, idempotent re-fetch of a finished translation
    async fn fetch_translation(
        &self,
        file_id: &FileId,
        target_language: &str,
    ) -> Result<TranslationResult>;

    /// Download an export link as returned by the server (may be server-relative)
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Absolute URL of an export link, for display
    fn resolve_url(&self, url: &str) -> String;

    /// Progress channel address for a file
    fn channel_url(&self, file_id: &FileId) -> Result<String>;
}
