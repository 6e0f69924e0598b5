//! Wire formats of the translation service.

use serde::Deserialize;

use crate::document::{FileId, Page, TranslationResult, UploadedDocument};

use super::traits::ServiceStatus;

#[derive(Debug, Deserialize)]
pub(super) struct StatusResponse {
    /// The server sends `null` instead of `false` when no key is set
    #[serde(default)]
    translation_available: Option<bool>,
    #[serde(default)]
    api_key_status: Option<String>,
}

impl From<StatusResponse> for ServiceStatus {
    fn from(response: StatusResponse) -> Self {
        Self {
            translation_available: response.translation_available.unwrap_or(false),
            api_key_status: response.api_key_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct LanguagesResponse {
    pub languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadResponse {
    file_id: String,
    #[serde(default)]
    pages: Vec<Page>,
}

impl UploadResponse {
    pub fn into_document(self, file_name: String) -> UploadedDocument {
        UploadedDocument {
            file_id: FileId::new(self.file_id),
            file_name,
            pages: self.pages,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct TranslateResponse {
    #[serde(default)]
    pages: Vec<Page>,
    #[serde(default)]
    export_url: Option<String>,
}

impl From<TranslateResponse> for TranslationResult {
    fn from(response: TranslateResponse) -> Self {
        Self {
            pages: response.pages,
            export_url: response.export_url,
        }
    }
}

/// Error body of a non-success response.
///
/// `detail` is a string for handled errors but a list for request validation
/// failures, so it is kept untyped.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn detail(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|detail| !detail.is_empty())
    }
}
