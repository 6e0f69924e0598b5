//! Upload flow: validate locally, then hand the file to the server.

use tracing::{info, warn};

use crate::api::Backend;
use crate::document::{PdfFile, UploadedDocument};
use crate::error::{Error, Result};

/// Message for a file that is not a PDF
pub const NOT_A_PDF: &str = "Please upload a PDF file";

/// Upload progress as shown next to the file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading { file_name: String },
    Complete { file_name: String },
    Failed { file_name: String, message: String },
}

impl UploadStatus {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Uploading { .. } => "Uploading...",
            Self::Complete { .. } => "Upload complete",
            Self::Failed { .. } => "Upload failed",
        }
    }
}

/// Reject anything whose declared media type is not PDF.
pub fn validate(file: &PdfFile) -> Result<()> {
    if file.is_pdf() {
        Ok(())
    } else {
        Err(Error::InvalidInput(NOT_A_PDF.to_string()))
    }
}

/// Upload a PDF. Validation happens before any request is made.
pub async fn submit(backend: &dyn Backend, file: &PdfFile) -> Result<UploadedDocument> {
    validate(file)?;

    info!("Uploading {} ({} bytes)", file.name, file.bytes.len());
    match backend.upload(file).await {
        Ok(document) => {
            info!(
                "Upload complete: file_id={}, {} pages",
                document.file_id,
                document.page_count()
            );
            Ok(document)
        }
        Err(e) => {
            warn!("Error uploading PDF: {}", e);
            Err(e)
        }
    }
}
