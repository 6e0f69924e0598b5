//! PDF Translate Client Core Library
//!
//! Client side of a PDF upload-and-translate service:
//! - Upload with local PDF validation
//! - Target language catalog and filtering
//! - Translation driven by an explicit state machine, reconciling the
//!   translate request with a WebSocket progress channel
//! - Side-by-side results viewer and transient notifications

pub mod api;
pub mod channel;
pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod languages;
pub mod notify;
pub mod progress;
pub mod session;
pub mod upload;
pub mod util;
pub mod viewer;

pub use api::{Backend, HttpBackend, ServiceStatus, create_backend};
pub use channel::{ChannelConnector, ProgressChannel, ProgressEvent, WsConnector};
pub use config::ClientConfig;
pub use controller::{FlowObserver, NoopObserver, PageController};
pub use document::{FileId, Page, PdfFile, TranslationResult, UploadedDocument};
pub use error::{Error, Result};
pub use languages::{LanguageCatalog, LanguageMatches, LanguageRegistry};
pub use notify::{Notice, NoticeLevel, Notification, NotificationCenter};
pub use progress::{ProgressIcon, ProgressView, round_percent};
pub use session::{
    CompletionSource, ExportLinks, FailureKind, FlowEffect, FlowInput, TranslationSession,
    TranslationStatus,
};
pub use upload::UploadStatus;
pub use viewer::{PageView, ResultsViewer};

use std::sync::Arc;

/// Controller wired to the real HTTP backend and WebSocket progress channel
pub fn connect(config: ClientConfig) -> Result<PageController> {
    let backend = create_backend(&config)?;
    Ok(PageController::new(config, backend, Arc::new(WsConnector)))
}
