//! Mock backend and channel connector shared by the integration tests.
//!
//! Both record what they are asked to do in one [`CallLog`] so tests can
//! assert on cross-component ordering (channel open, start signal, translate).

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use pdf_translate_client_core::channel::{ChannelFrame, ChannelLink, ChannelSink};
use pdf_translate_client_core::{
    Backend, ChannelConnector, Error, FileId, Page, PdfFile, Result, ServiceStatus,
    TranslationResult, UploadedDocument,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EXPORT_URL: &str = "/api/download/file-1?format=md&target_language=german";

// =============================================================================
// Call log
// =============================================================================

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Index of the first entry starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

// =============================================================================
// Mock backend
// =============================================================================

#[derive(Clone)]
pub enum Outcome {
    Success(TranslationResult),
    Failure { status: u16, message: String },
}

#[derive(Clone)]
pub struct Reply {
    pub delay: Duration,
    pub outcome: Outcome,
}

impl Reply {
    pub fn success_after(delay: Duration) -> Self {
        Self {
            delay,
            outcome: Outcome::Success(translated()),
        }
    }

    pub fn failure_after(delay: Duration, status: u16, message: &str) -> Self {
        Self {
            delay,
            outcome: Outcome::Failure {
                status,
                message: message.to_string(),
            },
        }
    }

    async fn resolve(&self) -> Result<TranslationResult> {
        tokio::time::sleep(self.delay).await;
        match &self.outcome {
            Outcome::Success(result) => Ok(result.clone()),
            Outcome::Failure { status, message } => Err(Error::Server {
                status: *status,
                message: message.clone(),
            }
            .classify()),
        }
    }
}

pub struct MockBackend {
    pub log: CallLog,
    pub translation_available: bool,
    /// `None` simulates an unreachable server
    pub languages: Option<Vec<String>>,
    pub upload: std::result::Result<Vec<Page>, String>,
    pub translate: Reply,
    pub fetch: Reply,
    pub upload_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            translation_available: true,
            languages: Some(vec![
                "French".to_string(),
                "Spanish".to_string(),
                "German".to_string(),
            ]),
            upload: Ok(original()),
            translate: Reply::success_after(Duration::from_secs(2)),
            fetch: Reply::success_after(Duration::from_millis(100)),
            upload_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn status(&self) -> Result<ServiceStatus> {
        Ok(ServiceStatus {
            translation_available: self.translation_available,
            api_key_status: None,
        })
    }

    async fn languages(&self) -> Result<Vec<String>> {
        self.languages
            .clone()
            .ok_or_else(|| Error::Network("connection refused".to_string()))
    }

    async fn upload(&self, file: &PdfFile) -> Result<UploadedDocument> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("upload:{}", file.name));
        match &self.upload {
            Ok(pages) => Ok(UploadedDocument {
                file_id: FileId::new("file-1"),
                file_name: file.name.clone(),
                pages: pages.clone(),
            }),
            Err(detail) => Err(Error::Server {
                status: 400,
                message: detail.clone(),
            }),
        }
    }

    async fn translate(&self, file_id: &FileId, target_language: &str) -> Result<TranslationResult> {
        self.log.push(format!("translate:{file_id}:{target_language}"));
        self.translate.resolve().await
    }

    async fn fetch_translation(
        &self,
        file_id: &FileId,
        target_language: &str,
    ) -> Result<TranslationResult> {
        self.log.push(format!("fetch:{file_id}:{target_language}"));
        self.fetch.resolve().await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.log.push(format!("download:{url}"));
        Ok(url.as_bytes().to_vec())
    }

    fn resolve_url(&self, url: &str) -> String {
        format!("http://test{url}")
    }

    fn channel_url(&self, file_id: &FileId) -> Result<String> {
        Ok(format!("ws://test/api/ws/translate/{file_id}"))
    }
}

// =============================================================================
// Mock channel connector
// =============================================================================

/// What the next connection does
pub enum Script {
    Refuse(String),
    /// Frames sent after the given delay from connection
    Frames(Vec<(Duration, ChannelFrame)>),
}

struct MockSink {
    index: usize,
    log: CallLog,
}

#[async_trait]
impl ChannelSink for MockSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.log.push(format!("send:{}:{}", self.index, text));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.log.push(format!("close:{}", self.index));
        Ok(())
    }
}

pub struct MockConnector {
    log: CallLog,
    scripts: Mutex<VecDeque<Script>>,
    /// Senders stay alive here so links only end when the test says so
    links: Mutex<Vec<UnboundedSender<ChannelFrame>>>,
}

impl MockConnector {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            scripts: Mutex::new(VecDeque::new()),
            links: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, script: Script) -> Self {
        self.scripts.lock().unwrap().push_back(script);
        self
    }

    /// Push a frame into an already opened link
    pub fn inject(&self, index: usize, frame: ChannelFrame) {
        let links = self.links.lock().unwrap();
        let _ = links[index].unbounded_send(frame);
    }

    pub fn opened(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl ChannelConnector for MockConnector {
    async fn connect(&self, url: &str) -> Result<ChannelLink> {
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Script::Frames(Vec::new()));

        let frames = match script {
            Script::Refuse(reason) => {
                self.log.push(format!("refused:{url}"));
                return Err(Error::Channel(reason));
            }
            Script::Frames(frames) => frames,
        };

        let (tx, rx) = unbounded();
        let index = {
            let mut links = self.links.lock().unwrap();
            links.push(tx.clone());
            links.len() - 1
        };
        self.log.push(format!("connect:{index}:{url}"));

        tokio::spawn(async move {
            for (delay, frame) in frames {
                tokio::time::sleep(delay).await;
                if tx.unbounded_send(frame).is_err() {
                    return;
                }
            }
        });

        Ok(ChannelLink {
            sink: Box::new(MockSink {
                index,
                log: self.log.clone(),
            }),
            frames: rx.boxed(),
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn original() -> Vec<Page> {
    vec![
        Page::new(1, "Bonjour"),
        Page::new(2, "le monde"),
        Page::new(3, "fin"),
    ]
}

pub fn translated() -> TranslationResult {
    TranslationResult {
        pages: vec![Page::new(1, "Hallo"), Page::new(2, "die Welt")],
        export_url: Some(EXPORT_URL.to_string()),
    }
}

pub fn pdf() -> PdfFile {
    PdfFile::new("report.pdf", "application/pdf", b"%PDF-1.4".to_vec())
}

pub fn frame(json: serde_json::Value) -> ChannelFrame {
    ChannelFrame::Text(json.to_string())
}

pub fn at(millis: u64, json: serde_json::Value) -> (Duration, ChannelFrame) {
    (Duration::from_millis(millis), frame(json))
}

pub fn connected() -> serde_json::Value {
    serde_json::json!({"status": "connected", "message": "WebSocket connection established"})
}

pub fn page_completed(progress: f64) -> serde_json::Value {
    serde_json::json!({"status": "page_completed", "progress": progress, "message": "Completed page"})
}

pub fn completed() -> serde_json::Value {
    serde_json::json!({"status": "completed", "progress": 100, "export_url": EXPORT_URL})
}
