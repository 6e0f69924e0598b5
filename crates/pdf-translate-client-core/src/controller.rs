//! Page-level controller: owns the session state and drives the flows.
//!
//! This is the single owner of the uploaded document, the selected language,
//! the progress channel and the translation session. Presentation code calls
//! its methods and listens through a [`FlowObserver`].

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{Backend, ServiceStatus};
use crate::channel::{ChannelConnector, ChannelMessage, ChannelSignal, ProgressChannel, StartSignal};
use crate::config::ClientConfig;
use crate::document::{FileId, PdfFile, UploadedDocument};
use crate::error::Result;
use crate::languages::{CATALOG_FETCH_FAILED, LanguageMatches, LanguageRegistry};
use crate::notify::{API_UNAVAILABLE_NOTICE, Notice, Notification, NotificationCenter, NotificationId};
use crate::progress::ProgressView;
use crate::session::{ExportLinks, FlowEffect, FlowInput, TranslationSession, TranslationStatus};
use crate::upload::{self, UploadStatus};
use crate::viewer::ResultsViewer;

/// Receives presentation updates. Every method defaults to doing nothing.
pub trait FlowObserver: Send {
    fn on_upload_status(&mut self, _status: &UploadStatus) {}

    fn on_progress(&mut self, _progress: &ProgressView) {}

    /// The completion panel is shown
    fn on_completed(&mut self, _links: Option<&ExportLinks>) {}

    fn on_notification(&mut self, _notification: &Notification) {}
}

/// Observer that ignores everything
#[derive(Debug, Default)]
pub struct NoopObserver;

impl FlowObserver for NoopObserver {}

pub struct PageController {
    config: ClientConfig,
    backend: Arc<dyn Backend>,
    channel: ProgressChannel,
    registry: LanguageRegistry,
    notifications: NotificationCenter,
    service_status: Option<ServiceStatus>,
    upload_status: UploadStatus,
    document: Option<UploadedDocument>,
    session: Option<TranslationSession>,
    start_enabled: bool,
    observer: Box<dyn FlowObserver>,
}

impl PageController {
    pub fn new(
        config: ClientConfig,
        backend: Arc<dyn Backend>,
        connector: Arc<dyn ChannelConnector>,
    ) -> Self {
        let notifications = NotificationCenter::new(config.notification_ttl());

        Self {
            config,
            backend,
            channel: ProgressChannel::new(connector),
            registry: LanguageRegistry::new(),
            notifications,
            service_status: None,
            upload_status: UploadStatus::Idle,
            document: None,
            session: None,
            start_enabled: false,
            observer: Box::new(NoopObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn FlowObserver>) -> Self {
        self.observer = observer;
        self
    }

    // ==========================================================================
    // Load
    // ==========================================================================

    /// Status check and catalog fetch, run concurrently and independently.
    pub async fn initialize(&mut self) {
        let backend = Arc::clone(&self.backend);
        let (status, catalog) = tokio::join!(backend.status(), self.registry.load(backend.as_ref()));

        match status {
            Ok(status) => {
                if !status.translation_available {
                    warn!(
                        "Translation unavailable on server ({})",
                        status.api_key_status.as_deref().unwrap_or("no key status")
                    );
                    self.pin(Notice::warning(API_UNAVAILABLE_NOTICE));
                }
                self.service_status = Some(status);
            }
            Err(e) => warn!("Error checking API status: {}", e),
        }

        if catalog.is_err() {
            self.notify(Notice::error(CATALOG_FETCH_FAILED));
        }
    }

    pub const fn service_status(&self) -> Option<&ServiceStatus> {
        self.service_status.as_ref()
    }

    // ==========================================================================
    // Languages
    // ==========================================================================

    pub const fn languages(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn filter_languages(&self, query: &str) -> LanguageMatches {
        self.registry.filter(query)
    }

    /// Choose the target language; enables the start control once a document exists.
    pub fn select_language(&mut self, name: &str) -> Result<&str> {
        let selected = self.registry.select(name)?;
        info!("Target language: {}", selected);
        if self.document.is_some() {
            self.start_enabled = true;
        }
        Ok(selected)
    }

    pub fn selected_language(&self) -> Option<&str> {
        self.registry.selected()
    }

    // ==========================================================================
    // Upload
    // ==========================================================================

    /// Upload a file. A non-PDF is rejected without touching any state.
    ///
    /// A valid upload replaces the previous document and resets any translation.
    pub async fn upload(&mut self, file: PdfFile) -> Result<&UploadedDocument> {
        if let Err(e) = upload::validate(&file) {
            self.notify(Notice::error(e.user_message()));
            return Err(e);
        }

        self.reset_translation().await;
        self.document = None;
        self.set_upload_status(UploadStatus::Uploading {
            file_name: file.name.clone(),
        });

        match upload::submit(self.backend.as_ref(), &file).await {
            Ok(document) => {
                self.set_upload_status(UploadStatus::Complete {
                    file_name: file.name,
                });
                self.start_enabled = self.registry.selected().is_some();
                Ok(self.document.insert(document))
            }
            Err(e) => {
                let message = e.user_message();
                self.set_upload_status(UploadStatus::Failed {
                    file_name: file.name,
                    message: message.clone(),
                });
                self.notify(Notice::error(format!("Error uploading PDF: {message}")));
                Err(e)
            }
        }
    }

    pub const fn upload_status(&self) -> &UploadStatus {
        &self.upload_status
    }

    pub const fn document(&self) -> Option<&UploadedDocument> {
        self.document.as_ref()
    }

    /// Language selection is revealed only after a successful upload
    pub const fn translation_unlocked(&self) -> bool {
        self.document.is_some()
    }

    // ==========================================================================
    // Translation
    // ==========================================================================

    /// State of the "start translation" control
    pub fn can_start(&self) -> bool {
        self.start_enabled && self.document.is_some() && self.registry.selected().is_some()
    }

    pub const fn session(&self) -> Option<&TranslationSession> {
        self.session.as_ref()
    }

    /// Run one translation to the end.
    ///
    /// Does nothing and returns `None` unless a document is uploaded and a
    /// language selected. The prior channel and session are discarded first.
    pub async fn start_translation(&mut self) -> Option<TranslationStatus> {
        let (Some(document), Some(language)) = (&self.document, self.registry.selected()) else {
            debug!("Cannot translate: missing document or language");
            return None;
        };
        let file_id = document.file_id.clone();
        let language = language.to_string();

        self.reset_translation().await;
        self.start_enabled = false;

        let mut session = TranslationSession::new(file_id.clone(), language.clone());
        self.run(&mut session, &file_id, &language).await;

        let status = session.status();
        self.start_enabled = status == TranslationStatus::Failed;
        self.session = Some(session);
        Some(status)
    }

    /// Event loop: apply effects, then wait for the next input, until settled.
    async fn run(&mut self, session: &mut TranslationSession, file_id: &FileId, language: &str) {
        let (flow_tx, mut flow_rx) = mpsc::unbounded_channel::<FlowInput>();
        let (channel_tx, mut channel_rx) = mpsc::unbounded_channel::<ChannelMessage>();

        let mut pending: VecDeque<FlowEffect> = session.start().into();
        self.observer.on_progress(session.progress());

        loop {
            while let Some(effect) = pending.pop_front() {
                self.perform(effect, file_id, language, &flow_tx, &channel_tx)
                    .await;
            }
            if session.is_settled() {
                break;
            }

            let input = tokio::select! {
                Some(input) = flow_rx.recv() => input,
                Some(message) = channel_rx.recv() => {
                    if !self.channel.is_current(message.generation) {
                        debug!("Dropping message from superseded channel {}", message.generation);
                        continue;
                    }
                    match message.signal {
                        ChannelSignal::Event(event) => FlowInput::Progress(event),
                        ChannelSignal::Closed => FlowInput::ChannelClosed,
                        ChannelSignal::Failed(reason) => FlowInput::ChannelFailed(reason),
                    }
                }
                else => break,
            };

            let was_revealed = session.is_revealed();
            pending.extend(session.handle(input));
            self.observer.on_progress(session.progress());
            if !was_revealed && session.is_revealed() {
                self.observer.on_completed(session.export_links());
            }
        }
    }

    async fn perform(
        &mut self,
        effect: FlowEffect,
        file_id: &FileId,
        language: &str,
        flow_tx: &mpsc::UnboundedSender<FlowInput>,
        channel_tx: &mpsc::UnboundedSender<ChannelMessage>,
    ) {
        match effect {
            FlowEffect::OpenChannel => {
                let input = match self.open_channel(file_id, channel_tx.clone()).await {
                    Ok(()) => FlowInput::ChannelReady,
                    Err(e) => FlowInput::ChannelFailed(e.user_message()),
                };
                let _ = flow_tx.send(input);
            }
            FlowEffect::ScheduleSettle => {
                schedule(flow_tx, self.config.settle_delay(), FlowInput::SettleElapsed);
            }
            FlowEffect::SendStartSignal => {
                let signal = StartSignal::new(file_id, language);
                if let Err(e) = self.channel.send_start(&signal).await {
                    warn!("Start signal not sent: {}", e);
                }
            }
            FlowEffect::IssueTranslate => {
                let backend = Arc::clone(&self.backend);
                let tx = flow_tx.clone();
                let file_id = file_id.clone();
                let language = language.to_string();
                tokio::spawn(async move {
                    let input = match backend.translate(&file_id, &language).await {
                        Ok(result) => FlowInput::TranslateSucceeded(result),
                        Err(e) => FlowInput::TranslateFailed(e.user_message()),
                    };
                    let _ = tx.send(input);
                });
            }
            FlowEffect::ScheduleReveal => {
                schedule(flow_tx, self.config.completion_delay(), FlowInput::RevealDue);
            }
            FlowEffect::FetchTranslation => {
                let backend = Arc::clone(&self.backend);
                let tx = flow_tx.clone();
                let file_id = file_id.clone();
                let language = language.to_string();
                tokio::spawn(async move {
                    let input = match backend.fetch_translation(&file_id, &language).await {
                        Ok(result) => FlowInput::TranslationFetched(result),
                        Err(e) => FlowInput::FetchFailed(e.user_message()),
                    };
                    let _ = tx.send(input);
                });
            }
            FlowEffect::Notify(notice) => self.notify(notice),
        }
    }

    async fn open_channel(
        &mut self,
        file_id: &FileId,
        messages: mpsc::UnboundedSender<ChannelMessage>,
    ) -> Result<()> {
        let url = self.backend.channel_url(file_id)?;
        self.channel.open(&url, messages).await?;
        Ok(())
    }

    /// Close the channel and forget the session
    async fn reset_translation(&mut self) {
        self.channel.close().await;
        self.session = None;
    }

    pub const fn channel(&self) -> &ProgressChannel {
        &self.channel
    }

    /// Close the progress channel, e.g. before exiting
    pub async fn shutdown(&mut self) {
        self.channel.close().await;
    }

    // ==========================================================================
    // Results
    // ==========================================================================

    /// Available once a translation completed and its pages are known
    pub fn viewer(&self) -> Option<ResultsViewer<'_>> {
        let document = self.document.as_ref()?;
        let session = self.session.as_ref()?;
        if session.status() != TranslationStatus::Completed {
            return None;
        }
        let translated = session.translated_pages()?;
        Some(ResultsViewer::new(&document.pages, translated))
    }

    /// Export links of the completed translation, resolved against the server
    pub fn resolved_export_links(&self) -> Option<ExportLinks> {
        let links = self.session.as_ref()?.export_links()?;
        Some(ExportLinks {
            pdf: self.backend.resolve_url(&links.pdf),
            markdown: self.backend.resolve_url(&links.markdown),
        })
    }

    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.backend.download(url).await
    }

    // ==========================================================================
    // Notifications
    // ==========================================================================

    fn notify(&mut self, notice: Notice) {
        self.prune_notifications(Instant::now());
        let notification = self.notifications.push(notice);
        self.observer.on_notification(notification);
    }

    fn pin(&mut self, notice: Notice) {
        let notification = self.notifications.pin(notice);
        self.observer.on_notification(notification);
    }

    /// Banners on screen now; transient ones disappear once their lifetime passes
    pub fn notifications(&self) -> Vec<&Notification> {
        self.notifications.visible(Instant::now()).collect()
    }

    pub fn dismiss_notification(&mut self, id: NotificationId) -> bool {
        self.notifications.dismiss(id)
    }

    /// Drop expired notifications, returning them
    pub fn prune_notifications(&mut self, now: Instant) -> Vec<Notification> {
        let expired = self.notifications.prune(now);
        if !expired.is_empty() {
            debug!("{} notifications expired", expired.len());
        }
        expired
    }

    fn set_upload_status(&mut self, status: UploadStatus) {
        self.upload_status = status;
        self.observer.on_upload_status(&self.upload_status);
    }
}

/// Post `input` to the queue after `delay`
fn schedule(tx: &mpsc::UnboundedSender<FlowInput>, delay: Duration, input: FlowInput) {
    let tx = tx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(input);
    });
}
