//! Translation state machine.
//!
//! `TranslationSession` is pure: every external happening (channel open,
//! timer, channel message, HTTP outcome) is a [`FlowInput`], and handling it
//! mutates the session and returns the [`FlowEffect`]s the driver must carry
//! out. Feeding inputs in any order is therefore deterministic and testable
//! without a network.
//!
//! ```text
//! idle -> connecting -> translating -> completed
//!             \              \
//!              +-> failed <---+
//! ```
//!
//! Completion can be reached from the channel's `completed` event or from the
//! translate response; whichever arrives first wins and the other is ignored.

use tracing::{debug, error, info, warn};

use crate::channel::ProgressEvent;
use crate::document::{FileId, Page, TranslationResult};
use crate::error::mentions_api_key;
use crate::notify::Notice;
use crate::progress::{
    DETAILS_CONNECTION_FAILED, ProgressView, STATUS_CONNECTED, STATUS_CONNECTION_FAILED,
    STATUS_FAILED, STATUS_TRANSLATING,
};
use crate::util::pdf_export_url;

/// Notification for a progress channel that could not be used
pub const CHANNEL_ERROR_NOTICE: &str =
    "Error connecting to translation service. Please try again.";

/// Notification for failures that point at the server's API key
pub const CONFIGURATION_NOTICE: &str = "Translation failed: OpenAI API key is invalid or not configured properly. \
     Please check your .env file and restart the server.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationStatus {
    Idle,
    Connecting,
    Translating,
    Completed,
    Failed,
}

impl TranslationStatus {
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Translating)
    }
}

/// Which signal completed the translation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionSource {
    Channel,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Progress channel could not be opened or broke
    Connection,
    /// Server message mentions the API key
    Configuration,
    /// Any other server or transport failure
    Translation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Download targets shown on the completion panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLinks {
    pub pdf: String,
    pub markdown: String,
}

impl ExportLinks {
    /// The server hands out the Markdown export; the PDF one differs only in `format`.
    pub fn from_export_url(export_url: &str) -> Self {
        Self {
            pdf: pdf_export_url(export_url),
            markdown: export_url.to_string(),
        }
    }
}

/// Something that happened outside the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum FlowInput {
    ChannelReady,
    ChannelFailed(String),
    ChannelClosed,
    SettleElapsed,
    Progress(ProgressEvent),
    TranslateSucceeded(TranslationResult),
    TranslateFailed(String),
    /// The completion display delay is over
    RevealDue,
    TranslationFetched(TranslationResult),
    FetchFailed(String),
}

/// Work the driver must carry out, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    OpenChannel,
    ScheduleSettle,
    /// Fire-and-forget; the translate request stays authoritative
    SendStartSignal,
    IssueTranslate,
    ScheduleReveal,
    FetchTranslation,
    Notify(Notice),
}

#[derive(Debug, Clone)]
pub struct TranslationSession {
    file_id: FileId,
    target_language: String,
    status: TranslationStatus,
    progress: ProgressView,
    channel_ready: bool,
    completed_by: Option<CompletionSource>,
    export_url: Option<String>,
    export_links: Option<ExportLinks>,
    revealed: bool,
    fetch_pending: bool,
    /// The translate request is in flight; its pages may still be needed
    translate_pending: bool,
    translated_pages: Option<Vec<Page>>,
    failure: Option<Failure>,
}

impl TranslationSession {
    pub fn new(file_id: FileId, target_language: impl Into<String>) -> Self {
        Self {
            file_id,
            target_language: target_language.into(),
            status: TranslationStatus::Idle,
            progress: ProgressView::default(),
            channel_ready: false,
            completed_by: None,
            export_url: None,
            export_links: None,
            revealed: false,
            fetch_pending: false,
            translate_pending: false,
            translated_pages: None,
            failure: None,
        }
    }

    pub const fn file_id(&self) -> &FileId {
        &self.file_id
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub const fn status(&self) -> TranslationStatus {
        self.status
    }

    pub const fn progress(&self) -> &ProgressView {
        &self.progress
    }

    pub const fn completed_by(&self) -> Option<CompletionSource> {
        self.completed_by
    }

    pub const fn export_links(&self) -> Option<&ExportLinks> {
        self.export_links.as_ref()
    }

    /// Completion panel is showing
    pub const fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn translated_pages(&self) -> Option<&[Page]> {
        self.translated_pages.as_deref()
    }

    pub const fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Nothing further will happen without a new session
    pub const fn is_settled(&self) -> bool {
        match self.status {
            TranslationStatus::Failed => true,
            TranslationStatus::Completed => {
                self.revealed && !self.fetch_pending && !self.translate_pending
            }
            _ => false,
        }
    }

    /// `idle -> connecting`. A session is started once; later calls do nothing.
    pub fn start(&mut self) -> Vec<FlowEffect> {
        if self.status != TranslationStatus::Idle {
            warn!("Translation session already started ({:?})", self.status);
            return Vec::new();
        }

        info!(
            "Starting translation of {} into {}",
            self.file_id, self.target_language
        );
        self.status = TranslationStatus::Connecting;
        self.progress = ProgressView::default();
        vec![FlowEffect::OpenChannel]
    }

    pub fn handle(&mut self, input: FlowInput) -> Vec<FlowEffect> {
        debug!("{:?} <- {:?}", self.status, input);

        match input {
            FlowInput::ChannelReady => self.on_channel_ready(),
            FlowInput::ChannelFailed(reason) => self.on_channel_failed(&reason),
            FlowInput::ChannelClosed => {
                self.channel_ready = false;
                Vec::new()
            }
            FlowInput::SettleElapsed => self.on_settled(),
            FlowInput::Progress(event) => self.on_event(event),
            FlowInput::TranslateSucceeded(result) => {
                self.translate_pending = false;
                self.on_translate_succeeded(result)
            }
            FlowInput::TranslateFailed(message) => {
                self.translate_pending = false;
                self.on_translate_failed(message)
            }
            FlowInput::RevealDue => self.on_reveal(),
            FlowInput::TranslationFetched(result) => {
                self.fetch_pending = false;
                self.adopt_export_url(result.export_url);
                self.adopt_pages(result.pages);
                Vec::new()
            }
            FlowInput::FetchFailed(reason) => {
                warn!("Error fetching translation: {}", reason);
                self.fetch_pending = false;
                Vec::new()
            }
        }
    }

    fn on_channel_ready(&mut self) -> Vec<FlowEffect> {
        if self.status != TranslationStatus::Connecting {
            return Vec::new();
        }
        self.channel_ready = true;
        vec![FlowEffect::ScheduleSettle]
    }

    fn on_channel_failed(&mut self, reason: &str) -> Vec<FlowEffect> {
        self.channel_ready = false;
        match self.status {
            TranslationStatus::Connecting | TranslationStatus::Translating => {
                self.fail_connection(reason)
            }
            TranslationStatus::Completed => {
                warn!("Ignoring channel error after completion: {}", reason);
                Vec::new()
            }
            TranslationStatus::Idle | TranslationStatus::Failed => Vec::new(),
        }
    }

    fn on_settled(&mut self) -> Vec<FlowEffect> {
        if self.status != TranslationStatus::Connecting {
            return Vec::new();
        }
        if !self.channel_ready {
            return self.fail_connection("channel closed before translation started");
        }

        self.status = TranslationStatus::Translating;
        self.translate_pending = true;
        vec![FlowEffect::SendStartSignal, FlowEffect::IssueTranslate]
    }

    fn on_event(&mut self, event: ProgressEvent) -> Vec<FlowEffect> {
        match event {
            ProgressEvent::Connected { .. } => {
                if self.status.is_active() {
                    self.progress.set_status(STATUS_CONNECTED);
                }
                Vec::new()
            }
            ProgressEvent::Translating { progress, message }
            | ProgressEvent::PageCompleted { progress, message } => {
                if self.status.is_active() {
                    self.progress.set_percent(progress);
                    self.progress.set_status(STATUS_TRANSLATING);
                    self.progress.set_details(message);
                }
                Vec::new()
            }
            ProgressEvent::Completed { export_url } => {
                if self.status.is_active() {
                    self.complete(CompletionSource::Channel, export_url)
                } else {
                    debug!("Ignoring completed event in {:?}", self.status);
                    Vec::new()
                }
            }
            ProgressEvent::Error { message } => match self.status {
                TranslationStatus::Connecting | TranslationStatus::Translating => {
                    self.fail(message)
                }
                TranslationStatus::Completed => {
                    warn!("Ignoring error event after completion: {}", message);
                    Vec::new()
                }
                TranslationStatus::Idle | TranslationStatus::Failed => Vec::new(),
            },
            ProgressEvent::Unknown => Vec::new(),
        }
    }

    fn on_translate_succeeded(&mut self, result: TranslationResult) -> Vec<FlowEffect> {
        match self.status {
            TranslationStatus::Connecting | TranslationStatus::Translating => {
                self.adopt_pages(result.pages);
                self.complete(CompletionSource::Http, result.export_url)
            }
            TranslationStatus::Completed => {
                debug!("Translate response arrived after completion");
                self.adopt_export_url(result.export_url);
                self.adopt_pages(result.pages);
                Vec::new()
            }
            TranslationStatus::Idle | TranslationStatus::Failed => {
                warn!("Ignoring translate response in {:?}", self.status);
                Vec::new()
            }
        }
    }

    fn on_translate_failed(&mut self, message: String) -> Vec<FlowEffect> {
        match self.status {
            TranslationStatus::Connecting | TranslationStatus::Translating => self.fail(message),
            TranslationStatus::Completed => {
                warn!("Ignoring translate failure after completion: {}", message);
                Vec::new()
            }
            TranslationStatus::Idle | TranslationStatus::Failed => Vec::new(),
        }
    }

    fn on_reveal(&mut self) -> Vec<FlowEffect> {
        if self.status != TranslationStatus::Completed || self.revealed {
            return Vec::new();
        }

        self.revealed = true;
        self.export_links = self
            .export_url
            .as_deref()
            .map(ExportLinks::from_export_url);

        if self.translated_pages.is_none() {
            self.fetch_pending = true;
            vec![FlowEffect::FetchTranslation]
        } else {
            Vec::new()
        }
    }

    /// The first export link from either source wins. Links are shown once revealed.
    fn adopt_export_url(&mut self, export_url: Option<String>) {
        if self.export_url.is_none() {
            self.export_url = export_url;
        }
        if self.revealed && self.export_links.is_none() {
            self.export_links = self
                .export_url
                .as_deref()
                .map(ExportLinks::from_export_url);
        }
    }

    /// The first page set wins; later ones describe the same translation.
    fn adopt_pages(&mut self, pages: Vec<Page>) {
        if self.translated_pages.is_none() {
            self.translated_pages = Some(pages);
        }
    }

    fn complete(&mut self, source: CompletionSource, export_url: Option<String>) -> Vec<FlowEffect> {
        info!("Translation completed via {:?}", source);
        self.status = TranslationStatus::Completed;
        self.completed_by = Some(source);
        self.adopt_export_url(export_url);
        self.progress.complete();
        vec![FlowEffect::ScheduleReveal]
    }

    fn fail(&mut self, message: String) -> Vec<FlowEffect> {
        let (kind, notice) = if mentions_api_key(&message) {
            (FailureKind::Configuration, CONFIGURATION_NOTICE.to_string())
        } else {
            (FailureKind::Translation, format!("Translation failed: {message}"))
        };
        error!("Error translating PDF: {}", message);

        self.status = TranslationStatus::Failed;
        self.progress.fail(STATUS_FAILED, message.clone());
        self.failure = Some(Failure { kind, message });
        vec![FlowEffect::Notify(Notice::error(notice))]
    }

    fn fail_connection(&mut self, reason: &str) -> Vec<FlowEffect> {
        error!("Error setting up translation: {}", reason);

        self.status = TranslationStatus::Failed;
        self.progress
            .fail(STATUS_CONNECTION_FAILED, DETAILS_CONNECTION_FAILED);
        self.failure = Some(Failure {
            kind: FailureKind::Connection,
            message: reason.to_string(),
        });
        vec![FlowEffect::Notify(Notice::error(CHANNEL_ERROR_NOTICE))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressIcon, STATUS_COMPLETED};

    const EXPORT: &str = "/api/download/f1?format=md&target_language=german";

    fn pages() -> Vec<Page> {
        vec![Page::new(1, "Hallo"), Page::new(2, "Welt")]
    }

    fn result() -> TranslationResult {
        TranslationResult {
            pages: pages(),
            export_url: Some(EXPORT.to_string()),
        }
    }

    /// A session that has reached `translating`
    fn translating() -> TranslationSession {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        assert_eq!(session.start(), vec![FlowEffect::OpenChannel]);
        assert_eq!(
            session.handle(FlowInput::ChannelReady),
            vec![FlowEffect::ScheduleSettle]
        );
        assert_eq!(session.status(), TranslationStatus::Connecting);
        assert_eq!(
            session.handle(FlowInput::SettleElapsed),
            vec![FlowEffect::SendStartSignal, FlowEffect::IssueTranslate]
        );
        assert_eq!(session.status(), TranslationStatus::Translating);
        session
    }

    fn channel_completed() -> FlowInput {
        FlowInput::Progress(ProgressEvent::Completed {
            export_url: Some(EXPORT.to_string()),
        })
    }

    #[test]
    fn test_start_only_once() {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        assert_eq!(session.start(), vec![FlowEffect::OpenChannel]);
        assert!(session.start().is_empty());
        assert_eq!(session.status(), TranslationStatus::Connecting);
    }

    #[test]
    fn test_settle_before_ready_does_nothing_in_idle() {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        assert!(session.handle(FlowInput::SettleElapsed).is_empty());
        assert_eq!(session.status(), TranslationStatus::Idle);
    }

    #[test]
    fn test_progress_events_update_view() {
        let mut session = translating();
        session.handle(FlowInput::Progress(ProgressEvent::Connected { message: None }));
        assert_eq!(session.progress().status, STATUS_CONNECTED);

        session.handle(FlowInput::Progress(ProgressEvent::PageCompleted {
            progress: 66.7,
            message: "Completed page 2 of 3".to_string(),
        }));
        assert_eq!(session.progress().percent_label(), "67%");
        assert_eq!(session.progress().status, STATUS_TRANSLATING);
        assert_eq!(session.progress().details, "Completed page 2 of 3");
    }

    #[test]
    fn test_channel_completion_then_http_is_idempotent() {
        let mut session = translating();
        assert_eq!(
            session.handle(channel_completed()),
            vec![FlowEffect::ScheduleReveal]
        );
        assert_eq!(session.completed_by(), Some(CompletionSource::Channel));
        assert_eq!(session.progress().percent, 100);
        assert_eq!(session.progress().status, STATUS_COMPLETED);

        // The late response brings pages but no second transition
        assert!(session.handle(FlowInput::TranslateSucceeded(result())).is_empty());
        assert_eq!(session.completed_by(), Some(CompletionSource::Channel));
        assert!(session.handle(FlowInput::RevealDue).is_empty());
        assert!(session.is_revealed());
        assert!(session.is_settled());
        assert_eq!(session.translated_pages(), Some(pages().as_slice()));
    }

    #[test]
    fn test_http_completion_then_channel_is_idempotent() {
        let mut session = translating();
        assert_eq!(
            session.handle(FlowInput::TranslateSucceeded(result())),
            vec![FlowEffect::ScheduleReveal]
        );
        assert!(session.handle(channel_completed()).is_empty());
        assert!(session.handle(FlowInput::RevealDue).is_empty());
        assert!(session.handle(FlowInput::RevealDue).is_empty());
        assert_eq!(session.completed_by(), Some(CompletionSource::Http));
        assert!(session.is_settled());
    }

    #[test]
    fn test_both_paths_reach_same_visible_state() {
        let mut by_channel = translating();
        by_channel.handle(channel_completed());
        assert_eq!(
            by_channel.handle(FlowInput::RevealDue),
            vec![FlowEffect::FetchTranslation]
        );
        assert!(!by_channel.is_settled());
        by_channel.handle(FlowInput::TranslationFetched(result()));
        // The translate request is still out
        assert!(!by_channel.is_settled());
        by_channel.handle(FlowInput::TranslateSucceeded(result()));
        assert!(by_channel.is_settled());

        let mut by_http = translating();
        by_http.handle(FlowInput::TranslateSucceeded(result()));
        by_http.handle(FlowInput::RevealDue);

        assert_eq!(by_channel.status(), by_http.status());
        assert_eq!(by_channel.progress(), by_http.progress());
        assert_eq!(by_channel.export_links(), by_http.export_links());
        assert_eq!(by_channel.translated_pages(), by_http.translated_pages());
        assert_eq!(by_channel.is_revealed(), by_http.is_revealed());
    }

    #[test]
    fn test_export_links() {
        let links = ExportLinks::from_export_url("https://h/export?format=md&x=1");
        assert_eq!(links.pdf, "https://h/export?format=pdf&x=1");
        assert_eq!(links.markdown, "https://h/export?format=md&x=1");
    }

    #[test]
    fn test_api_key_failure_uses_configuration_notice() {
        let mut session = translating();
        let effects = session.handle(FlowInput::TranslateFailed(
            "Invalid API key configured".to_string(),
        ));
        assert_eq!(
            effects,
            vec![FlowEffect::Notify(Notice::error(CONFIGURATION_NOTICE))]
        );
        let failure = session.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Configuration);
        assert_eq!(session.progress().details, "Invalid API key configured");
        assert_eq!(session.progress().icon, ProgressIcon::Failure);
    }

    #[test]
    fn test_generic_failure_notice() {
        let mut session = translating();
        let effects = session.handle(FlowInput::TranslateFailed("File not found".to_string()));
        assert_eq!(
            effects,
            vec![FlowEffect::Notify(Notice::error("Translation failed: File not found"))]
        );
        assert_eq!(session.failure().unwrap().kind, FailureKind::Translation);
        assert!(session.is_settled());
    }

    #[test]
    fn test_error_event_fails_session() {
        let mut session = translating();
        session.handle(FlowInput::Progress(ProgressEvent::Error {
            message: "Translation error: quota".to_string(),
        }));
        assert_eq!(session.status(), TranslationStatus::Failed);

        // Failed is terminal for this session
        assert!(session.handle(FlowInput::TranslateSucceeded(result())).is_empty());
        assert!(session.handle(channel_completed()).is_empty());
        assert_eq!(session.status(), TranslationStatus::Failed);
        assert!(session.translated_pages().is_none());
    }

    #[test]
    fn test_failure_after_completion_is_suppressed() {
        let mut session = translating();
        session.handle(channel_completed());
        assert!(session.handle(FlowInput::TranslateFailed("late".to_string())).is_empty());
        assert!(session.handle(FlowInput::ChannelFailed("reset".to_string())).is_empty());
        assert_eq!(session.status(), TranslationStatus::Completed);
        assert!(session.failure().is_none());
    }

    #[test]
    fn test_channel_failure_while_connecting() {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        session.start();
        let effects = session.handle(FlowInput::ChannelFailed("refused".to_string()));
        assert_eq!(
            effects,
            vec![FlowEffect::Notify(Notice::error(CHANNEL_ERROR_NOTICE))]
        );
        assert_eq!(session.status(), TranslationStatus::Failed);
        assert_eq!(session.failure().unwrap().kind, FailureKind::Connection);
        assert_eq!(session.progress().status, STATUS_CONNECTION_FAILED);
    }

    #[test]
    fn test_close_during_settle_fails() {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        session.start();
        session.handle(FlowInput::ChannelReady);
        session.handle(FlowInput::ChannelClosed);
        let effects = session.handle(FlowInput::SettleElapsed);
        assert_eq!(
            effects,
            vec![FlowEffect::Notify(Notice::error(CHANNEL_ERROR_NOTICE))]
        );
        assert_eq!(session.status(), TranslationStatus::Failed);
    }

    #[test]
    fn test_fetch_failure_waits_for_translate_response() {
        let mut session = translating();
        session.handle(channel_completed());
        session.handle(FlowInput::RevealDue);
        session.handle(FlowInput::FetchFailed("404".to_string()));
        assert!(!session.is_settled());
        assert!(session.translated_pages().is_none());
        assert!(session.export_links().is_some());

        assert!(session.handle(FlowInput::TranslateSucceeded(result())).is_empty());
        assert!(session.is_settled());
        assert_eq!(session.translated_pages(), Some(pages().as_slice()));
    }

    #[test]
    fn test_fetch_and_translate_failure_settles_without_pages() {
        let mut session = translating();
        session.handle(channel_completed());
        session.handle(FlowInput::RevealDue);
        session.handle(FlowInput::FetchFailed("404".to_string()));
        session.handle(FlowInput::TranslateFailed("late".to_string()));
        assert!(session.is_settled());
        assert_eq!(session.status(), TranslationStatus::Completed);
        assert!(session.translated_pages().is_none());
    }

    #[test]
    fn test_completion_before_settle_needs_no_translate_response() {
        let mut session = TranslationSession::new(FileId::new("f1"), "German");
        session.start();
        session.handle(FlowInput::ChannelReady);
        session.handle(channel_completed());
        assert!(session.handle(FlowInput::SettleElapsed).is_empty());
        session.handle(FlowInput::RevealDue);
        session.handle(FlowInput::TranslationFetched(result()));
        assert!(session.is_settled());
    }

    #[test]
    fn test_late_export_url_fills_missing_links() {
        let bare_completed = || FlowInput::Progress(ProgressEvent::Completed { export_url: None });

        // Response lands before the reveal
        let mut early = translating();
        early.handle(bare_completed());
        early.handle(FlowInput::TranslateSucceeded(result()));
        early.handle(FlowInput::RevealDue);
        assert_eq!(
            early.export_links(),
            Some(&ExportLinks::from_export_url(EXPORT))
        );

        // Response lands after the reveal and the re-fetch
        let mut late = translating();
        late.handle(bare_completed());
        late.handle(FlowInput::RevealDue);
        late.handle(FlowInput::TranslationFetched(TranslationResult {
            pages: pages(),
            export_url: None,
        }));
        assert!(late.export_links().is_none());
        late.handle(FlowInput::TranslateSucceeded(result()));
        assert_eq!(
            late.export_links(),
            Some(&ExportLinks::from_export_url(EXPORT))
        );
        assert!(late.is_settled());
    }

    #[test]
    fn test_channel_export_url_wins_over_late_response() {
        let mut session = translating();
        session.handle(FlowInput::Progress(ProgressEvent::Completed {
            export_url: Some("/api/download/f1?format=md&target_language=first".to_string()),
        }));
        session.handle(FlowInput::TranslateSucceeded(result()));
        session.handle(FlowInput::RevealDue);
        assert_eq!(
            session.export_links().map(|l| l.markdown.as_str()),
            Some("/api/download/f1?format=md&target_language=first")
        );
    }
}
