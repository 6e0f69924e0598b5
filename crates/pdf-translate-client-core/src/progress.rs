//! Progress display state for a running translation.

pub const STATUS_INITIALIZING: &str = "Initializing translation...";
pub const STATUS_CONNECTED: &str = "Connected. Preparing translation...";
pub const STATUS_TRANSLATING: &str = "Translating...";
pub const STATUS_COMPLETED: &str = "Translation completed!";
pub const STATUS_FAILED: &str = "Translation failed";
pub const STATUS_CONNECTION_FAILED: &str = "Connection failed";

pub const DETAILS_CONNECTING: &str = "Connecting to translation service...";
pub const DETAILS_CONNECTION_FAILED: &str = "Failed to establish connection to translation service.";

/// Round a server-reported percentage for display, clamped to 0..=100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    // Clamped before the cast, so it always fits
    value.round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressIcon {
    Spinner,
    Success,
    Failure,
}

/// Everything the progress panel shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub percent: u8,
    pub status: String,
    pub details: String,
    pub icon: ProgressIcon,
    pub details_is_error: bool,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            percent: 0,
            status: STATUS_INITIALIZING.to_string(),
            details: DETAILS_CONNECTING.to_string(),
            icon: ProgressIcon::Spinner,
            details_is_error: false,
        }
    }
}

impl ProgressView {
    /// Text next to the bar, e.g. "67%"
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent)
    }

    /// Bar fill width; always equal to the label
    pub fn bar_width(&self) -> String {
        self.percent_label()
    }

    pub fn set_percent(&mut self, value: f64) {
        self.percent = round_percent(value);
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    pub fn set_details(&mut self, details: impl Into<String>) {
        self.details = details.into();
    }

    pub fn complete(&mut self) {
        self.percent = 100;
        self.status = STATUS_COMPLETED.to_string();
        self.icon = ProgressIcon::Success;
    }

    pub fn fail(&mut self, status: &str, details: impl Into<String>) {
        self.status = status.to_string();
        self.details = details.into();
        self.icon = ProgressIcon::Failure;
        self.details_is_error = true;
    }
}
