use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::FileId;

/// Status update pushed by the server over the progress channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    Connected {
        #[serde(default)]
        message: Option<String>,
    },
    Translating {
        #[serde(default)]
        progress: f64,
        #[serde(default)]
        message: String,
    },
    PageCompleted {
        #[serde(default)]
        progress: f64,
        #[serde(default)]
        message: String,
    },
    Completed {
        #[serde(default)]
        export_url: Option<String>,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    /// Any status this client does not know; dropped by [`parse_event`]
    #[serde(other)]
    Unknown,
}

/// Decode one text frame. Unknown statuses and malformed frames yield `None`.
pub fn parse_event(text: &str) -> Option<ProgressEvent> {
    match serde_json::from_str::<ProgressEvent>(text) {
        Ok(ProgressEvent::Unknown) => {
            debug!("Ignoring progress message with unknown status: {}", text);
            None
        }
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed progress message: {} ({})", text, e);
            None
        }
    }
}

/// Client message asking the server to begin streaming progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartSignal {
    action: &'static str,
    pub file_id: String,
    pub language: String,
}

impl StartSignal {
    pub fn new(file_id: &FileId, language: &str) -> Self {
        Self {
            action: "start_translation",
            file_id: file_id.as_str().to_string(),
            language: language.to_string(),
        }
    }
}
