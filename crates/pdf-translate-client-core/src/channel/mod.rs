//! Progress channel: one real-time connection per translation.
//!
//! At most one connection is open. Opening a new one closes the previous
//! connection first and bumps the generation counter; every message carries
//! the generation of the connection that produced it so stale deliveries can
//! be recognised and dropped.

mod event;
mod traits;
mod ws;

pub use event::{ProgressEvent, StartSignal, parse_event};
pub use traits::{ChannelConnector, ChannelFrame, ChannelLink, ChannelSink};
pub use ws::WsConnector;

use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// What a connection reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Event(ProgressEvent),
    Closed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMessage {
    pub generation: u64,
    pub signal: ChannelSignal,
}

struct OpenConnection {
    generation: u64,
    sink: Box<dyn ChannelSink>,
    reader: JoinHandle<()>,
    ready: Arc<AtomicBool>,
}

pub struct ProgressChannel {
    connector: Arc<dyn ChannelConnector>,
    generation: u64,
    current: Option<OpenConnection>,
}

impl ProgressChannel {
    pub fn new(connector: Arc<dyn ChannelConnector>) -> Self {
        Self {
            connector,
            generation: 0,
            current: None,
        }
    }

    /// Open a connection, closing any existing one first.
    ///
    /// Resolves once the connection is open; the channel is ready from then
    /// until the server closes it or the transport fails. Messages are
    /// delivered to `messages` tagged with the returned generation.
    pub async fn open(
        &mut self,
        url: &str,
        messages: mpsc::UnboundedSender<ChannelMessage>,
    ) -> Result<u64> {
        self.close().await;

        self.generation += 1;
        let generation = self.generation;

        let link = self.connector.connect(url).await.map_err(|e| match e {
            Error::Channel(_) => e,
            other => Error::Channel(other.to_string()),
        })?;
        info!("Progress channel {} open", generation);

        let ready = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(forward_frames(
            generation,
            link.frames,
            Arc::clone(&ready),
            messages,
        ));

        self.current = Some(OpenConnection {
            generation,
            sink: link.sink,
            reader,
            ready,
        });

        Ok(generation)
    }

    /// Close the open connection, if any. Its reader stops immediately.
    pub async fn close(&mut self) {
        if let Some(mut connection) = self.current.take() {
            connection.reader.abort();
            connection.ready.store(false, Ordering::SeqCst);
            if let Err(e) = connection.sink.close().await {
                debug!("Closing progress channel {}: {}", connection.generation, e);
            }
            debug!("Progress channel {} closed", connection.generation);
        }
    }

    /// Whether sends are allowed right now
    pub fn is_ready(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|connection| connection.ready.load(Ordering::SeqCst))
    }

    /// Generation of the open connection
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(|connection| connection.generation)
    }

    /// Whether a message came from the connection that is open now
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == Some(generation)
    }

    /// Send the start signal. Refused unless the channel is ready.
    pub async fn send_start(&mut self, signal: &StartSignal) -> Result<()> {
        if !self.is_ready() {
            return Err(Error::Channel("channel is not ready".to_string()));
        }
        let text = serde_json::to_string(signal)
            .map_err(|e| Error::Channel(format!("cannot encode start signal: {e}")))?;

        match self.current.as_mut() {
            Some(connection) => connection.sink.send_text(text).await,
            None => Err(Error::Channel("channel is not open".to_string())),
        }
    }
}

/// Reader task: decode frames and hand them to the owner until the link ends.
async fn forward_frames(
    generation: u64,
    mut frames: futures::stream::BoxStream<'static, ChannelFrame>,
    ready: Arc<AtomicBool>,
    messages: mpsc::UnboundedSender<ChannelMessage>,
) {
    let send = |signal| messages.send(ChannelMessage { generation, signal }).is_ok();

    while let Some(frame) = frames.next().await {
        match frame {
            ChannelFrame::Text(text) => {
                debug!("Progress channel {} message: {}", generation, text);
                if let Some(event) = parse_event(&text)
                    && !send(ChannelSignal::Event(event))
                {
                    return;
                }
            }
            ChannelFrame::Closed => break,
            ChannelFrame::Error(e) => {
                warn!("Progress channel {} error: {}", generation, e);
                ready.store(false, Ordering::SeqCst);
                send(ChannelSignal::Failed(e));
                return;
            }
        }
    }

    info!("Progress channel {} closed by server", generation);
    ready.store(false, Ordering::SeqCst);
    send(ChannelSignal::Closed);
}
