use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// One inbound item from a real-time connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFrame {
    Text(String),
    Closed,
    Error(String),
}

/// Outbound half of a real-time connection
#[async_trait]
pub trait ChannelSink: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// An open connection, split into its two halves
pub struct ChannelLink {
    pub sink: Box<dyn ChannelSink>,
    pub frames: BoxStream<'static, ChannelFrame>,
}

/// Opens real-time connections. `connect` resolves once the connection is open.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<ChannelLink>;
}
