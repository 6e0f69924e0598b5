use async_trait::async_trait;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::Result;

use super::traits::{ChannelConnector, ChannelFrame, ChannelLink, ChannelSink};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket connector (ws:// and wss://)
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

struct WsSink {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl ChannelSink for WsSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.sink.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelConnector for WsConnector {
    async fn connect(&self, url: &str) -> Result<ChannelLink> {
        debug!("Opening progress channel {}", url);
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (sink, stream) = stream.split();

        // Ping, pong and binary frames carry nothing for us
        let frames = stream
            .filter_map(|message| async move {
                match message {
                    Ok(Message::Text(text)) => Some(ChannelFrame::Text(text.as_str().to_owned())),
                    Ok(Message::Close(_)) => Some(ChannelFrame::Closed),
                    Ok(_) => None,
                    Err(e) => Some(ChannelFrame::Error(e.to_string())),
                }
            })
            .boxed();

        Ok(ChannelLink {
            sink: Box::new(WsSink { sink }),
            frames,
        })
    }
}
