use crate::{
    channel::ChannelId,
    error::FeedError,
    protocol::{Frame, SubscribeRequest, TickPayload, parse_frame},
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, stream::BoxStream};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Ticks delivered by one upstream connection.
///
/// The stream ending is a close, an `Err` item is a connection error. Either ends the
/// connection.
pub type TickStream = BoxStream<'static, Result<TickPayload, FeedError>>;

/// Establishes one subscribed upstream connection for a channel.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Connect, send the subscribe request for `channel`, and return its tick stream.
    async fn connect(&self, channel: &ChannelId) -> Result<TickStream, FeedError>;
}

/// [`Connector`] over a `tokio-tungstenite` WebSocket, one socket per channel.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, channel: &ChannelId) -> Result<TickStream, FeedError> {
        let (websocket, _) = connect_async(self.url.as_str())
            .await
            .map_err(|error| FeedError::Connect(error.to_string()))?;

        let (mut write, read) = websocket.split();

        let request = serde_json::to_string(&SubscribeRequest::new(channel))?;
        write
            .send(Message::Text(request.into()))
            .await
            .map_err(|error| FeedError::Subscribe {
                channel: channel.to_string(),
                reason: error.to_string(),
            })?;

        info!(%channel, url = %self.url, "subscribed to ticks");

        // Sink half travels with the stream so the socket lives as long as its reader
        let stream = futures::stream::unfold(
            (write, read, channel.clone()),
            |(write, mut read, channel)| async move {
                loop {
                    let item = match read.next().await? {
                        Ok(Message::Text(text)) => match parse_frame(text.as_str()) {
                            Frame::Tick(tick) => Ok(tick),
                            Frame::Error(error) => {
                                warn!(
                                    %channel,
                                    code = ?error.code,
                                    message = ?error.message,
                                    "upstream rejected request"
                                );
                                continue;
                            }
                            Frame::Other => {
                                debug!(%channel, "dropping non-tick frame");
                                continue;
                            }
                        },
                        Ok(Message::Close(frame)) => {
                            info!(%channel, ?frame, "upstream closed connection");
                            return None;
                        }
                        Ok(_) => continue,
                        Err(error) => Err(FeedError::from(error)),
                    };
                    return Some((item, (write, read, channel)));
                }
            },
        );

        Ok(stream.boxed())
    }
}
