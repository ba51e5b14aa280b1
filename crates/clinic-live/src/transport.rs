//! Connection seam between the channel loop and the network.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::errors::{LiveError, Result};

/// Opens live connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the handshake.
    async fn connect(&self, url: &Url) -> Result<Box<dyn LiveConnection>>;
}

/// One open live connection.
#[async_trait]
pub trait LiveConnection: Send {
    /// Send a text frame.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Next text frame. `Ok(None)` once the peer has closed.
    ///
    /// Must be cancel-safe: dropping the future loses no frame.
    async fn next_text(&mut self) -> Result<Option<String>>;

    /// Close from our side. Errors are ignored.
    async fn close(&mut self);
}

/// [`Connector`] over tokio-tungstenite.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &Url) -> Result<Box<dyn LiveConnection>> {
        let (ws, response) = connect_async(url.as_str())
            .await
            .map_err(|e| LiveError::Connect(e.to_string()))?;
        debug!(url = %url, status = response.status().as_u16(), "websocket handshake complete");
        Ok(Box::new(WsConnection { ws }))
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct WsConnection {
    ws: WsStream,
}

#[async_trait]
impl LiveConnection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.ws
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| LiveError::Transport(e.to_string()))
    }

    async fn next_text(&mut self) -> Result<Option<String>> {
        loop {
            match self.ws.next().await {
                None | Some(Ok(Message::Close(_))) => return Ok(None),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_str().to_owned())),
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(LiveError::Transport(e.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.ws.close(None).await;
    }
}
