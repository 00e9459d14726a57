//! Transport seam and the websocket implementation.
//!
//! The supervisor only needs to dial an endpoint, pull frames and close.
//! Tests substitute a scripted in-process transport.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::TransportError;

/// How long to keep reading after the server's close frame.
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// One inbound message payload, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Text(text) => text.as_bytes(),
            Frame::Binary(data) => data,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Dials the notification endpoint.
pub trait Transport: Send + 'static {
    type Conn: Connection;

    fn connect(
        &mut self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Self::Conn, TransportError>> + Send;
}

/// An open, server-push connection.
pub trait Connection: Send + 'static {
    /// Next inbound frame; `None` once the peer has closed the stream.
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<Frame, TransportError>>> + Send;

    /// Start a close handshake. Errors are not reported: the socket is
    /// being discarded either way.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Websocket transport backed by tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn connect(&mut self, endpoint: &str) -> Result<WsConnection, TransportError> {
        let (stream, response) = tokio_tungstenite::connect_async(endpoint).await?;
        debug!(%endpoint, status = %response.status(), "websocket handshake complete");
        Ok(WsConnection { stream })
    }
}

pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsConnection {
    /// The close reply is queued when the server's close frame is read and
    /// only goes out on the next poll. Keep polling until the peer hangs up.
    async fn drain_after_close(&mut self) {
        let drained = tokio::time::timeout(CLOSE_DRAIN_TIMEOUT, async {
            while let Some(Ok(_)) = self.stream.next().await {}
        })
        .await;
        if drained.is_err() {
            debug!("server did not finish the close handshake");
        }
    }
}

impl Connection for WsConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                Ok(Message::Binary(data)) => return Some(Ok(Frame::Binary(data.to_vec()))),
                // Pings are answered by tungstenite itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        debug!(
                            code = u16::from(frame.code),
                            reason = %frame.reason.as_str(),
                            "server closed notification stream"
                        );
                    }
                    self.drain_after_close().await;
                    return None;
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "websocket close handshake failed");
        }
    }
}
