//! WebSocket transport backed by `tokio-tungstenite`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{
    SinkExt,
    StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::debug;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream,
    WebSocketStream,
    connect_async,
    tungstenite::{
        Error as WsError,
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::ORIGIN},
    },
};

use super::{Connector, Fragment, FragmentSource, MessageSink, TransportError};
use crate::endpoint::Endpoint;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections to a node, sending the endpoint's `Origin`
/// header with the upgrade request.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    type Sink = WebSocketSink;
    type Source = WebSocketSource;

    async fn connect(&self, endpoint: &Endpoint) -> Result<(Self::Sink, Self::Source), TransportError> {
        let mut request = endpoint.url().into_client_request()?;
        let origin = HeaderValue::from_str(endpoint.origin())
            .map_err(|e| TransportError::InvalidRequest(format!("origin header: {e}")))?;
        request.headers_mut().insert(ORIGIN, origin);

        let (stream, response) = connect_async(request).await?;
        debug!(
            "websocket handshake complete: endpoint={endpoint}, status={}",
            response.status()
        );
        let (sink, source) = stream.split();
        Ok((WebSocketSink { inner: sink }, WebSocketSource { inner: source }))
    }
}

/// Write half of a WebSocket connection.
pub struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl MessageSink for WebSocketSink {
    async fn send_message(&mut self, message: Bytes) -> Result<(), TransportError> {
        self.inner.send(Message::Binary(message.to_vec())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        match self.inner.close().await {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read half of a WebSocket connection.
///
/// Data messages surface as single final fragments. Raw frames keep their
/// FIN bit so continuation frames are reassembled by the receive loop.
pub struct WebSocketSource {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl FragmentSource for WebSocketSource {
    async fn next_fragment(&mut self) -> Option<Result<Fragment, TransportError>> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return None,
                Err(e) => return Some(Err(e.into())),
            };
            match message {
                Message::Text(text) => return Some(Ok(Fragment::complete(Bytes::from(text)))),
                Message::Binary(data) => return Some(Ok(Fragment::complete(Bytes::from(data)))),
                Message::Frame(frame) => {
                    let is_final = frame.header().is_final;
                    return Some(Ok(Fragment::new(frame.into_data(), is_final)));
                }
                Message::Close(_) => return None,
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }
}
