//! Notification subscription over WebSocket.
//!
//! # Protocol
//! ```text
//! client → {"type":"connection_init"}
//! server → {"type":"connection_ack"}
//! client → {"id":"1","type":"subscribe","payload":{"query":"subscription { notifications(chainId: ...) }"}}
//! server → {"id":"1","type":"next","payload":{"data":{"notifications":{...}}}}*
//! ```
//!
//! # Design Decisions
//! - The subscribe frame is only sent once the server has acknowledged the connection
//! - One forwarding task per subscription; it ends when either side closes,
//!   including a dropped receiver on an idle connection
//! - Frames that are not notifications are logged and skipped
//! - Pings are answered by tungstenite itself

use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use url::Url;

use crate::codec::{self, Operation, OperationKind};
use crate::transport::{ChainId, Notification, NotificationStream, TransportError};

const SUBPROTOCOL: &str = "graphql-transport-ws";
const SUBSCRIPTION_ID: &str = "1";
const BUFFER: usize = 64;
const ACK_TIMEOUT: Duration = Duration::from_secs(10);

fn ws_error(e: impl std::fmt::Display) -> TransportError {
    TransportError::Subscription(e.to_string())
}

/// Open a subscription and forward notifications into a channel.
pub async fn subscribe(url: Url, chain_id: ChainId) -> Result<NotificationStream, TransportError> {
    let mut request = url.as_str().into_client_request().map_err(ws_error)?;
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_static(SUBPROTOCOL),
    );

    let (stream, _) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(ws_error)?;
    let (mut sink, mut source) = stream.split();

    sink.send(Message::Text(json!({ "type": "connection_init" }).to_string().into()))
        .await
        .map_err(ws_error)?;
    await_ack(&mut source).await?;

    let subscription = codec::encode(
        &Operation::new(OperationKind::Subscription, "notifications")
            .arg("chainId", chain_id.as_str()),
    )
    .map_err(ws_error)?;
    sink.send(Message::Text(
        json!({
            "id": SUBSCRIPTION_ID,
            "type": "subscribe",
            "payload": { "query": subscription.body },
        })
        .to_string()
        .into(),
    ))
    .await
    .map_err(ws_error)?;

    let (tx, rx) = mpsc::channel(BUFFER);
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = tx.closed() => break,
                frame = source.next() => match frame {
                    Some(frame) => frame,
                    None => break,
                },
            };
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "Notification stream failed");
                    break;
                }
            };
            match parse_frame(text.as_str()) {
                Frame::Notification(notification) => {
                    if tx.send(notification).await.is_err() {
                        break;
                    }
                }
                Frame::Complete => break,
                Frame::Ignored => {}
            }
        }
        let _ = sink.close().await;
        tracing::info!(chain_id = %chain_id, "Notification subscription closed");
    });

    Ok(rx)
}

/// Wait for the server to acknowledge `connection_init`.
async fn await_ack<S>(source: &mut S) -> Result<(), TransportError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    tokio::time::timeout(ACK_TIMEOUT, read_ack(source))
        .await
        .map_err(|_| ws_error("timed out waiting for connection_ack"))?
}

async fn read_ack<S>(source: &mut S) -> Result<(), TransportError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = source.next().await {
        match frame.map_err(ws_error)? {
            Message::Text(text) => {
                let message: Value = serde_json::from_str(text.as_str()).map_err(ws_error)?;
                match message.get("type").and_then(Value::as_str) {
                    Some("connection_ack") => return Ok(()),
                    Some("ping") | Some("pong") => {}
                    _ => return Err(ws_error(format!("expected connection_ack, got {}", message))),
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Err(ws_error("connection closed before connection_ack"))
}

#[derive(Debug, PartialEq)]
enum Frame {
    Notification(Notification),
    Complete,
    Ignored,
}

fn parse_frame(text: &str) -> Frame {
    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unparsable notification frame");
            return Frame::Ignored;
        }
    };
    match message.get("type").and_then(Value::as_str) {
        Some("next") => message
            .pointer("/payload/data/notifications")
            .and_then(Notification::from_payload)
            .map(Frame::Notification)
            .unwrap_or(Frame::Ignored),
        Some("complete") => Frame::Complete,
        Some("error") => {
            tracing::warn!(payload = %message, "Subscription error frame");
            Frame::Complete
        }
        _ => Frame::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::NotificationReason;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
    use tokio_tungstenite::WebSocketStream;

    #[test]
    fn test_parse_next_frame() {
        let frame = parse_frame(
            r#"{"id":"1","type":"next","payload":{"data":{"notifications":{"chain_id":"c1","reason":{"NewBlock":{"height":3}}}}}}"#,
        );
        match frame {
            Frame::Notification(n) => {
                assert_eq!(n.chain_id, ChainId::from("c1"));
                assert_eq!(n.reason, NotificationReason::NewBlock(json!({ "height": 3 })));
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn test_parse_control_frames() {
        assert_eq!(parse_frame(r#"{"type":"connection_ack"}"#), Frame::Ignored);
        assert_eq!(parse_frame(r#"{"id":"1","type":"complete"}"#), Frame::Complete);
        assert_eq!(parse_frame(r#"{"id":"1","type":"error","payload":[]}"#), Frame::Complete);
        assert_eq!(parse_frame("garbage"), Frame::Ignored);
    }

    async fn listen() -> (TcpListener, Url) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/ws", listener.local_addr().unwrap())).unwrap();
        (listener, url)
    }

    async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
        let (tcp, _) = listener.accept().await.unwrap();
        let echo_protocol = |request: &Request, mut response: Response| {
            if let Some(protocol) = request.headers().get("Sec-WebSocket-Protocol") {
                response
                    .headers_mut()
                    .insert("Sec-WebSocket-Protocol", protocol.clone());
            }
            Ok::<_, ErrorResponse>(response)
        };
        tokio_tungstenite::accept_hdr_async(tcp, echo_protocol).await.unwrap()
    }

    async fn next_type(ws: &mut WebSocketStream<TcpStream>) -> String {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                let message: Value = serde_json::from_str(text.as_str()).unwrap();
                message["type"].as_str().unwrap().to_string()
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    async fn send_ack(ws: &mut WebSocketStream<TcpStream>) {
        ws.send(Message::Text(r#"{"type":"connection_ack"}"#.to_string().into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_idle_subscription_closes_when_receiver_dropped() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            assert_eq!(next_type(&mut ws).await, "connection_init");
            send_ack(&mut ws).await;
            assert_eq!(next_type(&mut ws).await, "subscribe");
            // No notifications are ever sent; the client must still hang up.
            timeout(Duration::from_secs(2), async {
                loop {
                    match ws.next().await {
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
            })
            .await
            .is_ok()
        });

        let rx = subscribe(url, ChainId::from("c1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(rx);

        assert!(server.await.unwrap(), "client kept the idle connection open");
    }

    #[tokio::test]
    async fn test_subscribe_waits_for_ack() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            assert_eq!(next_type(&mut ws).await, "connection_init");
            assert!(
                timeout(Duration::from_millis(200), ws.next()).await.is_err(),
                "subscribe sent before connection_ack"
            );
            send_ack(&mut ws).await;
            assert_eq!(next_type(&mut ws).await, "subscribe");
            ws.send(Message::Text(
                r#"{"id":"1","type":"next","payload":{"data":{"notifications":{"chain_id":"c1","reason":{"NewBlock":{"height":1}}}}}}"#
                    .to_string()
                    .into(),
            ))
            .await
            .unwrap();
            ws
        });

        let mut rx = subscribe(url, ChainId::from("c1")).await.unwrap();
        let notification = timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(notification.chain_id, ChainId::from("c1"));
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn test_close_before_ack_is_subscription_error() {
        let (listener, url) = listen().await;
        let server = tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            assert_eq!(next_type(&mut ws).await, "connection_init");
            let _ = ws.close(None).await;
        });

        let result = subscribe(url, ChainId::from("c1")).await;
        assert!(matches!(result, Err(TransportError::Subscription(_))));
        server.await.unwrap();
    }
}
