//! One-shot HTTP receiver for the harvested data.
//!
//! The script running inside the game posts its JSON exactly once. The
//! receiver answers `200`, then shuts itself down.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, extract::State, http::StatusCode};
use bytes::Bytes;
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
};
use tracing::{info, warn};

use crate::{ArchiverError, Result};

#[derive(Clone)]
struct HandOffState {
    slot: Arc<Mutex<Option<oneshot::Sender<Bytes>>>>,
}

/// A bound listener waiting for the single hand-off request.
pub struct HandOffReceiver {
    listener: TcpListener,
}

impl HandOffReceiver {
    /// Bind before starting the server so an early post is not refused.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Listening for harvested data on http://{}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the first request body arrives or `timeout` expires.
    pub async fn receive(self, timeout: Duration) -> Result<Bytes> {
        let (body_tx, body_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let state = HandOffState {
            slot: Arc::new(Mutex::new(Some(body_tx))),
        };
        let app = Router::new().fallback(accept).with_state(state);

        let server = tokio::spawn(async move {
            axum::serve(self.listener, app)
                .with_graceful_shutdown(async {
                    stop_rx.await.ok();
                })
                .await
        });

        let body = tokio::time::timeout(timeout, body_rx).await;
        let _ = stop_tx.send(());
        match server.await {
            Ok(Ok(())) => info!("Hand-off receiver closed"),
            Ok(Err(e)) => warn!("Hand-off receiver error: {}", e),
            Err(e) => warn!("Hand-off receiver task failed: {}", e),
        }

        match body {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(_)) => Err(ArchiverError::HandOff("receiver dropped".to_owned())),
            Err(_) => Err(ArchiverError::Timeout {
                what: "hand-off",
                timeout,
            }),
        }
    }
}

async fn accept(State(state): State<HandOffState>, body: Bytes) -> StatusCode {
    let Some(tx) = state.slot.lock().await.take() else {
        warn!("Ignoring repeated hand-off ({} bytes)", body.len());
        return StatusCode::CONFLICT;
    };
    info!("Received {} bytes of harvested data", body.len());
    let _ = tx.send(body);
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    async fn post(addr: SocketAddr, body: &str) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "POST / HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_receives_one_body() {
        let receiver = HandOffReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let addr = receiver.local_addr().unwrap();
        let task = tokio::spawn(receiver.receive(Duration::from_secs(5)));

        let response = post(addr, r#"{"blocks":{"data":{}}}"#).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        let body = task.await.unwrap().unwrap();
        assert_eq!(&body[..], br#"{"blocks":{"data":{}}}"#);

        // the listener is gone once the body is delivered
        assert!(tokio::net::TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn test_times_out() {
        let receiver = HandOffReceiver::bind("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let err = receiver
            .receive(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiverError::Timeout { what: "hand-off", .. }));
    }
}
