//! A receiving endpoint that counts, and optionally captures, every request sent to it.
//!
//! ```no_run
//! use http_test_util::sink::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = TestServer::new().await;
//!     let url = server.url("/ingest");
//!     // point the client at the URL, then inspect `server.state()`...
//! }
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use hyper::{HeaderMap, Method, StatusCode, Uri};

use crate::SharedCounter;

/// One request as the sink saw it.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What the sink answers to every request it receives.
#[derive(Debug, Clone)]
pub struct SinkReply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Option<Duration>,
}

impl Default for SinkReply {
    fn default() -> Self {
        Self::new(StatusCode::OK, "ok")
    }
}

impl SinkReply {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    /// Holds every response back for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SinkState {
    received: SharedCounter,
    captured: Option<Arc<Mutex<Vec<CapturedRequest>>>>,
    reply: Arc<SinkReply>,
}

impl SinkState {
    /// Counts requests without retaining them.
    #[must_use]
    pub fn counting(reply: SinkReply) -> Self {
        Self {
            received: SharedCounter::new(),
            captured: None,
            reply: Arc::new(reply),
        }
    }

    /// Counts requests and keeps a copy of each one.
    #[must_use]
    pub fn capturing(reply: SinkReply) -> Self {
        Self {
            captured: Some(Arc::default()),
            ..Self::counting(reply)
        }
    }

    #[must_use]
    pub fn received(&self) -> usize {
        self.received.get()
    }

    /// Returns the captured requests in arrival order. Empty for a counting sink.
    #[must_use]
    pub fn captured(&self) -> Vec<CapturedRequest> {
        self.captured
            .as_ref()
            .map(|captured| captured.lock().unwrap().clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ReceivedResponse {
    pub received: usize,
}

/// `GET /count` reports the number of received requests, every other request is received.
pub fn router(state: SinkState) -> Router {
    Router::new()
        .route("/count", get(get_count))
        .fallback(receive)
        .with_state(state)
}

#[inline]
async fn get_count(State(state): State<SinkState>) -> Json<ReceivedResponse> {
    Json(ReceivedResponse {
        received: state.received(),
    })
}

async fn receive(
    State(state): State<SinkState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let seq = state.received.increment(1) + 1;
    tracing::debug!(%method, %uri, bytes = body.len(), seq, "received request");

    if let Some(captured) = &state.captured {
        captured.lock().unwrap().push(CapturedRequest {
            method,
            uri,
            headers,
            body,
        });
    }
    if let Some(delay) = state.reply.delay {
        tokio::time::sleep(delay).await;
    }
    (state.reply.status, state.reply.body.clone())
}

/// An in-process capturing sink for integration tests.
///
/// Listens on a random available port on localhost and stops when dropped.
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    state: SinkState,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_reply(SinkReply::default()).await
    }

    pub async fn with_reply(reply: SinkReply) -> Self {
        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();
        let socket = listener.local_addr().unwrap();

        let state = SinkState::capturing(reply);
        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            state,
        }
    }

    /// Returns a full URL pointing to the given path.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://127.0.0.1:{}/{}", self.socket.port(), path)
    }

    pub fn state(&self) -> &SinkState {
        &self.state
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drain::DrainBodyFuture;
    use crate::{byte_body, empty_body};
    use hyper::Request;
    use hyper_util::client::legacy::connect::HttpConnector;
    use hyper_util::client::legacy::Client;
    use hyper_util::rt::TokioExecutor;

    async fn send(request: Request<http_body_util::Full<Bytes>>) -> (StatusCode, Vec<u8>) {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let resp = client.request(request).await.unwrap();
        let status = resp.status();
        let body = DrainBodyFuture::new(resp.into_body()).await.unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn captures_posts_and_answers_with_reply() {
        let server = TestServer::with_reply(SinkReply::new(StatusCode::CREATED, "stored")).await;

        let request = Request::post(server.url("/ingest"))
            .header("x-probe", "1")
            .body(byte_body(r#"{"a":1}"#))
            .unwrap();
        let (status, body) = send(request).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, b"stored");
        assert_eq!(server.state().received(), 1);

        let captured = server.state().captured();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].method, Method::POST);
        assert_eq!(captured[0].uri.path(), "/ingest");
        assert_eq!(captured[0].headers["x-probe"], "1");
        assert_eq!(captured[0].body, Bytes::from_static(br#"{"a":1}"#));
    }

    #[tokio::test]
    async fn count_endpoint_reports_receipts() {
        let server = TestServer::new().await;
        for _ in 0..3 {
            let request = Request::post(server.url("/"))
                .body(empty_body())
                .unwrap();
            send(request).await;
        }

        let request = Request::get(server.url("/count")).body(empty_body()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        let resp: ReceivedResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(resp.received, 3);
    }

    #[test]
    fn counting_sink_keeps_nothing() {
        let state = SinkState::counting(SinkReply::default());
        state.received.increment(1);
        assert_eq!(state.received(), 1);
        assert!(state.captured().is_empty());
    }
}
