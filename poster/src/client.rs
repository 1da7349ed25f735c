use std::time::Instant;

use bytes::Bytes;
use http_body_util::Full;
use http_test_util::byte_body;
use http_test_util::drain::DrainBodyFuture;
use hyper::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use tokio::time::timeout_at;

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::statistics::RequestOutcome;

/// A pooled HTTP/1 client. Clones share the connection pool and are safe to use concurrently.
#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// POSTs `payload` as JSON and reads the whole response.
    ///
    /// Never fails as a call: every problem is captured in the returned outcome. The
    /// configured timeout bounds sending and reading together.
    pub async fn post_json<T>(&self, config: &ClientConfig, payload: &T) -> RequestOutcome
    where
        T: Serialize + ?Sized,
    {
        let start = Instant::now();
        let deadline = tokio::time::Instant::from_std(start) + config.timeout();

        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                return RequestOutcome::failed(None, RequestError::Encoding(e), start.elapsed())
            }
        };

        let resp = match timeout_at(deadline, self.client.request(build_request(config, body))).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                return RequestOutcome::failed(None, RequestError::Send(e), start.elapsed())
            }
            Err(_elapsed) => {
                let err = RequestError::SendTimeout(config.timeout());
                return RequestOutcome::failed(None, err, start.elapsed());
            }
        };

        let status = resp.status();
        let bytes = match timeout_at(deadline, DrainBodyFuture::new(resp.into_body())).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                return RequestOutcome::failed(Some(status), RequestError::Read(e), start.elapsed())
            }
            Err(_elapsed) => {
                let err = RequestError::ReadTimeout(config.timeout());
                return RequestOutcome::failed(Some(status), err, start.elapsed());
            }
        };

        let body = String::from_utf8_lossy(&bytes).into_owned();
        RequestOutcome::completed(status, body, start.elapsed())
    }
}

/// Authorization first, then the JSON defaults, then custom headers over both.
fn build_request(config: &ClientConfig, body: Vec<u8>) -> Request<Full<Bytes>> {
    let mut request = Request::new(byte_body(body));
    *request.method_mut() = Method::POST;
    *request.uri_mut() = config.uri().clone();

    let headers = request.headers_mut();
    if let Some(authorization) = config.authorization() {
        headers.insert(AUTHORIZATION, authorization.clone());
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in config.headers() {
        headers.insert(name.clone(), value.clone());
    }
    request
}
