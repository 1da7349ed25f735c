use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Invalid run configuration. Always detected before the first request is sent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("URL is required")]
    EmptyUrl,

    #[error("invalid URL `{url}`")]
    InvalidUrl {
        url: String,
        #[source]
        source: <hyper::Uri as std::str::FromStr>::Err,
    },

    #[error("unsupported URL `{0}`: only plain http:// targets can be posted to")]
    UnsupportedScheme(String),

    #[error("threads must be at least 1")]
    NoWorkers,

    #[error("times must not be negative, got {0}")]
    NegativeTimes(i64),

    #[error("records must be at least 1, got {0}")]
    NoRecords(i64),

    #[error("fields must not be negative, got {0}")]
    NegativeFields(i64),

    #[error("invalid JSON data")]
    InvalidData(#[source] serde_json::Error),

    #[error("malformed header `{0}`: expected `key:value`")]
    MalformedHeader(String),
}

/// Coarse classification of a failed request, as reported next to each failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Encoding,
    Network,
    ResponseRead,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Encoding => "EncodingError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::ResponseRead => "ResponseReadError",
        })
    }
}

/// Why a single request did not complete. Never aborts a run.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to marshal JSON")]
    Encoding(#[source] serde_json::Error),

    #[error("failed to send request")]
    Send(#[source] hyper_util::client::legacy::Error),

    #[error("no response within {0:?}")]
    SendTimeout(Duration),

    #[error("failed to read response body")]
    Read(#[source] hyper::Error),

    #[error("response body not read within {0:?}")]
    ReadTimeout(Duration),
}

impl RequestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Encoding(_) => ErrorKind::Encoding,
            RequestError::Send(_) | RequestError::SendTimeout(_) => ErrorKind::Network,
            RequestError::Read(_) | RequestError::ReadTimeout(_) => ErrorKind::ResponseRead,
        }
    }
}

/// Renders an error followed by each of its causes, `outer: inner: innermost`.
pub struct Chain<'a>(pub &'a (dyn std::error::Error + 'static));

impl fmt::Display for Chain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(cause) = source {
            write!(f, ": {cause}")?;
            source = cause.source();
        }
        Ok(())
    }
}
