//! Run configuration: command-line flags and the immutable values derived from them.

use std::time::Duration;

use argh::FromArgs;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Uri};
use serde_json::Value;

use crate::error::ConfigError;
use crate::generator::{GeneratorConfig, PayloadSource};

pub const DEFAULT_URL: &str = "http://localhost:5080";
pub const DEFAULT_USER: &str = "root@example.com";
pub const DEFAULT_PASS: &str = "Complexpass#123";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how every request of a run is sent. Shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    uri: Uri,
    authorization: Option<HeaderValue>,
    headers: HeaderMap,
    timeout: Duration,
}

impl ClientConfig {
    /// Basic authentication is attached unless both `username` and `password` are empty.
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self, ConfigError> {
        if url.is_empty() {
            return Err(ConfigError::EmptyUrl);
        }
        let uri: Uri = url.parse().map_err(|source| ConfigError::InvalidUrl {
            url: url.to_owned(),
            source,
        })?;
        if uri.scheme_str() != Some("http") || uri.host().is_none() {
            return Err(ConfigError::UnsupportedScheme(url.to_owned()));
        }
        let authorization =
            (!username.is_empty() || !password.is_empty()).then(|| basic_auth(username, password));
        Ok(Self {
            uri,
            authorization,
            headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Adds a header sent with every request, replacing any earlier value for `name`.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.authorization.as_ref()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// `Basic base64(username:password)`.
pub fn basic_auth(username: &str, password: &str) -> HeaderValue {
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::try_from(format!("Basic {credentials}"))
        .expect("base64 output is always a valid header value")
}

/// Parses a `key:value` header. Surrounding whitespace is trimmed from both parts.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ConfigError> {
    let malformed = || ConfigError::MalformedHeader(raw.to_owned());
    let (name, value) = raw.split_once(':').ok_or_else(malformed)?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|_| malformed())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| malformed())?;
    Ok((name, value))
}

/// Send JSON payloads to an HTTP endpoint, repeatedly and concurrently.
///
/// Long flags may be written with one or two dashes (`-url` or `--url`).
#[derive(Debug, FromArgs)]
pub struct CliArgs {
    /// target URL for POST request (plain http:// only)
    #[argh(option, default = "DEFAULT_URL.to_owned()")]
    pub url: String,

    /// username for basic auth
    #[argh(option, default = "DEFAULT_USER.to_owned()")]
    pub user: String,

    /// password for basic auth
    #[argh(option, default = "DEFAULT_PASS.to_owned()")]
    pub pass: String,

    /// number of times to run the request
    #[argh(option, default = "1")]
    pub times: i64,

    /// number of concurrent threads to use
    #[argh(option, default = "1")]
    pub threads: i64,

    /// JSON data to send (leave empty to auto-generate)
    #[argh(option, default = "String::new()")]
    pub data: String,

    /// additional header in format 'key:value'
    #[argh(option, default = "String::new()")]
    pub header: String,

    /// number of fields to generate in auto-generated data
    #[argh(option, default = "5")]
    pub fields: i64,

    /// number of records per request
    #[argh(option, default = "1")]
    pub records: i64,

    /// enable body field with random size (1KB-200KB)
    #[argh(switch)]
    pub body: bool,

    /// print one auto-generated payload before sending
    #[argh(switch)]
    pub preview: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            user: DEFAULT_USER.to_owned(),
            pass: DEFAULT_PASS.to_owned(),
            times: 1,
            threads: 1,
            data: String::new(),
            header: String::new(),
            fields: 5,
            records: 1,
            body: false,
            preview: false,
        }
    }
}

/// Everything a run needs, validated.
#[derive(Debug)]
pub struct RunConfig {
    pub client: ClientConfig,
    pub times: usize,
    pub threads: usize,
    pub payload: PayloadSource,
    pub preview: bool,
}

impl CliArgs {
    pub fn into_run_config(self) -> Result<RunConfig, ConfigError> {
        let mut client = ClientConfig::new(&self.url, &self.user, &self.pass)?;
        let threads = usize::try_from(self.threads)
            .ok()
            .filter(|threads| *threads >= 1)
            .ok_or(ConfigError::NoWorkers)?;
        let times = usize::try_from(self.times).map_err(|_| ConfigError::NegativeTimes(self.times))?;

        let payload = if self.data.is_empty() {
            let fields =
                usize::try_from(self.fields).map_err(|_| ConfigError::NegativeFields(self.fields))?;
            let records = usize::try_from(self.records)
                .ok()
                .filter(|records| *records >= 1)
                .ok_or(ConfigError::NoRecords(self.records))?;
            PayloadSource::Generated(GeneratorConfig {
                fields,
                records,
                body: self.body,
            })
        } else {
            let data: Value = serde_json::from_str(&self.data).map_err(ConfigError::InvalidData)?;
            PayloadSource::Fixed(data)
        };

        if !self.header.is_empty() {
            let (name, value) = parse_header(&self.header)?;
            client = client.with_header(name, value);
        }

        Ok(RunConfig {
            client,
            times,
            threads,
            payload,
            preview: self.preview,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_auth_matches_known_encoding() {
        assert_eq!(basic_auth("user", "pass"), "Basic dXNlcjpwYXNz");
        assert_eq!(
            basic_auth(DEFAULT_USER, DEFAULT_PASS),
            "Basic cm9vdEBleGFtcGxlLmNvbTpDb21wbGV4cGFzcyMxMjM="
        );
    }

    #[test]
    fn credentials_are_optional() {
        let config = ClientConfig::new("http://localhost:5080", "", "").unwrap();
        assert!(config.authorization().is_none());

        let config = ClientConfig::new("http://localhost:5080", "", "secret").unwrap();
        assert_eq!(config.authorization().unwrap(), &basic_auth("", "secret"));
    }

    #[test]
    fn usage_says_which_urls_are_accepted() {
        let early_exit = CliArgs::from_args(&["poster"], &["--help"]).unwrap_err();
        assert!(early_exit.status.is_ok());
        assert!(early_exit.output.contains("(plain http:// only)"));
    }

    #[test]
    fn rejects_unusable_urls() {
        assert!(matches!(
            ClientConfig::new("", "u", "p"),
            Err(ConfigError::EmptyUrl)
        ));
        assert!(matches!(
            ClientConfig::new("http://exa mple.com", "u", "p"),
            Err(ConfigError::InvalidUrl { .. })
        ));
        let https = ClientConfig::new("https://example.com", "u", "p").unwrap_err();
        assert!(matches!(https, ConfigError::UnsupportedScheme(_)));
        assert!(https.to_string().contains("only plain http://"));
        assert!(matches!(
            ClientConfig::new("localhost:5080", "u", "p"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn later_headers_replace_earlier_ones() {
        let (name, first) = parse_header("X-Tenant: one").unwrap();
        let (_, second) = parse_header("x-tenant:two").unwrap();
        let config = ClientConfig::new(DEFAULT_URL, "", "")
            .unwrap()
            .with_header(name.clone(), first)
            .with_header(name, second);
        assert_eq!(config.headers().len(), 1);
        assert_eq!(config.headers()["x-tenant"], "two");
    }

    #[test]
    fn header_value_may_contain_colons() {
        let (name, value) = parse_header("Forwarded-For : http://10.0.0.1:80 ").unwrap();
        assert_eq!(name, "forwarded-for");
        assert_eq!(value, "http://10.0.0.1:80");
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for raw in ["no-separator", ":value", "bad name:value", "name:bad\nvalue"] {
            assert!(
                matches!(parse_header(raw), Err(ConfigError::MalformedHeader(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn defaults_generate_single_records() {
        let config = CliArgs::default().into_run_config().unwrap();
        assert_eq!(config.times, 1);
        assert_eq!(config.threads, 1);
        assert_eq!(config.client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(config.client.uri().host(), Some("localhost"));
        assert_eq!(config.client.uri().port_u16(), Some(5080));
        assert!(matches!(
            config.payload,
            PayloadSource::Generated(GeneratorConfig {
                fields: 5,
                records: 1,
                body: false
            })
        ));
    }

    #[test]
    fn fixed_data_is_parsed_once() {
        let args = CliArgs {
            data: r#"{"test":"data"}"#.to_owned(),
            header: "X-Api-Key: abc".to_owned(),
            ..CliArgs::default()
        };
        let config = args.into_run_config().unwrap();
        match config.payload {
            PayloadSource::Fixed(value) => assert_eq!(value, serde_json::json!({"test": "data"})),
            other => panic!("unexpected payload source {other:?}"),
        }
        assert_eq!(config.client.headers()["x-api-key"], "abc");
    }

    #[test]
    fn invalid_arguments_are_config_errors() {
        let cases = [
            CliArgs {
                url: String::new(),
                ..CliArgs::default()
            },
            CliArgs {
                threads: 0,
                ..CliArgs::default()
            },
            CliArgs {
                threads: -4,
                ..CliArgs::default()
            },
            CliArgs {
                times: -1,
                ..CliArgs::default()
            },
            CliArgs {
                data: "{not json".to_owned(),
                ..CliArgs::default()
            },
            CliArgs {
                header: "missing-colon".to_owned(),
                ..CliArgs::default()
            },
            CliArgs {
                records: 0,
                ..CliArgs::default()
            },
            CliArgs {
                fields: -1,
                ..CliArgs::default()
            },
        ];
        for args in cases {
            let debug = format!("{args:?}");
            assert!(args.into_run_config().is_err(), "{debug} should be rejected");
        }
    }

    #[test]
    fn threads_zero_is_reported_as_such() {
        let args = CliArgs {
            threads: 0,
            ..CliArgs::default()
        };
        assert!(matches!(args.into_run_config(), Err(ConfigError::NoWorkers)));
    }
}
