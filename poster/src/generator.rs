//! Synthesizes nginx-style access-log payloads.
//!
//! Every draw goes through the `Rng` handed in by the caller. At runtime that is the
//! thread-local generator, so concurrent workers never contend on shared state.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{Local, SecondsFormat};
use rand::distr::Alphanumeric;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "PATCH"];
pub const STATUSES: [u16; 7] = [200, 201, 400, 401, 403, 404, 500];

const PATHS: [&str; 16] = [
    "/api/users",
    "/api/posts",
    "/api/comments",
    "/api/products",
    "/api/orders",
    "/api/categories",
    "/api/search",
    "/api/analytics",
    "/api/reports",
    "/api/settings",
    "/api/profile",
    "/api/dashboard",
    "/api/notifications",
    "/api/messages",
    "/api/files",
    "/api/upload",
];

const USER_AGENTS: [&str; 5] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X) AppleWebKit/605.1.15",
    "Mozilla/5.0 (Android 11; Mobile; rv:68.0) Gecko/68.0 Firefox/68.0",
];

const REFERERS: [&str; 9] = [
    "https://www.google.com",
    "https://www.facebook.com",
    "https://www.twitter.com",
    "https://www.linkedin.com",
    "https://www.github.com",
    "https://www.stackoverflow.com",
    "https://www.reddit.com",
    "https://www.youtube.com",
    "https://www.amazon.com",
];

const FIELD_NAMES: [&str; 10] = [
    "user_id",
    "session_id",
    "action",
    "resource",
    "category",
    "priority",
    "level",
    "source",
    "target",
    "metadata",
];

/// `timestamp`, `request_id` and `message` are always present.
pub const BASE_FIELDS: usize = 3;
pub const REQUEST_ID_LEN: usize = 16;

/// Random body sizes are drawn from `BODY_KB` kibibytes before encoding.
pub const BODY_KB: std::ops::Range<usize> = 1..200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Fields per record, including the base fields.
    pub fields: usize,
    /// 1 produces a single object, anything else an array of that many objects.
    pub records: usize,
    /// Attach a random base64 `body` to every log record.
    pub body: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            fields: 5,
            records: 1,
            body: false,
        }
    }
}

/// One access-log line, serialized into the `message` field of a generated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub ip: String,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub bytes: u32,
    pub user_agent: String,
    pub referer: String,
    pub request_time: f64,
    pub remote_addr: String,
    pub server_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl LogRecord {
    pub fn random<R: Rng + ?Sized>(with_body: bool, rng: &mut R) -> Self {
        Self {
            timestamp: now_rfc3339(),
            ip: random_ip(rng),
            method: pick(&METHODS, rng).to_owned(),
            path: pick(&PATHS, rng).to_owned(),
            status: pick(&STATUSES, rng),
            bytes: rng.random_range(100..10_100),
            user_agent: pick(&USER_AGENTS, rng).to_owned(),
            referer: pick(&REFERERS, rng).to_owned(),
            request_time: rng.random::<f64>() * 2.0 + 0.1,
            remote_addr: random_ip(rng),
            server_name: format!("nginx-server-{}", random_string(4, rng)),
            body: with_body.then(|| random_body(rng)),
        }
    }
}

/// Produces one payload: a record, or an array of `config.records` records.
pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Value {
    if config.records == 1 {
        return Value::Object(generate_record(config, rng));
    }
    (0..config.records)
        .map(|_| Value::Object(generate_record(config, rng)))
        .collect()
}

pub fn generate_record<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Map<String, Value> {
    let log = LogRecord::random(config.body, rng);
    let mut record = Map::new();
    if let Ok(message) = serde_json::to_string(&log) {
        record.insert("message".to_owned(), Value::String(message));
    }
    record.insert("timestamp".to_owned(), Value::String(now_rfc3339()));
    record.insert(
        "request_id".to_owned(),
        Value::String(random_string(REQUEST_ID_LEN, rng)),
    );

    for i in 0..config.fields.saturating_sub(BASE_FIELDS) {
        let name = format!("{}{i}", FIELD_NAMES[i % FIELD_NAMES.len()]);
        let value = match rng.random_range(0..3) {
            0 => {
                let len = rng.random_range(5..25);
                Value::String(random_string(len, rng))
            }
            1 => Value::from(rng.random_range(0..10_000u32)),
            _ => Value::Bool(rng.random_bool(0.5)),
        };
        record.insert(name, value);
    }
    record
}

fn pick<T: Copy, R: Rng + ?Sized>(choices: &[T], rng: &mut R) -> T {
    choices[rng.random_range(0..choices.len())]
}

fn now_rfc3339() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn random_string<R: Rng + ?Sized>(len: usize, rng: &mut R) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

pub fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    let [a, b, c, d]: [u8; 4] = rng.random();
    format!("{a}.{b}.{c}.{d}")
}

/// Base64 of a random binary blob, sized within [`BODY_KB`].
pub fn random_body<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut blob = vec![0u8; rng.random_range(BODY_KB) * 1024];
    rng.fill_bytes(&mut blob);
    STANDARD.encode(blob)
}

/// Supplies the payload for each request.
pub trait PayloadProducer: Send + Sync {
    fn produce(&self) -> Cow<'_, Value>;
}

impl<F> PayloadProducer for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn produce(&self) -> Cow<'_, Value> {
        Cow::Owned(self())
    }
}

/// Chosen once at startup: reuse one payload, or synthesize a fresh one per request.
#[derive(Debug, Clone)]
pub enum PayloadSource {
    Fixed(Value),
    Generated(GeneratorConfig),
}

impl PayloadProducer for PayloadSource {
    fn produce(&self) -> Cow<'_, Value> {
        match self {
            PayloadSource::Fixed(value) => Cow::Borrowed(value),
            PayloadSource::Generated(config) => Cow::Owned(generate(config, &mut rand::rng())),
        }
    }
}
