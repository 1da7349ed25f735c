use std::time::Duration;

use hyper::StatusCode;

use crate::error::RequestError;

/// The result of one request.
#[derive(Debug)]
pub struct RequestOutcome {
    /// Absent when no response arrived.
    pub status: Option<StatusCode>,
    pub body: String,
    /// From just before serialization to just after the body was read, or to the failure.
    pub duration: Duration,
    pub error: Option<RequestError>,
}

impl RequestOutcome {
    #[must_use]
    pub fn completed(status: StatusCode, body: String, duration: Duration) -> Self {
        Self {
            status: Some(status),
            body,
            duration,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(status: Option<StatusCode>, error: RequestError, duration: Duration) -> Self {
        Self {
            status,
            body: String::new(),
            duration,
            error: Some(error),
        }
    }

    /// A response was received and read, whatever its status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Run-wide totals, folded from every outcome.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub total_duration: Duration,
    pub successes: usize,
    pub failures: usize,
    pub fastest: Option<Duration>,
    pub slowest: Option<Duration>,
}

impl Aggregate {
    pub fn merge(&mut self, outcome: &RequestOutcome) {
        if outcome.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        let cur = outcome.duration;
        self.total_duration += cur;
        self.fastest = Some(self.fastest.map_or(cur, |min| min.min(cur)));
        self.slowest = Some(self.slowest.map_or(cur, |max| max.max(cur)));
    }

    #[inline]
    #[must_use]
    pub fn processed(&self) -> usize {
        self.successes + self.failures
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Summary {
    pub times: usize,
    pub threads: usize,
    pub successes: usize,
    pub failures: usize,
    pub total_duration: Duration,
    pub fastest: Option<Duration>,
    pub slowest: Option<Duration>,
}

impl Summary {
    #[must_use]
    pub fn new(times: usize, threads: usize, aggregate: Aggregate) -> Self {
        Self {
            times,
            threads,
            successes: aggregate.successes,
            failures: aggregate.failures,
            total_duration: aggregate.total_duration,
            fastest: aggregate.fastest,
            slowest: aggregate.slowest,
        }
    }

    /// `None` when no request was planned.
    #[must_use]
    pub fn average(&self) -> Option<Duration> {
        if self.times == 0 {
            return None;
        }
        let nanos = self.total_duration.as_nanos() / self.times as u128;
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}
