//! HTTP plumbing shared by the load generator, the sink server and their tests.

pub mod drain;
pub mod sink;
pub mod tracing;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use bytes::Bytes;
use http_body_util::Full;

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

#[derive(Debug, Clone, Default)]
pub struct SharedCounter {
    count: Arc<AtomicUsize>,
}

impl SharedCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `num` and returns the value before the addition.
    #[inline]
    pub fn increment(&self, num: usize) -> usize {
        self.count.fetch_add(num, Ordering::AcqRel)
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}
