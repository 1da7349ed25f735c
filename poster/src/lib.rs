//! Concurrent HTTP load generation with JSON payloads.
//!
//! A [`dispatcher::Dispatcher`] drives a fixed pool of workers over a queue of request numbers.
//! Each worker asks a [`generator::PayloadProducer`] for a payload, posts it with
//! [`client::HttpClient`], and folds the [`statistics::RequestOutcome`] into one shared
//! [`statistics::Aggregate`].

pub mod cli;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod generator;
pub mod report;
pub mod statistics;
