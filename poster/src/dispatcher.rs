//! Runs a fixed pool of workers over a queue of request numbers.
//!
//! Every worker claims the next unclaimed number, fetches a payload, sends it, and folds the
//! outcome into the one shared [`Aggregate`] under a mutex. The run ends when every worker has
//! found the queue empty. Completion order across workers is unspecified; the totals are exact.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::ConfigError;
use crate::generator::PayloadProducer;
use crate::report;
use crate::statistics::{Aggregate, RequestOutcome, Summary};

/// Above this many workers a run still proceeds, but the caller should warn.
pub const RECOMMENDED_MAX_THREADS: usize = 100;

/// A planned request, numbered from 1. Only used for display.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkItem(pub usize);

/// Hands out `1..=total`, each number exactly once.
#[derive(Debug)]
pub struct WorkQueue {
    claimed: AtomicUsize,
    total: usize,
}

impl WorkQueue {
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            claimed: AtomicUsize::new(0),
            total,
        }
    }

    /// `None` once all items have been handed out.
    #[inline]
    pub fn claim(&self) -> Option<WorkItem> {
        let seq = self.claimed.fetch_add(1, Ordering::AcqRel) + 1;
        (seq <= self.total).then_some(WorkItem(seq))
    }
}

/// Everything a worker may mutate, behind one lock.
struct Shared<W> {
    aggregate: Aggregate,
    out: W,
}

pub struct Dispatcher<P> {
    client: HttpClient,
    config: Arc<ClientConfig>,
    producer: Arc<P>,
}

impl<P> Dispatcher<P>
where
    P: PayloadProducer + 'static,
{
    pub fn new(client: HttpClient, config: ClientConfig, producer: P) -> Self {
        Self {
            client,
            config: Arc::new(config),
            producer: Arc::new(producer),
        }
    }

    /// Sends `times` requests from `threads` workers, printing one block per request to stdout.
    pub async fn run(&self, times: usize, threads: usize) -> Result<Summary, ConfigError> {
        self.run_with_output(times, threads, io::stdout()).await
    }

    /// Like [`Dispatcher::run`], writing the per-request blocks to `out`.
    ///
    /// Fails only if `threads` is zero, in which case nothing is sent.
    pub async fn run_with_output<W>(
        &self,
        times: usize,
        threads: usize,
        out: W,
    ) -> Result<Summary, ConfigError>
    where
        W: io::Write + Send + 'static,
    {
        if threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if threads > RECOMMENDED_MAX_THREADS {
            tracing::debug!(
                threads,
                "more than {RECOMMENDED_MAX_THREADS} workers may cause performance issues"
            );
        }

        let queue = Arc::new(WorkQueue::new(times));
        let shared = Arc::new(Mutex::new(Shared {
            aggregate: Aggregate::default(),
            out,
        }));

        let mut tasks = Vec::with_capacity(threads);
        for id in 0..threads {
            let worker = Worker {
                id,
                times,
                queue: Arc::clone(&queue),
                client: self.client.clone(),
                config: Arc::clone(&self.config),
                producer: Arc::clone(&self.producer),
                shared: Arc::clone(&shared),
            };
            tasks.push(tokio::spawn(worker.run()));
        }
        for task in tasks {
            if let Err(err) = task.await {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
            }
        }

        let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = shared.out.flush() {
            tracing::warn!(error = %err, "failed to flush request output");
        }
        Ok(Summary::new(times, threads, shared.aggregate))
    }
}

struct Worker<P, W> {
    id: usize,
    times: usize,
    queue: Arc<WorkQueue>,
    client: HttpClient,
    config: Arc<ClientConfig>,
    producer: Arc<P>,
    shared: Arc<Mutex<Shared<W>>>,
}

impl<P, W> Worker<P, W>
where
    P: PayloadProducer + 'static,
    W: io::Write,
{
    async fn run(self) {
        tracing::debug!(worker = self.id, "worker started");
        let mut handled = 0usize;
        while let Some(item) = self.queue.claim() {
            let Some(payload) = self.payload().await else {
                break;
            };
            let outcome = self.client.post_json(&self.config, &payload).await;
            self.merge(item, &outcome);
            handled += 1;
        }
        tracing::debug!(worker = self.id, handled, "queue drained");
    }

    /// Builds the next payload on the blocking pool, so generation never holds up the runtime
    /// threads other workers are timing their requests on.
    ///
    /// `None` only if the runtime is shutting down.
    async fn payload(&self) -> Option<serde_json::Value> {
        let producer = Arc::clone(&self.producer);
        match tokio::task::spawn_blocking(move || producer.produce().into_owned()).await {
            Ok(payload) => Some(payload),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                tracing::debug!(worker = self.id, error = %err, "payload generation cancelled");
                None
            }
        }
    }

    fn merge(&self, item: WorkItem, outcome: &RequestOutcome) {
        let mut shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.aggregate.merge(outcome);
        if let Err(err) = report::write_outcome(&mut shared.out, item, self.times, outcome) {
            tracing::warn!(error = %err, request = item.0, "failed to write request output");
        }
    }
}
