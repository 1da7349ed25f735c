//! Human-readable run output: the banner, one block per request and the final summary.

use std::fmt::Write as _;
use std::io;

use crate::dispatcher::{WorkItem, RECOMMENDED_MAX_THREADS};
use crate::error::Chain;
use crate::statistics::{RequestOutcome, Summary};

const RULE_WIDTH: usize = 50;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn banner(times: usize, threads: usize, url: &str) -> String {
    let mut out = format!("Running HTTP POST request {times} times to: {url}\n");
    if threads > 1 {
        let _ = writeln!(out, "Using {threads} concurrent threads");
    }
    let _ = writeln!(out, "{}", rule());
    out
}

/// The single warning line for an oversized worker pool, if `threads` calls for one.
pub fn thread_warning(threads: usize) -> Option<String> {
    (threads > RECOMMENDED_MAX_THREADS).then(|| {
        format!(
            "⚠️  Warning: Using more than {RECOMMENDED_MAX_THREADS} threads may cause performance issues"
        )
    })
}

/// Writes the block for one finished request.
pub fn write_outcome<W: io::Write>(
    out: &mut W,
    item: WorkItem,
    times: usize,
    outcome: &RequestOutcome,
) -> io::Result<()> {
    let WorkItem(seq) = item;
    match &outcome.error {
        None => {
            let status = outcome.status.map_or(0, |status| status.as_u16());
            writeln!(out, "\n[Request {seq}/{times}] ✅ Status: {status}")?;
            writeln!(out, "📄 Response Body: {}", outcome.body)?;
        }
        Some(err) => {
            write!(
                out,
                "\n[Request {seq}/{times}] ❌ Error: {}: {}",
                err.kind(),
                Chain(err)
            )?;
            match outcome.status {
                Some(status) => writeln!(out, " (status {})", status.as_u16())?,
                None => writeln!(out)?,
            }
        }
    }
    writeln!(out, "⏱️  Duration: {:?}", outcome.duration)
}

pub fn format_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", rule());
    let _ = writeln!(out, "📊 Summary:");
    let _ = writeln!(out, "   Total Requests: {}", summary.times);
    let _ = writeln!(out, "   Concurrent Threads: {}", summary.threads);
    let _ = writeln!(out, "   Successful: {}", summary.successes);
    let _ = writeln!(out, "   Failed: {}", summary.failures);
    let _ = writeln!(out, "   Total Duration: {:?}", summary.total_duration);
    match summary.average() {
        Some(average) => {
            let _ = writeln!(out, "   Average Duration: {average:?}");
        }
        None => {
            let _ = writeln!(out, "   Average Duration: n/a");
        }
    }
    if let (Some(fastest), Some(slowest)) = (summary.fastest, summary.slowest) {
        let _ = writeln!(out, "   Fastest: {fastest:?}");
        let _ = writeln!(out, "   Slowest: {slowest:?}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RequestError;
    use crate::statistics::Aggregate;
    use hyper::StatusCode;
    use std::time::Duration;

    #[test]
    fn banner_mentions_threads_only_when_concurrent() {
        let single = banner(3, 1, "http://localhost:5080");
        assert!(single.starts_with("Running HTTP POST request 3 times to: http://localhost:5080\n"));
        assert!(!single.contains("concurrent"));

        let many = banner(3, 8, "http://localhost:5080");
        assert!(many.contains("Using 8 concurrent threads\n"));
    }

    #[test]
    fn only_pools_above_the_limit_are_warned_about() {
        assert_eq!(thread_warning(1), None);
        assert_eq!(thread_warning(RECOMMENDED_MAX_THREADS), None);
        let warning = thread_warning(RECOMMENDED_MAX_THREADS + 1).unwrap();
        assert!(warning.starts_with("⚠️  Warning: Using more than 100 threads"));
        assert_eq!(warning.lines().count(), 1);
    }

    #[test]
    fn success_block_shows_status_and_body() {
        let outcome =
            RequestOutcome::completed(StatusCode::OK, "ok".to_owned(), Duration::from_millis(12));
        let mut out = Vec::new();
        write_outcome(&mut out, WorkItem(2), 3, &outcome).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\n[Request 2/3] ✅ Status: 200\n📄 Response Body: ok\n⏱️  Duration: 12ms\n"
        );
    }

    #[test]
    fn failure_block_names_the_error_kind() {
        let outcome = RequestOutcome::failed(
            None,
            RequestError::SendTimeout(Duration::from_secs(30)),
            Duration::from_secs(30),
        );
        let mut out = Vec::new();
        write_outcome(&mut out, WorkItem(1), 1, &outcome).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[Request 1/1] ❌ Error: NetworkError: no response within 30s\n"));
        assert!(text.ends_with("⏱️  Duration: 30s\n"));
    }

    #[test]
    fn failure_block_keeps_known_status() {
        let outcome = RequestOutcome::failed(
            Some(StatusCode::OK),
            RequestError::ReadTimeout(Duration::from_secs(1)),
            Duration::from_secs(1),
        );
        let mut out = Vec::new();
        write_outcome(&mut out, WorkItem(1), 1, &outcome).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ResponseReadError: response body not read within 1s (status 200)\n"));
    }

    #[test]
    fn summary_lists_totals() {
        let mut aggregate = Aggregate::default();
        aggregate.merge(&RequestOutcome::completed(
            StatusCode::OK,
            String::new(),
            Duration::from_millis(10),
        ));
        aggregate.merge(&RequestOutcome::completed(
            StatusCode::OK,
            String::new(),
            Duration::from_millis(30),
        ));
        let text = format_summary(&Summary::new(2, 2, aggregate));
        assert!(text.contains("📊 Summary:\n"));
        assert!(text.contains("   Total Requests: 2\n"));
        assert!(text.contains("   Concurrent Threads: 2\n"));
        assert!(text.contains("   Successful: 2\n"));
        assert!(text.contains("   Failed: 0\n"));
        assert!(text.contains("   Total Duration: 40ms\n"));
        assert!(text.contains("   Average Duration: 20ms\n"));
        assert!(text.contains("   Fastest: 10ms\n"));
        assert!(text.contains("   Slowest: 30ms\n"));
    }

    #[test]
    fn summary_without_requests_has_no_average() {
        let text = format_summary(&Summary::new(0, 1, Aggregate::default()));
        assert!(text.contains("   Average Duration: n/a\n"));
        assert!(!text.contains("Fastest"));
    }
}
