use tracing_subscriber::EnvFilter;

const CRATE_NAMES: &[&str] = &["poster", "sink_server", "http_test_util"];

/// Initialize the logger for testing.
///
/// Logs go to the writer captured by the Rust test runner. Only events from this workspace's
/// crates are kept at full verbosity; everything else is limited to errors.
pub fn init() {
    let mut env_filter = EnvFilter::new("ERROR");

    for name in CRATE_NAMES {
        env_filter = env_filter.add_directive(format!("{name}=TRACE").parse().unwrap());
    }

    tracing_subscriber::fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
