use std::process::ExitCode;

use anyhow::Context;
use poster::client::HttpClient;
use poster::config::{CliArgs, RunConfig};
use poster::dispatcher::Dispatcher;
use poster::generator::{generate, PayloadSource};
use poster::report;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    let args: CliArgs = poster::cli::from_env();
    match run_poster(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("❌ Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn run_poster(args: CliArgs) -> anyhow::Result<()> {
    let config = args.into_run_config()?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    rt.block_on(run(config))
}

async fn run(config: RunConfig) -> anyhow::Result<()> {
    let RunConfig {
        client,
        times,
        threads,
        payload,
        preview,
    } = config;

    if let Some(warning) = report::thread_warning(threads) {
        println!("{warning}");
    }
    if let PayloadSource::Generated(generator) = &payload {
        println!("🔄 Will auto-generate new data for each request\n");
        if preview {
            let sample = generate(generator, &mut rand::rng());
            let sample = serde_json::to_string_pretty(&sample).context("failed to render preview")?;
            println!("📝 Sample payload:\n{sample}\n");
        }
    }

    print!("{}", report::banner(times, threads, &client.uri().to_string()));
    let dispatcher = Dispatcher::new(HttpClient::new(), client, payload);
    let summary = dispatcher.run(times, threads).await?;
    print!("{}", report::format_summary(&summary));
    Ok(())
}
