//! Logging initialization for the CLI
//!
//! Logs go to stderr so stdout stays clean for resource output. `RUST_LOG`
//! overrides the configured level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber, human-readable or JSON.
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::registry().with(build_env_filter(level));

    if json {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_writer(std::io::stderr);
        subscriber.with(layer).try_init()?;
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr);
        subscriber.with(layer).try_init()?;
    }

    tracing::debug!(level, json, "Logging initialized");
    Ok(())
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: &str) -> String {
    format!("ferrum={level},ferrum_cli={level},ferrum_client={level},ferrum_models={level},reqwest=warn,hyper=warn")
}
