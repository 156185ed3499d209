//! FHIR command-line client
//!
//! Reads settings from `FHIR_CLIENT_*` environment variables (a `.env` file
//! is honoured); flags override them.

mod commands;
mod logging;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ferrum_client::{ClientConfig, FhirClient, FhirVersion};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ferrum", version, about = "Talk to a FHIR server from the command line")]
struct Cli {
    /// Service base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// FHIR release of the server (R4 or R5)
    #[arg(long, global = true)]
    fhir_version: Option<FhirVersion>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Extra request header, `Name: value`; may be repeated
    #[arg(long = "header", short = 'H', global = true)]
    headers: Vec<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read a resource, or one version of it
    Read {
        resource_type: String,
        id: String,
        /// Version id for a vread
        #[arg(long)]
        version: Option<String>,
    },
    /// Search a resource type with `name=value` parameters
    Search {
        resource_type: String,
        params: Vec<String>,
        /// Page size
        #[arg(long)]
        count: Option<u32>,
        /// Print the whole Bundle instead of one line per entry
        #[arg(long)]
        raw: bool,
    },
    /// History of one resource, or of a whole type when no id is given
    History {
        resource_type: String,
        id: Option<String>,
        /// Only versions after this instant (RFC 3339)
        #[arg(long)]
        since: Option<String>,
    },
    /// Decode a JSON file (or stdin) offline and re-encode it
    Decode {
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init_logging(&cli.log_level, cli.log_json).context("Failed to initialize logging")?;

    match &cli.command {
        Command::Decode { file } => commands::decode(file.as_deref()),
        Command::Read {
            resource_type,
            id,
            version,
        } => {
            let client = build_client(&cli)?;
            commands::read(&client, resource_type, id, version.as_deref()).await
        }
        Command::Search {
            resource_type,
            params,
            count,
            raw,
        } => {
            let client = build_client(&cli)?;
            let params = commands::parse_search_params(params, *count)?;
            commands::search(&client, resource_type, &params, *raw).await
        }
        Command::History {
            resource_type,
            id,
            since,
        } => {
            let client = build_client(&cli)?;
            commands::history(&client, resource_type, id.as_deref(), since.as_deref()).await
        }
    }
}

fn build_client(cli: &Cli) -> anyhow::Result<FhirClient> {
    let config = client_config(cli)?;
    tracing::info!(base_url = %config.base_url, fhir_version = %config.fhir_version, "Using FHIR server");
    FhirClient::from_config(config).context("Failed to create FHIR client")
}

/// Environment configuration overlaid with command-line flags
fn client_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Failed to load client configuration")?;

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(fhir_version) = cli.fhir_version {
        config.fhir_version = fhir_version;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Some(timeout);
    }
    for header in &cli.headers {
        let (name, value) = commands::parse_header(header)?;
        config.headers.insert(name, value);
    }

    config.validate()?;
    Ok(config)
}
