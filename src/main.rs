//! Operator CLI for the resilient API client.
//!
//! Loads configuration, builds an [`ApiService`] and prints results as JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Method;
use serde::Serialize;

use resilient_api::config::{load_config, load_from_env};
use resilient_api::observability::logging::init_logging;
use resilient_api::{ApiService, RequestOptions};

#[derive(Parser)]
#[command(name = "resilient-api")]
#[command(about = "Query the exam-prep backend through the resilience layer", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults and environment variables otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe the backend health endpoint
    Health,
    /// Warm the cache and report system health
    Preload,
    /// GET an arbitrary path
    Get {
        path: String,
        /// Query parameter as key=value; repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Serve and store through the response cache
        #[arg(long)]
        cached: bool,
    },
    /// List positions and study blocks
    Options,
    /// List subscription plans
    Plans,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };
    init_logging(&config.observability);

    tracing::info!(
        base_url = %config.api.base_url,
        timeout_ms = config.api.timeout_ms,
        max_retries = config.retries.max_retries,
        "Configuration loaded"
    );

    let service = ApiService::new(config)?;

    match cli.command {
        Commands::Health => print_json(&service.health_check().await?)?,
        Commands::Preload => {
            service.preload_critical_data().await;
            print_json(&service.get_system_health())?;
        }
        Commands::Get { path, params, cached } => {
            let mut options = RequestOptions::new();
            for (key, value) in params {
                options = options.param(key, value);
            }
            if cached {
                options = options.cached();
            }
            let value = service.request_value(Method::GET, &path, options).await?;
            print_json(&value)?;
        }
        Commands::Options => print_json(&service.get_options_data().await?)?,
        Commands::Plans => print_json(&service.get_plans().await?)?,
    }

    service.shutdown().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
