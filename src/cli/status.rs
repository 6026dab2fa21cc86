//! Status command handler
//!
//! Shows the configured providers, the carpark metadata and server status.

use crate::config::Config;
use crate::error::Result;
use crate::provider::available_providers;
use crate::store::{CarparkTable, CsvSources};
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Check if server is running (tries to connect)
    #[arg(long)]
    pub server: bool,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load()?;

    if args.server {
        check_server_status(&config).await;
    }

    println!("carpark-finder v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let mode = if config.providers.mock { "mock" } else { "live" };
    println!("Providers: {}", mode);
    for provider in available_providers() {
        println!("  {:<7} {}", provider.name, provider.description);
    }
    if !config.providers.mock && config.api_keys.onemap_email.is_empty() {
        println!("  Warning: OneMap credentials are not configured; routing will use estimates");
    }
    println!(
        "  Live availability: {}",
        if config.providers.live_availability { "on" } else { "off" }
    );
    println!();

    let sources = CsvSources::from_config(&config.data);
    println!("Metadata: {}", sources.carparks.display());
    match CarparkTable::read(&sources) {
        Ok(table) => println!("  {} carparks loaded", table.len()),
        Err(e) => println!("  Error: {}", e),
    }
    if let Some(rates) = &sources.rates {
        println!("Rates: {}", rates.display());
    }

    Ok(())
}

/// Check if the server is running
async fn check_server_status(config: &Config) {
    let url = format!("http://{}/api/status", config.server_addr());

    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => {
            println!("Server: RUNNING on {}", config.server_addr());
            if let Ok(status) = response.json::<serde_json::Value>().await {
                if let Some(version) = status.get("version").and_then(|v| v.as_str()) {
                    println!("  Version: {}", version);
                }
                if let Some(count) = status.get("carparks").and_then(|v| v.as_u64()) {
                    println!("  Carparks: {}", count);
                }
            }
        }
        Ok(response) => println!("Server: ERROR (status {})", response.status()),
        Err(_) => println!("Server: NOT RUNNING on {}", config.server_addr()),
    }
    println!();
}
