//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "defaults.radius")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (args.key.as_deref(), args.value.as_deref()) {
        (None, None) => show_all_config(&config),
        (Some(key), None) => {
            let value = config.get(key).ok_or_else(|| unknown_key(key))?;
            println!("{}", value);
        }
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "Unknown config key: {}. Available keys: {}",
        key,
        Config::available_keys().join(", ")
    ))
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[defaults]");
    println!("radius = {}", config.defaults.radius);
    println!("vehicle = \"{}\"", config.defaults.vehicle);
    println!("vehicle_height = {}", config.defaults.vehicle_height);
    println!("format = \"{}\"", config.defaults.format);
    println!("nearest = {}", config.defaults.nearest);
    println!();

    println!("[providers]");
    println!("mock = {}", config.providers.mock);
    println!("timeout_ms = {}", config.providers.timeout_ms);
    println!("retry_attempts = {}", config.providers.retry_attempts);
    println!("live_availability = {}", config.providers.live_availability);
    println!("route_concurrency = {}", config.providers.route_concurrency);
    println!();

    println!("[data]");
    println!("carparks_csv = \"{}\"", config.data.carparks_csv);
    println!("rates_csv = \"{}\"", config.data.rates_csv);
    println!();

    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
    println!();

    println!("[url]");
    println!("default = \"{}\"", config.url.default);
    println!();

    println!("[url.providers]");
    for (name, template) in &config.url.providers {
        println!("{} = \"{}\"", name, template);
    }
    println!();

    println!("[api_keys]");
    print_secret("onemap_email", &config.api_keys.onemap_email);
    print_secret("onemap_password", &config.api_keys.onemap_password);
    print_secret("datagov", &config.api_keys.datagov);
}

fn print_secret(key: &str, value: &str) {
    if value.is_empty() {
        println!("{} = \"\" # not configured", key);
    } else {
        println!("{} = \"***\" # configured", key);
    }
}
