//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/carpark-finder/config.toml

pub mod defaults;

use crate::carpark::{LotType, Vehicle};
use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default values for searches
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Upstream provider behaviour
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Metadata sources
    #[serde(default)]
    pub data: DataConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// URL generation settings
    #[serde(default)]
    pub url: UrlConfig,

    /// Credentials for external services
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

/// Default values for searches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default search radius in meters
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Default vehicle class (car, heavy, sidecar, motorcycle)
    #[serde(default = "default_vehicle")]
    pub vehicle: String,

    /// Default vehicle height in meters
    #[serde(default = "default_vehicle_height")]
    pub vehicle_height: f64,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: String,

    /// Default result count for nearest lookups
    #[serde(default = "default_nearest")]
    pub nearest: usize,
}

/// Upstream provider behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Use deterministic offline providers instead of live services
    #[serde(default)]
    pub mock: bool,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retries after a failed upstream call
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Merge live lot availability into results
    #[serde(default)]
    pub live_availability: bool,

    /// Maximum concurrent routing calls per search
    #[serde(default = "default_route_concurrency")]
    pub route_concurrency: usize,
}

/// Metadata sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Carpark metadata CSV
    #[serde(default = "default_carparks_csv")]
    pub carparks_csv: String,

    /// Carpark rates CSV (empty to disable)
    #[serde(default = "default_rates_csv")]
    pub rates_csv: String,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// URL generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlConfig {
    /// Default URL provider
    #[serde(default = "default_url_provider")]
    pub default: String,

    /// URL provider templates
    #[serde(default = "default_url_providers")]
    pub providers: HashMap<String, String>,
}

/// Credentials for external services
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiKeysConfig {
    /// OneMap account email
    #[serde(default)]
    pub onemap_email: String,

    /// OneMap account password
    #[serde(default)]
    pub onemap_password: String,

    /// data.gov.sg API key (optional)
    #[serde(default)]
    pub datagov: String,
}

// Default value functions for serde
fn default_radius() -> f64 {
    DEFAULT_RADIUS
}
fn default_vehicle() -> String {
    DEFAULT_VEHICLE.to_string()
}
fn default_vehicle_height() -> f64 {
    DEFAULT_VEHICLE_HEIGHT
}
fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}
fn default_nearest() -> usize {
    DEFAULT_NEAREST
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}
fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}
fn default_route_concurrency() -> usize {
    DEFAULT_ROUTE_CONCURRENCY
}
fn default_carparks_csv() -> String {
    DEFAULT_CARPARKS_CSV.to_string()
}
fn default_rates_csv() -> String {
    DEFAULT_RATES_CSV.to_string()
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_url_provider() -> String {
    DEFAULT_URL_PROVIDER.to_string()
}
fn default_url_providers() -> HashMap<String, String> {
    let mut providers = HashMap::new();
    providers.insert(
        "google".to_string(),
        "https://www.google.com/maps/search/?api=1&query={lat},{lng}".to_string(),
    );
    providers.insert(
        "openstreetmap".to_string(),
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lng}#map=18/{lat}/{lng}".to_string(),
    );
    providers.insert(
        "onemap".to_string(),
        "https://www.onemap.gov.sg/?lat={lat}&lng={lng}".to_string(),
    );
    providers
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            vehicle: default_vehicle(),
            vehicle_height: default_vehicle_height(),
            format: default_format(),
            nearest: default_nearest(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            mock: false,
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            live_availability: false,
            route_concurrency: default_route_concurrency(),
        }
    }
}

impl ProvidersConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            carparks_csv: default_carparks_csv(),
            rates_csv: default_rates_csv(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            default: default_url_provider(),
            providers: default_url_providers(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["defaults", "radius"] => Some(self.defaults.radius.to_string()),
            ["defaults", "vehicle"] => Some(self.defaults.vehicle.clone()),
            ["defaults", "vehicle_height"] => Some(self.defaults.vehicle_height.to_string()),
            ["defaults", "format"] => Some(self.defaults.format.clone()),
            ["defaults", "nearest"] => Some(self.defaults.nearest.to_string()),

            ["providers", "mock"] => Some(self.providers.mock.to_string()),
            ["providers", "timeout_ms"] => Some(self.providers.timeout_ms.to_string()),
            ["providers", "retry_attempts"] => Some(self.providers.retry_attempts.to_string()),
            ["providers", "live_availability"] => {
                Some(self.providers.live_availability.to_string())
            }
            ["providers", "route_concurrency"] => {
                Some(self.providers.route_concurrency.to_string())
            }

            ["data", "carparks_csv"] => Some(self.data.carparks_csv.clone()),
            ["data", "rates_csv"] => Some(self.data.rates_csv.clone()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["url", "default"] => Some(self.url.default.clone()),

            ["api_keys", "onemap_email"] => Some(self.api_keys.onemap_email.clone()),
            ["api_keys", "onemap_password"] => Some(self.api_keys.onemap_password.clone()),
            ["api_keys", "datagov"] => Some(self.api_keys.datagov.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .parse()
                .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
        }

        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["defaults", "radius"] => {
                let radius: f64 = parse(key, value)?;
                if !(radius.is_finite() && radius > 0.0) {
                    return Err(Error::Config(format!("Radius must be positive: {}", value)));
                }
                self.defaults.radius = radius;
            }
            ["defaults", "vehicle"] => {
                LotType::from_str(value).map_err(Error::Config)?;
                self.defaults.vehicle = value.to_string();
            }
            ["defaults", "vehicle_height"] => self.defaults.vehicle_height = parse(key, value)?,
            ["defaults", "format"] => self.defaults.format = value.to_string(),
            ["defaults", "nearest"] => self.defaults.nearest = parse(key, value)?,

            ["providers", "mock"] => self.providers.mock = parse(key, value)?,
            ["providers", "timeout_ms"] => self.providers.timeout_ms = parse(key, value)?,
            ["providers", "retry_attempts"] => self.providers.retry_attempts = parse(key, value)?,
            ["providers", "live_availability"] => {
                self.providers.live_availability = parse(key, value)?;
            }
            ["providers", "route_concurrency"] => {
                self.providers.route_concurrency = parse(key, value)?;
            }

            ["data", "carparks_csv"] => self.data.carparks_csv = value.to_string(),
            ["data", "rates_csv"] => self.data.rates_csv = value.to_string(),

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse(key, value)?,

            ["url", "default"] => self.url.default = value.to_string(),

            ["api_keys", "onemap_email"] => self.api_keys.onemap_email = value.to_string(),
            ["api_keys", "onemap_password"] => self.api_keys.onemap_password = value.to_string(),
            ["api_keys", "datagov"] => self.api_keys.datagov = value.to_string(),

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "defaults.radius",
            "defaults.vehicle",
            "defaults.vehicle_height",
            "defaults.format",
            "defaults.nearest",
            "providers.mock",
            "providers.timeout_ms",
            "providers.retry_attempts",
            "providers.live_availability",
            "providers.route_concurrency",
            "data.carparks_csv",
            "data.rates_csv",
            "server.host",
            "server.port",
            "url.default",
            "api_keys.onemap_email",
            "api_keys.onemap_password",
            "api_keys.datagov",
        ]
    }

    /// The default vehicle described by `[defaults]`
    pub fn default_vehicle(&self) -> Result<Vehicle> {
        let lot_type = LotType::from_str(&self.defaults.vehicle).map_err(Error::Config)?;
        Ok(Vehicle::new(lot_type, self.defaults.vehicle_height))
    }

    /// Format a URL using the specified provider
    ///
    /// Replaces {lat} and {lng} placeholders with actual values
    pub fn format_url(&self, provider: Option<&str>, lat: f64, lng: f64) -> Result<String> {
        let provider_name = provider.unwrap_or(&self.url.default);

        let template = self.url.providers.get(provider_name).ok_or_else(|| {
            Error::Config(format!("Unknown URL provider: {}", provider_name))
        })?;

        Ok(template
            .replace("{lat}", &lat.to_string())
            .replace("{lng}", &lng.to_string()))
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
