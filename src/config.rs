use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub airtable: AirtableSettings,
    pub tables: TableSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirtableSettings {
    #[serde(default = "default_airtable_endpoint")]
    pub endpoint: String,
    pub api_key: String,
    pub base_id: String,
}

fn default_airtable_endpoint() -> String {
    "https://api.airtable.com/v0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSettings {
    pub buyers: String,
    pub properties: String,
    pub matches: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,
    /// Geocoding is disabled when no token is configured
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_geocoding_endpoint(),
            access_token: None,
        }
    }
}

fn default_geocoding_endpoint() -> String {
    "https://api.mapbox.com/geocoding/v5/mapbox.places".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: Option<u64>,
    pub capacity: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchingSettings {
    pub default_min_score: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with HARBOR_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with HARBOR_)
            // e.g., HARBOR_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("HARBOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_secret_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("HARBOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Secrets are usually provided as bare environment variables rather than
/// through the HARBOR_ tree; fold them in when present.
fn apply_secret_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let airtable_api_key = env::var("AIRTABLE_API_KEY")
        .or_else(|_| env::var("HARBOR_AIRTABLE__API_KEY"))
        .ok();
    let airtable_base_id = env::var("AIRTABLE_BASE_ID")
        .or_else(|_| env::var("HARBOR_AIRTABLE__BASE_ID"))
        .ok();
    let mapbox_token = env::var("MAPBOX_ACCESS_TOKEN")
        .or_else(|_| env::var("HARBOR_GEOCODING__ACCESS_TOKEN"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(api_key) = airtable_api_key {
        builder = builder.set_override("airtable.api_key", api_key)?;
    }
    if let Some(base_id) = airtable_base_id {
        builder = builder.set_override("airtable.base_id", base_id)?;
    }
    if let Some(token) = mapbox_token {
        builder = builder.set_override("geocoding.access_token", token)?;
    }

    builder.build()
}
