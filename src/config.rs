//! Service configuration.
//!
//! A [`Config`] is built once at startup from compiled defaults, an
//! optional TOML file and finally environment variables / CLI flags
//! ([`Overrides`]). It is immutable afterwards and passed explicitly to
//! the components that need it.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{LookupFormat, DEFAULT_FINGERPRINT_PREFIX};

/// Database path that selects an in-memory SQLite database.
pub const IN_MEMORY_DATABASE: &str = ":memory:";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,
    /// WebFinger authority
    pub webfinger: WebFingerConfig,
    /// Key lookup behavior
    pub keyserver: KeyserverConfig,
    /// Key database
    pub storage: StorageConfig,
    /// Write endpoint authentication
    pub api: ApiConfig,
    /// Logging
    pub log: LogConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub listen_addr: String,
    /// Port to bind
    pub listen_port: u16,
}

/// `[webfinger]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebFingerConfig {
    /// Domain this server is authoritative for
    pub domain: String,
    /// Issuer URL returned for every account
    pub resource: String,
}

/// `[keyserver]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyserverConfig {
    /// Prefix stripped from search tokens before fingerprint matching
    pub fingerprint_prefix: String,
    /// Response format for `/pks/lookup`
    pub lookup_format: LookupFormat,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:`
    pub database: PathBuf,
}

/// `[api]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Tokens accepted by the write endpoint
    pub api_keys: Vec<String>,
}

/// `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 5000,
        }
    }
}

impl Default for WebFingerConfig {
    fn default() -> Self {
        Self {
            domain: "example.com".to_string(),
            resource: "https://auth.example.com".to_string(),
        }
    }
}

impl Default for KeyserverConfig {
    fn default() -> Self {
        Self {
            fingerprint_prefix: DEFAULT_FINGERPRINT_PREFIX.to_string(),
            lookup_format: LookupFormat::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("domain_hq.db"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Settings taken from the command line or `DOMAIN_HQ_*` environment
/// variables. Anything set here wins over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Address to bind
    #[arg(long, env = "DOMAIN_HQ_LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Port to bind
    #[arg(long, env = "DOMAIN_HQ_LISTEN_PORT")]
    pub listen_port: Option<u16>,

    /// Domain this server is authoritative for
    #[arg(long, env = "DOMAIN_HQ_WEB_FINGER_DOMAIN")]
    pub webfinger_domain: Option<String>,

    /// Issuer URL returned by WebFinger
    #[arg(long, env = "DOMAIN_HQ_WEB_FINGER_RESOURCE")]
    pub webfinger_resource: Option<String>,

    /// Prefix stripped from fingerprint searches
    #[arg(long, env = "DOMAIN_HQ_FINGERPRINT_PREFIX")]
    pub fingerprint_prefix: Option<String>,

    /// Lookup response format (armored or json)
    #[arg(long, env = "DOMAIN_HQ_LOOKUP_FORMAT")]
    pub lookup_format: Option<LookupFormat>,

    /// SQLite database path (":memory:" for an in-memory database)
    #[arg(long, env = "DOMAIN_HQ_DATABASE")]
    pub database: Option<PathBuf>,

    /// Comma-separated tokens accepted by /pks/add
    #[arg(long, env = "DOMAIN_HQ_API_KEYS", value_delimiter = ',')]
    pub api_keys: Vec<String>,

    /// Log level
    #[arg(long, env = "DOMAIN_HQ_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format (pretty or json)
    #[arg(long, env = "DOMAIN_HQ_LOG_MODE")]
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Build the configuration: defaults, then `file` if it exists, then
    /// `overrides`.
    ///
    /// A missing file is not an error; a file that does not parse is.
    pub fn load(file: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut config = match file {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        config.apply(overrides);
        Ok(config)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides on top of the current values.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(addr) = &overrides.listen_addr {
            self.server.listen_addr = addr.clone();
        }
        if let Some(port) = overrides.listen_port {
            self.server.listen_port = port;
        }
        if let Some(domain) = &overrides.webfinger_domain {
            self.webfinger.domain = domain.clone();
        }
        if let Some(resource) = &overrides.webfinger_resource {
            self.webfinger.resource = resource.clone();
        }
        if let Some(prefix) = &overrides.fingerprint_prefix {
            self.keyserver.fingerprint_prefix = prefix.clone();
        }
        if let Some(format) = overrides.lookup_format {
            self.keyserver.lookup_format = format;
        }
        if let Some(database) = &overrides.database {
            self.storage.database = database.clone();
        }
        if !overrides.api_keys.is_empty() {
            self.api.api_keys = overrides.api_keys.clone();
        }
        if let Some(level) = &overrides.log_level {
            self.log.level = level.clone();
        }
        if let Some(format) = overrides.log_format {
            self.log.format = format;
        }
    }

    /// Generate a random API key when none is configured.
    ///
    /// Returns the generated key so the caller can report it.
    pub fn ensure_api_key(&mut self) -> Option<String> {
        if !self.api.api_keys.is_empty() {
            return None;
        }
        let key = uuid::Uuid::new_v4().to_string();
        self.api.api_keys.push(key.clone());
        Some(key)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.webfinger.domain.trim().is_empty() {
            return Err(Error::Config("webfinger domain must not be empty".to_string()));
        }
        if self.webfinger.resource.trim().is_empty() {
            return Err(Error::Config("webfinger resource must not be empty".to_string()));
        }
        if self.api.api_keys.is_empty() {
            return Err(Error::Config("at least one API key is required".to_string()));
        }
        if self.api.api_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::Config("API keys must not be empty".to_string()));
        }
        if !LOG_LEVELS.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(Error::Config(format!(
                "invalid log level '{}'",
                self.log.level
            )));
        }
        self.listen_socket_addr()?;
        Ok(())
    }

    /// The socket address to bind.
    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.listen_addr, self.server.listen_port)
            .parse()
            .map_err(|e| {
                Error::Config(format!(
                    "invalid listen address '{}': {}",
                    self.server.listen_addr, e
                ))
            })
    }

    /// Whether storage should be an in-memory database.
    pub fn in_memory_storage(&self) -> bool {
        self.storage.database.as_os_str() == IN_MEMORY_DATABASE
    }
}
