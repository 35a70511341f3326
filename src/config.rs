//! Configuration management

use std::path::Path;

use anyhow::{self, Context, Result};
use serde::Deserialize;

/// Environment variable that overrides `MISC.API_KEY`
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable selecting the geocoder implementation
pub const GEOCODER_BACKEND_ENV: &str = "GEOCODER_BACKEND";

/// Schema-qualified table and the column holding the address key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
    pub key_column: String,
}

impl TableRef {
    pub fn new(schema: &str, table: &str, key_column: &str) -> Result<Self> {
        Ok(Self {
            schema: validate_identifier("schema", schema)?,
            table: validate_identifier("table", table)?,
            key_column: validate_identifier("key column", key_column)?,
        })
    }

    /// `schema.table`, safe to interpolate into SQL text
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// Where one side of the pipeline lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseEndpoint {
    pub server: String,
    pub database: String,
    pub table: TableRef,
}

/// Which geocoder to build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeocoderBackend {
    #[default]
    Google,
    Mock,
}

/// Application configuration, built once at startup and shared read-only
#[derive(Debug, Clone)]
pub struct Config {
    pub source: DatabaseEndpoint,
    pub target: DatabaseEndpoint,

    /// Geocoding API key (`GOOGLE_API_KEY` wins over the file)
    pub api_key: String,

    /// Geocoding endpoint prefix, e.g. `https://maps.googleapis.com/maps/api/geocode/json?`
    pub api_url: String,

    /// Size of the worker pool
    pub max_workers: usize,

    /// Maximum number of source rows fetched per run
    pub batch_size: usize,

    pub geocoder_backend: GeocoderBackend,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "DATABASE_SERVER")]
    database_server: RawDatabaseSection,
    #[serde(rename = "MISC")]
    misc: RawMiscSection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct RawDatabaseSection {
    targetserver: String,
    targetdatabase: String,
    sourceserver: String,
    sourcedatabase: String,
    sourceschema: String,
    sourcetable: String,
    sourcetablekey: String,
    targetschema: String,
    targettable: String,
    targettablekey: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
struct RawMiscSection {
    api_key: String,
    api_url: String,
    number_of_threads: RawNumber,
    number_of_addresses: RawNumber,
}

/// Numbers may be written bare or quoted (INI-style files keep every value as text)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Text(String),
}

impl RawNumber {
    fn positive(&self, key: &str) -> Result<usize> {
        let value = match self {
            RawNumber::Int(v) => *v,
            RawNumber::Text(s) => s
                .trim()
                .parse::<i64>()
                .with_context(|| format!("MISC.{} must be an integer, got '{}'", key, s))?,
        };

        if value <= 0 {
            anyhow::bail!("MISC.{} must be a positive integer (current: {})", key, value);
        }

        usize::try_from(value).with_context(|| format!("MISC.{} is out of range", key))
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;

        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        Ok(config.with_overrides(
            std::env::var(API_KEY_ENV).ok(),
            std::env::var(GEOCODER_BACKEND_ENV).ok(),
        ))
    }

    /// Parse the `[DATABASE_SERVER]` and `[MISC]` sections
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(contents).context("Failed to parse configuration")?;
        let db = raw.database_server;
        let misc = raw.misc;

        let source = DatabaseEndpoint {
            server: db.sourceserver,
            database: db.sourcedatabase,
            table: TableRef::new(&db.sourceschema, &db.sourcetable, &db.sourcetablekey)
                .context("Invalid source table settings")?,
        };
        let target = DatabaseEndpoint {
            server: db.targetserver,
            database: db.targetdatabase,
            table: TableRef::new(&db.targetschema, &db.targettable, &db.targettablekey)
                .context("Invalid target table settings")?,
        };

        Ok(Self {
            source,
            target,
            api_key: misc.api_key,
            api_url: misc.api_url,
            max_workers: misc.number_of_threads.positive("NUMBER_OF_THREADS")?,
            batch_size: misc.number_of_addresses.positive("NUMBER_OF_ADDRESSES")?,
            geocoder_backend: GeocoderBackend::default(),
        })
    }

    /// Apply values taken from the environment
    pub fn with_overrides(mut self, api_key: Option<String>, backend: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            self.api_key = key;
        }

        if let Some(backend) = backend {
            self.geocoder_backend = match backend.to_ascii_lowercase().as_str() {
                "google" => GeocoderBackend::Google,
                "mock" => GeocoderBackend::Mock,
                other => {
                    tracing::warn!("Unknown {} '{}', using google", GEOCODER_BACKEND_ENV, other);
                    GeocoderBackend::Google
                }
            };
        }

        self
    }
}

/// Schema, table and column names are interpolated into SQL, so only plain identifiers pass
fn validate_identifier(kind: &str, name: &str) -> Result<String> {
    let name = name.trim();
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid {
        anyhow::bail!("{} name '{}' is not a plain SQL identifier", kind, name);
    }
    Ok(name.to_string())
}
