//! Layered configuration.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use picvault_cache::TagCacheConfig;
use picvault_error::{ConfigError, PicvaultError, PicvaultResult};
use picvault_thumbnail::ThumbnailConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../picvault.toml");

/// Blob storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per bucket
    #[serde(default = "default_root")]
    root: PathBuf,

    /// URL prefix under which `root` is served
    #[serde(default = "default_public_base_url")]
    public_base_url: String,

    /// Secret for presigned URL signatures
    #[serde(default)]
    signing_secret: String,

    /// Shared bucket for derived thumbnails
    #[serde(default = "default_thumbnail_bucket")]
    thumbnail_bucket: String,

    /// Lifetime of presigned URLs (seconds)
    #[serde(default = "default_url_ttl_secs")]
    url_ttl_secs: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from("./picvault-data")
}

fn default_public_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_thumbnail_bucket() -> String {
    crate::DEFAULT_THUMBNAIL_BUCKET.to_string()
}

fn default_url_ttl_secs() -> u64 {
    crate::DEFAULT_URL_TTL.as_secs()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            public_base_url: default_public_base_url(),
            signing_secret: String::new(),
            thumbnail_bucket: default_thumbnail_bucket(),
            url_ttl_secs: default_url_ttl_secs(),
        }
    }
}

/// Metadata database settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct DatabaseConfig {
    /// Connection string; `DATABASE_URL` is used when unset
    #[serde(default)]
    url: Option<String>,

    /// Pool size
    #[serde(default = "default_max_connections")]
    max_connections: u32,
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Complete picvault configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Getters)]
pub struct PicvaultConfig {
    #[serde(default)]
    storage: StorageConfig,

    #[serde(default)]
    thumbnail: ThumbnailConfig,

    #[serde(default)]
    database: DatabaseConfig,

    #[serde(default)]
    cache: TagCacheConfig,
}

fn build_error(e: config::ConfigError) -> PicvaultError {
    ConfigError::new(format!("Failed to build configuration: {}", e)).into()
}

fn parse_error(e: config::ConfigError) -> PicvaultError {
    ConfigError::new(format!("Failed to parse configuration: {}", e)).into()
}

impl PicvaultConfig {
    /// Load configuration with precedence: environment > current dir > home dir > bundled defaults.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (picvault.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/picvault/picvault.toml)
    /// 3. User config in current directory (./picvault.toml)
    /// 4. `PICVAULT__SECTION__KEY` environment variables
    ///
    /// `database.url` falls back to `DATABASE_URL` when no source sets it.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use picvault::PicvaultConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = PicvaultConfig::load()?;
    /// println!("{}", config.storage().thumbnail_bucket());
    /// # Ok(())
    /// # }
    /// ```
    #[instrument]
    pub fn load() -> PicvaultResult<Self> {
        debug!("Loading configuration");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("picvault/picvault.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("picvault").required(false))
            .add_source(
                Environment::with_prefix("PICVAULT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)?;
        Ok(config.with_env_database_url())
    }

    /// Load configuration from a specific file, on top of the bundled defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> PicvaultResult<Self> {
        debug!("Loading configuration from file");

        let config: Self = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                PicvaultError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(parse_error)?;
        Ok(config.with_env_database_url())
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(toml: &str) -> PicvaultResult<Self> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)
    }

    /// Database URL, required by the PostgreSQL backend.
    pub fn require_database_url(&self) -> PicvaultResult<&str> {
        self.database.url.as_deref().ok_or_else(|| {
            ConfigError::new("database.url is not set and DATABASE_URL is empty").into()
        })
    }

    fn with_env_database_url(mut self) -> Self {
        if self.database.url.is_none() {
            self.database.url = std::env::var("DATABASE_URL").ok();
        }
        self
    }
}
