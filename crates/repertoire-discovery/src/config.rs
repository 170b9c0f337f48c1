use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Hard ceiling on works collected from any single catalog query.
pub const MAX_COLLECTION_CAP: usize = 1000;

/// Configuration for repertoire.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (REPERTOIRE_* prefix)
/// 3. Config file (~/.config/repertoire/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database.
    ///
    /// Can be set via:
    /// - CLI: --db /path/to/db
    /// - ENV: REPERTOIRE_DATABASE_PATH
    /// - Config: database_path = "/path/to/db"
    /// - Default: ~/.local/share/repertoire/repertoire.db
    pub database_path: PathBuf,

    /// Base URL of the MusicBrainz web service.
    pub musicbrainz_url: String,

    /// Base URL of the Wikipedia REST API.
    pub wikipedia_url: String,

    /// Base URL of Wikidata (used to resolve sitelinks).
    pub wikidata_url: String,

    /// Chat-completions endpoint used for PRO repertoire extraction.
    pub extraction_api_url: String,

    /// API key for the extraction endpoint.
    ///
    /// Can be set via:
    /// - ENV: REPERTOIRE_EXTRACTION_API_KEY
    /// - Config: extraction_api_key = "..."
    pub extraction_api_key: Option<String>,

    /// Model name passed to the extraction endpoint.
    pub extraction_model: String,

    /// Endpoint of the internal verification agent. Disabled when unset.
    pub verification_url: Option<String>,

    /// Shared secret sent to the verification agent.
    pub verification_secret: Option<String>,

    /// Number of works kept when a request does not specify `max_songs`.
    pub default_max_songs: u32,

    /// Maximum works collected per catalog query (clamped to 1000).
    pub collection_cap: usize,

    /// Pause between consecutive per-work enrichments, in milliseconds.
    pub enrichment_delay_ms: u64,

    /// Timeout applied to every outbound HTTP call, in seconds.
    pub http_timeout_secs: u64,

    /// User-Agent sent to public catalogs.
    pub user_agent: String,

    /// Log level: trace, debug, info, warn or error.
    pub log_level: String,

    /// Whether log output is coloured.
    pub log_coloured: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
            musicbrainz_url: "https://musicbrainz.org/ws/2".to_string(),
            wikipedia_url: "https://en.wikipedia.org/api/rest_v1".to_string(),
            wikidata_url: "https://www.wikidata.org".to_string(),
            extraction_api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            extraction_api_key: None,
            extraction_model: "gpt-4o-mini".to_string(),
            verification_url: None,
            verification_secret: None,
            default_max_songs: 50,
            collection_cap: 200,
            enrichment_delay_ms: 300,
            http_timeout_secs: 10,
            user_agent: "repertoire/0.1.0 (https://github.com/oxur/repertoire)".to_string(),
            log_level: "info".to_string(),
            log_coloured: true,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/repertoire/config.toml
    /// Reads environment variables with REPERTOIRE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("repertoire");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with custom database path.
    ///
    /// This is used when the --db CLI flag is provided.
    pub fn load_with_db_path(db_path: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.database_path = db_path;
        Ok(config)
    }

    /// Per-call HTTP timeout.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    /// Pause between consecutive enrichments.
    #[must_use]
    pub fn enrichment_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_delay_ms)
    }

    /// Collection cap clamped to `1..=MAX_COLLECTION_CAP`.
    #[must_use]
    pub fn effective_collection_cap(&self) -> usize {
        self.collection_cap.clamp(1, MAX_COLLECTION_CAP)
    }
}

/// Get the default database path.
///
/// Returns: ~/.local/share/repertoire/repertoire.db (or platform equivalent)
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repertoire")
        .join("repertoire.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/repertoire/config.toml
/// - macOS: ~/Library/Application Support/repertoire/config.toml
/// - Windows: %APPDATA%\repertoire\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("repertoire")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Repertoire Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (REPERTOIRE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# API key for the chat-completions endpoint that extracts PRO repertoire
# (ASCAP, BMI, SESAC). Without it, PRO sources report as failed and
# discovery continues with the catalog alone.
#
# Can also be set via:
# - Environment: REPERTOIRE_EXTRACTION_API_KEY=your-key-here
extraction_api_key = "your-extraction-api-key-here"
#extraction_api_url = "https://api.openai.com/v1/chat/completions"
#extraction_model = "gpt-4o-mini"

# Internal verification agent, consulted when no PRO reports a work
#verification_url = "https://verify.internal.example/verify"
#verification_secret = "shared-secret"

# Discovery tuning
#default_max_songs = 50
#collection_cap = 200          # clamped to 1000
#enrichment_delay_ms = 300     # pause between per-work lookups
#http_timeout_secs = 10

# Public catalogs
#musicbrainz_url = "https://musicbrainz.org/ws/2"
#wikipedia_url = "https://en.wikipedia.org/api/rest_v1"
#wikidata_url = "https://www.wikidata.org"

# Logging
#log_level = "info"
#log_coloured = true

# Path to the SQLite database
#
# Can also be set via:
# - CLI: repertoire --db /custom/path.db discover "Jane Doe"
# - Environment: REPERTOIRE_DATABASE_PATH=/custom/path.db
#
# Default: Platform-specific data directory
#database_path = "/path/to/custom/repertoire.db"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
