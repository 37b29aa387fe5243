//! Configuration for tubepost.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (loaded from `.env` when present)
//! 2. Config file (.tubepost/config.yaml)
//! 3. Defaults (~/.tubepost)
//!
//! Config file discovery:
//! - Searches the current directory and its parents for .tubepost/config.yaml
//! - Paths in the config file are relative to the project root (the parent
//!   of `.tubepost/`)
//!
//! Configuration is loaded once at startup and passed down explicitly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::SummarizerSettings;
use crate::catalog::{CatalogSettings, MAX_PAGE_SIZE};

/// Default courtesy delay between catalog pages
const DEFAULT_PAGE_DELAY_MS: u64 = 100;

/// Default per-request timeout for all HTTP collaborators
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Channel registry; seeds the store on discovery
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
    #[serde(default)]
    pub http: Option<HttpConfig>,
    #[serde(default)]
    pub summarizer: Option<SummarizerSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .tubepost/)
    pub home: Option<String>,
    /// Database file (relative to the project root)
    pub database: Option<String>,
}

/// A channel to discover, and the handle its posts go out under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub handle: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub page_size: Option<u32>,
    pub page_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
}

/// API credentials, all optional at load time
///
/// A missing credential is reported by the component that needs it.
#[derive(Clone, Default)]
pub struct Credentials {
    pub youtube_api_key: Option<String>,
    pub supadata_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub x_bearer_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "set" } else { "missing" };
        f.debug_struct("Credentials")
            .field("youtube_api_key", &mask(&self.youtube_api_key))
            .field("supadata_api_key", &mask(&self.supadata_api_key))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("x_bearer_token", &mask(&self.x_bearer_token))
            .finish()
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Registered channels from the config file
    pub channels: Vec<ChannelConfig>,
    /// Catalog enumeration settings
    pub catalog: CatalogSettings,
    /// Request timeout for HTTP collaborators
    pub http_timeout: Duration,
    /// Post generation settings
    pub summarizer: SummarizerSettings,
    /// API credentials
    pub credentials: Credentials,
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(".tubepost").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to a base directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Parse an optional numeric environment variable
fn parse_env<T>(env: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env(name)
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {}", name))
}

/// Build the resolved configuration from an optional config file and an
/// environment lookup
fn load_config_from(
    config_file: Option<PathBuf>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".tubepost");

    let parsed = config_file.as_deref().map(load_config_file).transpose()?;

    // .tubepost/ and its parent, the project root
    let config_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    let project_root = config_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(env_home) = env("TUBEPOST_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = parsed.as_ref().and_then(|c| c.paths.home.as_deref()) {
        resolve_path(config_dir, home_path)
    } else {
        default_home
    };

    let database = if let Some(env_db) = env("DATABASE_PATH") {
        PathBuf::from(env_db)
    } else if let Some(db_path) = parsed.as_ref().and_then(|c| c.paths.database.as_deref()) {
        resolve_path(project_root, db_path)
    } else {
        home.join("tubepost.db")
    };

    let catalog_config = parsed.as_ref().and_then(|c| c.catalog.clone());
    let catalog = CatalogSettings {
        page_size: catalog_config
            .as_ref()
            .and_then(|c| c.page_size)
            .unwrap_or(MAX_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE),
        page_delay: Duration::from_millis(
            catalog_config
                .as_ref()
                .and_then(|c| c.page_delay_ms)
                .unwrap_or(DEFAULT_PAGE_DELAY_MS),
        ),
    };

    let http_timeout = Duration::from_secs(
        parsed
            .as_ref()
            .and_then(|c| c.http.as_ref())
            .and_then(|h| h.timeout_seconds)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
    );

    let mut summarizer = parsed
        .as_ref()
        .and_then(|c| c.summarizer.clone())
        .unwrap_or_default();
    if let Some(model) = env("OPENAI_MODEL") {
        summarizer.model = model;
    }
    if let Some(temperature) = parse_env::<f32>(env, "OPENAI_TEMPERATURE")? {
        summarizer.temperature = temperature;
    }
    if let Some(max_tokens) = parse_env::<u32>(env, "OPENAI_MAX_TOKENS")? {
        summarizer.max_tokens = max_tokens;
    }

    let credentials = Credentials {
        youtube_api_key: env("YOUTUBE_API_KEY"),
        supadata_api_key: env("SUPADATA_API_KEY"),
        openai_api_key: env("OPENAI_API_KEY"),
        x_bearer_token: env("X_BEARER_TOKEN"),
    };

    Ok(ResolvedConfig {
        home,
        database,
        config_file,
        channels: parsed.map(|c| c.channels).unwrap_or_default(),
        catalog,
        http_timeout,
        summarizer,
        credentials,
    })
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    load_config_from(find_config_file(&cwd), &env)
}
