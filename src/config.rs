//! Process-wide configuration, read once at startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::AppError;

const CONFIG_FILE_NAME: &str = "lookalike.toml";
const BACKEND_URL_ENV: &str = "LOOKALIKE_BACKEND_URL";
const LEGACY_BACKEND_URL_ENV: &str = "VITE_BACKEND_URL";
const API_KEY_ENV: &str = "OPENAI_API_KEY";
const PROVIDER_ENV: &str = "LOOKALIKE_EMBEDDING_PROVIDER";

pub const DEFAULT_EMBEDDINGS_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Remote,
    Local,
}

impl std::str::FromStr for ProviderKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            _ => Err(AppError::Config(format!("unknown embedding provider: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub worker_dimensions: Option<usize>,
    pub worker_program: String,
    pub worker_args: Vec<String>,
    pub worker_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Remote,
            api_key: None,
            endpoint: DEFAULT_EMBEDDINGS_ENDPOINT.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: Some(DEFAULT_EMBEDDING_DIMENSIONS),
            worker_dimensions: None,
            worker_program: "python".to_string(),
            worker_args: vec!["generate_embed.py".to_string()],
            worker_timeout_secs: 60,
        }
    }
}

impl EmbeddingConfig {
    pub fn api_key(&self) -> Result<&str, AppError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "embedding API key is not configured (set {API_KEY_ENV} or embedding.api_key)"
                ))
            })
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend_url: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub embedding: EmbeddingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            log_level: "info".to_string(),
            request_timeout_secs: 30,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };
        let mut config = match path {
            Some(p) if p.exists() => Self::load_from(&p)?,
            Some(p) => {
                debug!("No config at {}, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        info!("Loading config from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| AppError::Config(format!("invalid config {}: {e}", path.display())))
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(BACKEND_URL_ENV).or_else(|| non_empty(LEGACY_BACKEND_URL_ENV)) {
            self.backend_url = Some(url);
        }
        if let Some(key) = non_empty(API_KEY_ENV) {
            self.embedding.api_key = Some(key);
        }
        if let Some(provider) = non_empty(PROVIDER_ENV) {
            self.embedding.provider = provider.parse()?;
        }
        Ok(())
    }

    /// Backend base URL without a trailing slash.
    pub fn backend_url(&self) -> Result<&str, AppError> {
        self.backend_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "backend URL is not configured (set {BACKEND_URL_ENV} or backend_url)"
                ))
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "lookalike")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
