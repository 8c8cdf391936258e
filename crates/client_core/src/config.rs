use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
pub const CONFIG_FILE: &str = "docqa.toml";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base url '{raw}': {reason}")]
    InvalidBaseUrl { raw: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: Url,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url is valid"),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.base_url = normalize_base_url(raw)?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    base_url: Option<String>,
}

pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then `path` if it exists, then `DOCQA_BASE_URL`, then
/// `APP__BASE_URL`. Later layers win.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileConfig>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.base_url {
                    settings.base_url = normalize_base_url(&v)?;
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config: ignoring unreadable file");
            }
        }
    }

    if let Some(v) = env("DOCQA_BASE_URL") {
        settings.base_url = normalize_base_url(&v)?;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = normalize_base_url(&v)?;
    }

    Ok(settings)
}

/// Accepts `host:port`, `http://host:port` or a URL with a path prefix and
/// returns an http(s) URL whose path ends in `/`, ready for `Url::join`.
pub fn normalize_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(ClientSettings::default().base_url);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&candidate).map_err(|err| ConfigError::InvalidBaseUrl {
        raw: raw.to_string(),
        reason: err.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidBaseUrl {
            raw: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
