use std::{fs, path::Path};

use serde::Deserialize;
use shared::protocol::PROCESS_IMAGE_PATH;
use thiserror::Error;
use url::Url;

pub const SETTINGS_FILE: &str = "card_studio.toml";
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint_url: String,
    /// `None` leaves the wait bounded only by the transport.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.into(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    endpoint_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl ClientSettings {
    /// Full url of the processing endpoint. The configured base may carry a path prefix.
    pub fn process_image_url(&self) -> Result<Url, SettingsError> {
        let invalid = |reason: String| SettingsError::InvalidEndpoint {
            url: self.endpoint_url.clone(),
            reason,
        };

        let mut base = Url::parse(self.endpoint_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(PROCESS_IMAGE_PATH)
            .map_err(|err| invalid(err.to_string()))
    }

    pub fn with_endpoint_override(mut self, endpoint_url: Option<String>) -> Self {
        if let Some(url) = endpoint_url.filter(|url| !url.trim().is_empty()) {
            self.endpoint_url = url;
        }
        self
    }
}

/// Defaults, then `card_studio.toml` in the working directory, then the environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

pub fn load_settings_from(
    file: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        match toml::from_str::<SettingsFile>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.endpoint_url {
                    settings.endpoint_url = v;
                }
                if let Some(v) = file_cfg.request_timeout_secs {
                    settings.request_timeout_secs = Some(v);
                }
            }
            Err(err) => {
                tracing::warn!(file = %file.display(), "ignoring unreadable settings file: {err}");
            }
        }
    }

    if let Some(v) = env("CARD_STUDIO_ENDPOINT") {
        settings.endpoint_url = v;
    }
    if let Some(v) = env("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
