use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{defaults, endpoints, paths, prompts};
use crate::error::ChatbotError;
use crate::transport::{HttpAnswerService, TransportAdapter};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub transport: TransportSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub typing: TypingSettings,
    #[serde(default)]
    pub view: ViewSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    pub url: String,
    /// Appended to every question before it is sent.
    pub context_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Process requests one at a time so answers come back in submission order.
    pub serialize_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingSettings {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub persist_history: bool,
    pub theme: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            url: endpoints::ANSWER_URL.to_string(),
            context_suffix: prompts::CONTEXT_SUFFIX.to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            serialize_requests: defaults::SERIALIZE_REQUESTS,
        }
    }
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            interval_ms: defaults::TYPING_INTERVAL_MS,
        }
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            persist_history: defaults::PERSIST_HISTORY,
            theme: defaults::THEME.to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transport: TransportSettings::default(),
            session: SessionSettings::default(),
            typing: TypingSettings::default(),
            view: ViewSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Directory for view state and logs.
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(content) = std::fs::read_to_string(path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring malformed config {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), ChatbotError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ChatbotError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ChatbotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing.interval_ms)
    }

    /// Build the transport adapter for the configured endpoint.
    pub fn build_transport(&self) -> TransportAdapter {
        TransportAdapter::new(Box::new(HttpAnswerService::new(&self.transport.url)))
            .with_context_suffix(self.transport.context_suffix.clone())
    }
}
