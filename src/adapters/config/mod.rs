use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::adapters::llm::providers::google::DEFAULT_MODEL;

/// Bump this when adding new fields with non-trivial defaults.
/// When a loaded config has a lower version, it is re-saved to disk
/// so that users see the new keys in their `config.toml`.
const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Settings {
    pub config_version: u32,
    pub google_api_key: Option<String>,
    pub chat_model: Option<String>,
    /// Directory holding the conversation database. Defaults to
    /// `~/.vita`.
    pub data_dir: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: 0,
            google_api_key: None,
            chat_model: Some(DEFAULT_MODEL.to_string()),
            data_dir: None,
        }
    }
}

impl Settings {
    fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vita")
    }

    fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    pub fn load_global() -> Self {
        let path = Self::global_config_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path).unwrap_or_default();
            let mut settings: Self = match toml::from_str(&content) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("failed to parse {}: {e}; using defaults", path.display());
                    Self::default()
                }
            };

            // Re-save when config is from an older version so new fields
            // (with their defaults) appear in the file on disk.
            if settings.config_version < CURRENT_CONFIG_VERSION {
                settings.config_version = CURRENT_CONFIG_VERSION;
                if let Err(e) = settings.save() {
                    log::warn!("failed to migrate config to v{CURRENT_CONFIG_VERSION}: {e}");
                }
            }

            settings
        } else {
            Self {
                config_version: CURRENT_CONFIG_VERSION,
                ..Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let global_dir = Self::global_config_dir();
        std::fs::create_dir_all(&global_dir)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::global_config_path(), &content)?;
        Ok(())
    }

    /// The environment variable wins over the stored key.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                self.google_api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(ToOwned::to_owned)
            })
    }

    pub fn chat_model(&self) -> String {
        self.chat_model
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string()
    }

    pub fn data_dir(&self) -> PathBuf {
        match self.data_dir.as_deref().map(str::trim) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => Self::global_config_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.chat_model(), DEFAULT_MODEL);
        assert!(settings.google_api_key.is_none());
    }

    #[test]
    fn blank_stored_values_fall_back() {
        let settings: Settings = toml::from_str("chat_model = \"  \"").unwrap();
        assert_eq!(settings.chat_model(), DEFAULT_MODEL);
    }
}
