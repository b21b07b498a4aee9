use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string(), "de".to_string()]
}

fn default_items() -> Vec<String> {
    // Item keys for the grid; display text comes from the server's
    // translation catalog
    [
        "forest", "ocean", "mountain", "city", "desert", "river", "glacier",
        "meadow", "island", "volcano", "cave", "reef",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_idle_timeout_secs() -> u64 {
    45
}

fn default_launch_secs() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KioskConfig {
    /// Base URL of the vote server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Keys of the votable items shown in the grid
    #[serde(default = "default_items")]
    pub items: Vec<String>,

    /// Languages offered on the kiosk; clouds are precomputed for all of them
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// Language active at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,

    /// Seconds the result screen stays up before auto-returning
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Seconds the launch animation plays after submit
    #[serde(default = "default_launch_secs")]
    pub launch_secs: u64,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            items: default_items(),
            languages: default_languages(),
            default_language: None,
            idle_timeout_secs: default_idle_timeout_secs(),
            launch_secs: default_launch_secs(),
        }
    }
}

impl KioskConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("kumo");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(KioskConfig::default()),
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = KioskConfig::default();
        let _ = config.save();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Drop empty item keys and duplicate languages before writing
        let mut clean = self.clone();
        clean.items.retain(|k| !k.trim().is_empty());
        let mut seen = std::collections::HashSet::new();
        clean.languages.retain(|l| seen.insert(l.clone()));

        let content = toml::to_string_pretty(&clean)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Language the kiosk starts in
    pub fn startup_language(&self) -> String {
        self.default_language
            .clone()
            .or_else(|| self.languages.first().cloned())
            .unwrap_or_else(|| "en".to_string())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn launch_duration(&self) -> Duration {
        Duration::from_secs(self.launch_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = KioskConfig {
            server_url: "http://kiosk.local:5000".to_string(),
            items: vec!["forest".to_string(), "ocean".to_string()],
            languages: vec!["en".to_string(), "fr".to_string()],
            default_language: Some("fr".to_string()),
            idle_timeout_secs: 30,
            launch_secs: 2,
        };

        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: KioskConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config.items, deserialized.items);
        assert_eq!(config.default_language, deserialized.default_language);
        assert_eq!(config.idle_timeout_secs, deserialized.idle_timeout_secs);
    }

    #[test]
    fn startup_language_falls_back_to_first_configured() {
        let mut config = KioskConfig::default();
        config.default_language = None;
        assert_eq!(config.startup_language(), "en");

        config.default_language = Some("de".to_string());
        assert_eq!(config.startup_language(), "de");
    }

    #[test]
    fn empty_config_gets_defaults() {
        let config: KioskConfig = toml::from_str("").unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.items.len(), 12);
        assert_eq!(config.launch_secs, 3);
    }
}
