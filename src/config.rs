use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the chat backend
    pub backend_url: String,

    /// Default system prompt for new conversations
    pub system_message: String,

    /// Directory transcript exports are written to
    pub export_dir: PathBuf,

    /// Chatr home directory
    pub chatr_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub tick_rate_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
        let chatr_home = home.join(".chatr");

        Config {
            backend_url: "http://localhost:8000".to_string(),
            system_message: "You are a useful AI assistant.".to_string(),
            export_dir: PathBuf::from("."),
            chatr_home,
            ui: UiConfig {
                show_timestamps: true,
                tick_rate_ms: 50,
            },
        }
    }
}

impl Config {
    /// Load configuration from `~/.chatr/config.toml`, falling back to
    /// defaults when no file exists yet.
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let chatr_home = home.join(".chatr");
        let config_path = chatr_home.join("config.toml");

        fs::create_dir_all(&chatr_home).context("Failed to create .chatr directory")?;

        let mut config = if config_path.exists() {
            let content =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.chatr_home = chatr_home;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.chatr_home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Path of the diagnostic log file.
    pub fn log_path(&self) -> PathBuf {
        self.chatr_home.join("chatr.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_backend() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:8000");
        assert_eq!(config.system_message, "You are a useful AI assistant.");
        assert_eq!(config.export_dir, PathBuf::from("."));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = Config::default();
        config.backend_url = "http://chat.example.org:9000".to_string();
        config.ui.show_timestamps = false;

        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.backend_url, "http://chat.example.org:9000");
        assert!(!parsed.ui.show_timestamps);
        assert_eq!(parsed.system_message, config.system_message);
    }
}
