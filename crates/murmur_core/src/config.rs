//! Configuration for Murmur
//!
//! Settings are read from a TOML file (path taken from `MURMUR_CONFIG`,
//! defaulting to `murmur.toml`) and overridden from the environment, so a
//! deployment can keep the token out of the file entirely.

use std::{collections::HashMap, env, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Main configuration for Murmur
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MurmurConfig {
    /// Discord transport configuration
    pub discord: DiscordConfig,
    /// Agent configuration, forwarded to the agent constructor unchanged
    #[serde(default)]
    pub agent: AgentSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    pub token: String,
    /// Channel the relay listens on
    pub channel_id: u64,
}

/// Settings owned by the agent component; the relay never interprets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(flatten)]
    pub settings: HashMap<String, serde_json::Value>,
}

impl MurmurConfig {
    /// Load configuration from the config file and environment variables
    pub fn load() -> Result<Self> {
        let config_path = env::var("MURMUR_CONFIG").unwrap_or_else(|_| "murmur.toml".to_string());

        if Path::new(&config_path).exists() {
            let contents =
                std::fs::read_to_string(&config_path).map_err(|_e| CoreError::ConfigNotFound {
                    path: config_path.clone(),
                })?;
            let config: Self = toml::from_str(&contents)
                .map_err(|source| CoreError::ConfigParseFailed { source })?;
            Ok(config.override_from_env())
        } else {
            Ok(Self::default().override_from_env())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.discord.token.is_empty() {
            return Err(CoreError::ConfigInvalid {
                field: "discord.token".to_string(),
                reason: "Discord bot token cannot be empty".to_string(),
            });
        }

        if self.discord.channel_id == 0 {
            return Err(CoreError::ConfigInvalid {
                field: "discord.channel_id".to_string(),
                reason: "A monitored channel ID is required".to_string(),
            });
        }

        Ok(())
    }

    /// Override config values with environment variables
    fn override_from_env(mut self) -> Self {
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Ok(channel_id) = env::var("DISCORD_CHANNEL_ID") {
            if let Ok(id) = channel_id.parse() {
                self.discord.channel_id = id;
            }
        }

        self
    }
}
