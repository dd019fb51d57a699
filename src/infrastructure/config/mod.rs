//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::domain::entities::is_channel_name;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub throttle: ThrottleConfig,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub nick: String,
    #[serde(default = "default_command_marker")]
    pub command_marker: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// `host:port`
    pub address: String,
    pub channel: String,
    #[serde(default)]
    pub channel_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ThrottleConfig {
    pub min_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RosterConfig {
    /// Absent means wait for the names reply indefinitely
    pub refresh_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatchConfig {
    pub max_in_flight: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

fn default_command_marker() -> String {
    "!".to_string()
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self { min_interval_ms: 2000 }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            refresh_timeout_secs: Some(30),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bot.sqlite"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                nick: "memo-bot".to_string(),
                command_marker: default_command_marker(),
            },
            server: ServerConfig {
                address: "irc.libera.chat:6667".to_string(),
                channel: "#memo-bot".to_string(),
                channel_key: None,
            },
            throttle: ThrottleConfig::default(),
            roster: RosterConfig::default(),
            dispatch: DispatchConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();

        if let Ok(nick) = std::env::var("IRC_NICK") {
            config.bot.nick = nick;
        }

        if let Ok(server) = std::env::var("IRC_SERVER") {
            config.server.address = server;
        }

        if let Ok(channel) = std::env::var("IRC_CHANNEL") {
            config.server.channel = channel;
        }

        if let Ok(key) = std::env::var("IRC_CHANNEL_KEY") {
            config.server.channel_key = Some(key).filter(|k| !k.is_empty());
        }

        if let Ok(path) = std::env::var("BOT_DATABASE") {
            config.database.path = PathBuf::from(path);
        }

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.nick.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.nick".to_string()));
        }
        if self.bot.nick.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "nick '{}' contains whitespace",
                self.bot.nick
            )));
        }
        if self.bot.command_marker.is_empty() {
            return Err(ConfigError::MissingField("bot.command-marker".to_string()));
        }
        match self.server.address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => {
                return Err(ConfigError::InvalidValue(format!(
                    "server address '{}' is not host:port",
                    self.server.address
                )))
            }
        }
        if !is_channel_name(&self.server.channel) {
            return Err(ConfigError::InvalidValue(format!(
                "'{}' is not a channel name",
                self.server.channel
            )));
        }
        if self.throttle.min_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "throttle.min-interval-ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn min_reply_interval(&self) -> Duration {
        Duration::from_millis(self.throttle.min_interval_ms)
    }

    pub fn roster_timeout(&self) -> Option<Duration> {
        self.roster.refresh_timeout_secs.map(Duration::from_secs)
    }
}
