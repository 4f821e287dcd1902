//! Game configuration
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) yields the standard game.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emoji::EmojiPool;
use crate::models::DEFAULT_ROUND_DURATION_SECS;

/// Tunables for a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seconds each player has to guess
    pub round_duration_secs: u32,
    pub min_players: usize,
    pub max_players: usize,
    /// Pre-roll between Starting and the first round
    pub start_delay_ms: u64,
    /// Pause on the round results before the next round
    pub round_end_delay_ms: u64,
    /// Size of the guess selector grid
    pub emoji_options: usize,
    pub min_name_len: usize,
    pub max_name_len: usize,
    /// How often the turn watchdog checks for an expired turn
    pub turn_check_interval_ms: u64,
    /// Custom symbol pool (defaults to the built-in faces)
    pub symbols: Option<Vec<String>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: DEFAULT_ROUND_DURATION_SECS,
            min_players: 2,
            max_players: 8,
            start_delay_ms: 1000,
            round_end_delay_ms: 2000,
            emoji_options: 12,
            min_name_len: 2,
            max_name_len: 20,
            turn_check_interval_ms: 500,
            symbols: None,
        }
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl GameConfig {
    /// Parse and validate a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "Loaded game config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < 2 {
            return Err(ConfigError::Invalid(format!(
                "min_players must be at least 2, got {}",
                self.min_players
            )));
        }
        if self.max_players < self.min_players {
            return Err(ConfigError::Invalid(format!(
                "max_players ({}) is below min_players ({})",
                self.max_players, self.min_players
            )));
        }
        if self.round_duration_secs == 0 {
            return Err(ConfigError::Invalid("round_duration_secs must be positive".into()));
        }
        if self.emoji_options == 0 {
            return Err(ConfigError::Invalid("emoji_options must be positive".into()));
        }
        if self.min_name_len == 0 || self.max_name_len < self.min_name_len {
            return Err(ConfigError::Invalid(format!(
                "name length bounds {}..={} are invalid",
                self.min_name_len, self.max_name_len
            )));
        }
        if self.turn_check_interval_ms == 0 {
            return Err(ConfigError::Invalid("turn_check_interval_ms must be positive".into()));
        }
        self.pool()?;
        Ok(())
    }

    /// Symbol pool for this configuration
    pub fn pool(&self) -> Result<EmojiPool, ConfigError> {
        match &self.symbols {
            Some(symbols) => EmojiPool::new(symbols.iter().cloned())
                .map_err(|e| ConfigError::Invalid(e.to_string())),
            None => Ok(EmojiPool::default()),
        }
    }

    /// Check a display name against the configured bounds
    pub fn validate_name(&self, name: &str) -> crate::Result<String> {
        let trimmed = name.trim();
        let len = trimmed.chars().count();
        if len < self.min_name_len || len > self.max_name_len {
            return Err(crate::Error::InvalidPlayerName(format!(
                "'{trimmed}' must be {}-{} characters",
                self.min_name_len, self.max_name_len
            )));
        }
        Ok(trimmed.to_string())
    }
}
