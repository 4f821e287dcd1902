//! Application state management

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use emoji_guess_core::{ConfigError, GameConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE: &str = "emoji-guess.toml";

/// Bot table settings (the `[table]` section of the config file)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Number of bots seated, the first one hosts
    pub bots: usize,
    /// Bot display names, reused with a number suffix when there are more bots
    pub names: Vec<String>,
    pub think_min_ms: u64,
    pub think_max_ms: u64,
    /// Chance that a bot names its own symbol
    pub accuracy: f64,
    /// Fixed seed for reproducible tables
    pub seed: Option<u64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            bots: 4,
            names: ["Ada", "Basil", "Cleo", "Dara", "Enzo", "Faye", "Gus", "Hana"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            think_min_ms: 200,
            think_max_ms: 800,
            accuracy: 0.8,
            seed: None,
        }
    }
}

impl TableConfig {
    pub fn validate(&self, game: &GameConfig) -> Result<()> {
        if self.bots < game.min_players {
            return Err(Error::NotEnoughBots {
                have: self.bots,
                need: game.min_players,
            });
        }
        if self.bots > game.max_players {
            return Err(ConfigError::Invalid(format!(
                "{} bots exceed max_players ({})",
                self.bots, game.max_players
            ))
            .into());
        }
        if self.names.is_empty() {
            return Err(ConfigError::Invalid("table.names is empty".into()).into());
        }
        if self.think_min_ms > self.think_max_ms {
            return Err(ConfigError::Invalid(format!(
                "think time range {}..={} is empty",
                self.think_min_ms, self.think_max_ms
            ))
            .into());
        }
        if !(0.0..=1.0).contains(&self.accuracy) {
            return Err(ConfigError::Invalid(format!(
                "accuracy {} is outside 0..=1",
                self.accuracy
            ))
            .into());
        }
        Ok(())
    }

    /// Display name for the bot in seat `index`
    pub fn bot_name(&self, index: usize) -> String {
        let base = &self.names[index % self.names.len()];
        match index / self.names.len() {
            0 => base.clone(),
            lap => format!("{base} {}", lap + 1),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TableSection {
    #[serde(default)]
    table: TableConfig,
}

/// Main application state
pub struct AppState {
    game: GameConfig,
    table: TableConfig,
    data_dir: PathBuf,
    config_path: Option<PathBuf>,
}

impl AppState {
    /// Load configuration from `config_path`, or from the user config
    /// directory when no path is given. A missing default file means defaults.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let dirs = Self::project_dirs()?;
        let config_path = config_path.or_else(|| {
            let default = dirs.config_dir().join(CONFIG_FILE);
            default.exists().then_some(default)
        });

        let (game, table) = match &config_path {
            Some(path) => Self::load_config(path)?,
            None => (GameConfig::default(), TableConfig::default()),
        };
        table.validate(&game)?;

        Ok(Self {
            game,
            table,
            data_dir: dirs.data_dir().to_path_buf(),
            config_path,
        })
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "onyx", "emoji-guess").ok_or(Error::NoDataDir)
    }

    fn load_config(path: &Path) -> Result<(GameConfig, TableConfig)> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;
        let game = GameConfig::from_toml(&content)?;
        let section: TableSection = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok((game, section.table))
    }

    pub fn game(&self) -> &GameConfig {
        &self.game
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where finished games are archived
    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
