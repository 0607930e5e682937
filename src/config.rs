use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::snake::Position;

const APP_DIR_NAME: &str = "grid-snake";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default grid width in cells.
pub const DEFAULT_GRID_WIDTH: u16 = 50;

/// Default grid height in cells.
pub const DEFAULT_GRID_HEIGHT: u16 = 50;

/// Base tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

/// Length added to the snake for every captured apple.
pub const DEFAULT_GROWTH_PER_CAPTURE: u32 = 3;

/// Logical grid dimensions passed through the game as a named type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct GridSize {
    pub width: u16,
    pub height: u16,
}

impl GridSize {
    /// Returns the cell a fresh snake starts on, `(⌊W/2⌋, ⌊H/2⌋)`.
    #[must_use]
    pub fn center(self) -> Position {
        Position {
            x: i32::from(self.width / 2),
            y: i32::from(self.height / 2),
        }
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
        }
    }
}

/// Settings for one game session.
///
/// The grid bounds the engine's validity check; the remaining fields only
/// configure the scheduler and the orchestrator.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(try_from = "RawGameConfig")]
pub struct GameConfig {
    pub grid: GridSize,
    pub tick_interval: Duration,
    pub growth_per_capture: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: GridSize::default(),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            growth_per_capture: DEFAULT_GROWTH_PER_CAPTURE,
        }
    }
}

impl GameConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_local_dir()
            .map(|p| p.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
            .ok_or(ConfigError::NoPath)
    }

    /// Reads configuration from a TOML file on disk.
    ///
    /// When the file does not exist and `allow_missing` is true, the default
    /// configuration is returned instead.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file cannot be read, cannot be parsed, or holds
    /// values that fail [`GameConfig::validate`].
    pub fn load(path: &Path, allow_missing: bool) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound && allow_missing => {
                log::debug!("No config file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Read(e)),
        };
        let config = toml::from_str(&content)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Checks the invariants every session relies on.
    pub fn validate(self) -> Result<Self, InvalidConfig> {
        if self.grid.width == 0 || self.grid.height == 0 {
            return Err(InvalidConfig::EmptyGrid {
                width: self.grid.width,
                height: self.grid.height,
            });
        }
        if self.tick_interval.is_zero() {
            return Err(InvalidConfig::ZeroInterval);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
struct RawGameConfig {
    width: u16,
    height: u16,
    tick_interval_ms: u64,
    growth_per_capture: u32,
}

impl Default for RawGameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_GRID_WIDTH,
            height: DEFAULT_GRID_HEIGHT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            growth_per_capture: DEFAULT_GROWTH_PER_CAPTURE,
        }
    }
}

impl TryFrom<RawGameConfig> for GameConfig {
    type Error = InvalidConfig;

    fn try_from(value: RawGameConfig) -> Result<Self, InvalidConfig> {
        GameConfig {
            grid: GridSize {
                width: value.width,
                height: value.height,
            },
            tick_interval: Duration::from_millis(value.tick_interval_ms),
            growth_per_capture: value.growth_per_capture,
        }
        .validate()
    }
}

#[derive(Debug, Clone, Copy, Error, Eq, PartialEq)]
pub enum InvalidConfig {
    #[error("grid must have at least one cell, got {width}x{height}")]
    EmptyGrid { width: u16, height: u16 },
    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to determine path to local configuration directory")]
    NoPath,
    #[error("failed to read configuration file")]
    Read(#[from] io::Error),
    #[error("failed to parse configuration file")]
    Parse(#[from] toml::de::Error),
}
