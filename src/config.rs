use std::{path::PathBuf, sync::OnceLock};

use config::{Config, File};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("The configuration has already been initialized")]
    ConfigAlreadyInitialized,

    #[error("Unable to read the configuration file: {0}")]
    UnableToReadConfig(#[from] config::ConfigError),
}

/// Configuration of the command line tool
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct PgnboardConfig {
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,

    /// Print the board from Black's side
    pub flip_board: bool,

    /// Print the FEN after every move
    pub show_fen: bool,
}

impl Default for PgnboardConfig {
    fn default() -> Self {
        PgnboardConfig { log_level: "warn".to_string(), flip_board: false, show_fen: false }
    }
}

static CONFIG: OnceLock<PgnboardConfig> = OnceLock::new();

/// Get the configuration. The defaults are used if it was never initialized.
pub fn get_config() -> &'static PgnboardConfig {
    CONFIG.get_or_init(PgnboardConfig::default)
}

/// Read the configuration from a file. Missing keys keep their default value.
pub fn load(path: PathBuf) -> Result<PgnboardConfig, ConfigError> {
    let settings = Config::builder().add_source(File::from(path)).build()?;
    Ok(settings.try_deserialize()?)
}

/// Initialize the configuration, from a file if one is given
pub fn initialize(path: Option<PathBuf>) -> Result<(), ConfigError> {
    let config = match path {
        Some(path) => load(path)?,
        None => PgnboardConfig::default(),
    };
    CONFIG.set(config).map_err(|_| ConfigError::ConfigAlreadyInitialized)
}
