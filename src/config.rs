use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const SEED_VAR: &str = "MEMORY_MAZE_SEED";
pub const LOG_VAR: &str = "MEMORY_MAZE_LOG";
pub const LOG_LEVEL_VAR: &str = "MEMORY_MAZE_LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Process settings. None of them affect difficulty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Fixed RNG seed; a fresh one is drawn when unset.
    pub seed: Option<u64>,
    /// Log destination. The terminal belongs to the game, so without a file
    /// nothing is logged.
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let seed = match lookup(SEED_VAR) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| Error::InvalidSetting {
                var: SEED_VAR,
                value: raw.clone(),
            })?),
            None => None,
        };
        let log_file = match lookup(LOG_VAR) {
            Some(raw) if raw.trim().is_empty() => {
                return Err(Error::InvalidSetting {
                    var: LOG_VAR,
                    value: raw,
                })
            }
            Some(raw) => Some(PathBuf::from(raw)),
            None => None,
        };
        Ok(Self { seed, log_file })
    }

    /// Route `log` records to the configured file, if any.
    pub fn init_logging(&self) -> Result<()> {
        let Some(path) = &self.log_file else {
            return Ok(());
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::LogFile {
                path: path.clone(),
                source,
            })?;
        env_logger::Builder::from_env(
            env_logger::Env::default().filter_or(LOG_LEVEL_VAR, DEFAULT_LOG_LEVEL),
        )
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
        Ok(())
    }
}
