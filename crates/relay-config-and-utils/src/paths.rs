//! File system paths for the relay process.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".omf-relay";
const BUFFER_FILE_NAME: &str = "buffer.sqlite";
const LOG_FILE_NAME: &str = "relay.jsonl";

/// Manages file system paths under the relay's base directory.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.omf-relay)
    base_dir: PathBuf,
}

impl Paths {
    /// Paths rooted at `~/.omf-relay`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Settings file (~/.omf-relay/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// SQLite buffer of undelivered messages (~/.omf-relay/buffer.sqlite).
    pub fn buffer_file(&self) -> PathBuf {
        self.base_dir.join(BUFFER_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// JSONL log (~/.omf-relay/logs/relay.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Ensure the base and logs directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
