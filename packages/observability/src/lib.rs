//! # Observability
//!
//! Logging setup for the relay publisher.
//!
//! The binary calls [`init`] or [`init_with_config`] once at startup and
//! uses plain `tracing` macros everywhere else. Events go to a JSONL file
//! (`~/.omf-relay/logs/relay.jsonl` unless overridden), one object per line:
//!
//! ```text
//! tail -f ~/.omf-relay/logs/relay.jsonl | jq
//! ```
//!
//! Message bodies and producer tokens are redacted from structured fields
//! before they are written.
//!
//! ```rust,ignore
//! let path = observability::init_with_config(observability::LogConfig {
//!     service_name: "omf-relay".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! })?;
//! ```

mod file;
mod json_layer;

pub use file::{default_log_path, CentralLogWriter, WriterFactory};
pub use json_layer::{JsonLayer, LogEntry, REDACTED_FIELDS};

use std::io;
use std::path::PathBuf;

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every line as `service`.
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,
    /// Overrides [`default_log_path`].
    pub log_path: Option<PathBuf>,
    /// Mirror events to stderr in compact form.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "omf-relay".to_string(),
            default_level: "info".to_string(),
            log_path: None,
            also_stderr: true,
        }
    }
}

impl LogConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// The file events will be written to, if one can be determined.
    pub fn resolved_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(file::default_log_path)
    }
}

/// Initialize logging with defaults for `service_name`.
pub fn init(service_name: &str) -> io::Result<PathBuf> {
    init_with_config(LogConfig::new(service_name))
}

/// Initialize logging and return the path of the log file.
pub fn init_with_config(config: LogConfig) -> io::Result<PathBuf> {
    let log_path = config.resolved_log_path().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "no home directory; set an explicit log path",
        )
    })?;
    file::init_file_subscriber(&config, &log_path)?;
    Ok(log_path)
}
