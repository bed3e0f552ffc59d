//! Logging initialization for the relay process.
//!
//! Thin wrapper over the observability crate: structured JSONL to the
//! relay's log file plus compact stderr output.

use crate::CoreResult;
use std::path::PathBuf;

const SERVICE_NAME: &str = "omf-relay";

/// Install the global subscriber writing to `log_path` at `level`
/// (`RUST_LOG` takes precedence). Returns the log file path.
pub fn init_logging(level: &str, log_path: PathBuf) -> CoreResult<PathBuf> {
    let path = observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path: Some(log_path),
        also_stderr: true,
    })?;
    Ok(path)
}

/// Parse a log level string into a tracing Level. Unknown values map to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_level_all_variants() {
        assert_eq!(parse_level("trace"), tracing::Level::TRACE);
        assert_eq!(parse_level("debug"), tracing::Level::DEBUG);
        assert_eq!(parse_level("info"), tracing::Level::INFO);
        assert_eq!(parse_level("warn"), tracing::Level::WARN);
        assert_eq!(parse_level("warning"), tracing::Level::WARN);
        assert_eq!(parse_level("error"), tracing::Level::ERROR);
    }

    #[test]
    fn parse_level_case_and_whitespace() {
        assert_eq!(parse_level(" DEBUG "), tracing::Level::DEBUG);
        assert_eq!(parse_level("Warning"), tracing::Level::WARN);
    }

    #[test]
    fn parse_level_unknown_defaults_to_info() {
        assert_eq!(parse_level(""), tracing::Level::INFO);
        assert_eq!(parse_level("verbose"), tracing::Level::INFO);
        assert_eq!(parse_level("fatal"), tracing::Level::INFO);
    }
}
