//! Core error types for the relay process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Home directory could not be determined
    #[error("Path error: {0}")]
    Path(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_underlying_errors() {
        let err: CoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, CoreError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = parse.into();
        assert!(err.to_string().starts_with("JSON error: "));
    }
}
