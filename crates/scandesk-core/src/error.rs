use thiserror::Error;

/// Top-level error type for the Scandesk console.
///
/// The engine keeps its own per-component errors; this type covers what the
/// binary has to deal with around them: loading configuration, talking to the
/// terminal, and remote setup failures that happen before any scan runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ScandeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("No actions available from the action catalog")]
    NoActions,
}

impl From<toml::de::Error> for ScandeskError {
    fn from(err: toml::de::Error) -> Self {
        ScandeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ScandeskError {
    fn from(err: toml::ser::Error) -> Self {
        ScandeskError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ScandeskError {
    fn from(err: serde_json::Error) -> Self {
        ScandeskError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Scandesk operations.
pub type Result<T> = std::result::Result<T, ScandeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScandeskError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(ScandeskError, &str)> = vec![
            (
                ScandeskError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                ScandeskError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (
                ScandeskError::Remote("connection refused".to_string()),
                "Remote error: connection refused",
            ),
            (
                ScandeskError::NoActions,
                "No actions available from the action catalog",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ScandeskError = io_err.into();
        assert!(matches!(err, ScandeskError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: ScandeskError = err.unwrap_err().into();
        assert!(matches!(err, ScandeskError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: ScandeskError = err.unwrap_err().into();
        assert!(matches!(err, ScandeskError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
