//! Error types for the wallet scorer

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scoring pipeline
#[derive(Error, Debug)]
pub enum Error {
    // Input file errors
    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // Record errors
    #[error("Record {index}: missing field '{field}'")]
    MissingField { index: usize, field: String },

    #[error("Record {index}: cannot convert '{field}' value {value}: {reason}")]
    Conversion {
        index: usize,
        field: String,
        value: String,
        reason: String,
    },

    // Training errors
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Model error: {0}")]
    Model(String),

    // Output errors
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error was caused by the contents of the input data
    /// rather than by the environment (filesystem, configuration)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Parse(_)
                | Error::MissingField { .. }
                | Error::Conversion { .. }
                | Error::InsufficientData(_)
        )
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

// Conversion from CSV writer errors
impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Self {
        Error::Csv(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(Error::Parse("bad".into()).is_input_error());
        assert!(Error::MissingField {
            index: 0,
            field: "action".into()
        }
        .is_input_error());
        assert!(!Error::FileNotFound("x.json".into()).is_input_error());
        assert!(!Error::Csv("closed".into()).is_input_error());
    }

    #[test]
    fn test_input_error_survives_anyhow_context() {
        let err = anyhow::Error::from(Error::InsufficientData("empty".into()))
            .context("Scoring run failed");
        assert!(err
            .downcast_ref::<Error>()
            .is_some_and(Error::is_input_error));

        let err = anyhow::Error::from(Error::Io("denied".into())).context("Scoring run failed");
        assert!(!err.downcast_ref::<Error>().is_some_and(Error::is_input_error));
    }

    #[test]
    fn test_conversion_message() {
        let e = Error::Conversion {
            index: 3,
            field: "actionData_amount".into(),
            value: "\"abc\"".into(),
            reason: "not a number".into(),
        };
        assert_eq!(
            e.to_string(),
            "Record 3: cannot convert 'actionData_amount' value \"abc\": not a number"
        );
    }
}
