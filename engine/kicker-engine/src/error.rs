//! Error types for the kicker engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RankerError>;

/// Errors that can occur while scoring, projecting or exporting a kicker table
#[derive(Error, Debug)]
pub enum RankerError {
    /// I/O errors (reading input tables, writing exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON report serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more required columns are absent after normalization
    #[error("Missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// Two headers normalize to the same column
    #[error("Duplicate column '{0}' after normalization")]
    DuplicateColumn(String),

    /// A cell could not be parsed as the column's type
    #[error("Malformed value {value:?} in column '{column}' at row {row}")]
    MalformedValue {
        column: String,
        row: usize,
        value: String,
    },

    /// Historical data does not line up with the current feature set
    #[error("Model compatibility error: {0}")]
    ModelCompatibility(String),

    /// The regression system could not be solved
    #[error("Model fit failed: {0}")]
    ModelFit(String),

    /// Invalid or unresolvable scoring profile
    #[error("Profile error: {0}")]
    Profile(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RankerError {
    /// Create a new model compatibility error
    pub fn model_compatibility(msg: impl Into<String>) -> Self {
        Self::ModelCompatibility(msg.into())
    }

    /// Create a new model fit error
    pub fn model_fit(msg: impl Into<String>) -> Self {
        Self::ModelFit(msg.into())
    }

    /// Create a new profile error
    pub fn profile(msg: impl Into<String>) -> Self {
        Self::Profile(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error aborts the whole run rather than a single stage
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Self::MissingColumns { .. } | Self::MalformedValue { .. } | Self::DuplicateColumn(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_names_every_column() {
        let err = RankerError::MissingColumns {
            missing: vec!["O/U".to_string(), "Weather".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required column(s): O/U, Weather");
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_model_errors_are_not_schema_errors() {
        assert!(!RankerError::model_compatibility("no target").is_schema_error());
        assert!(!RankerError::model_fit("singular").is_schema_error());
    }
}
