use std::path::PathBuf;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Model artifact missing, unreadable or structurally invalid
    #[error("Failed to load model artifact {}: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },

    /// Requested disease identifier is not registered
    #[error("Unknown disease: {0}")]
    UnknownDisease(String),

    /// Input vector length does not match the feature spec
    #[error("Shape mismatch for {disease}: expected {expected} values, got {got}")]
    ShapeMismatch {
        disease: String,
        expected: usize,
        got: usize,
    },

    /// A field value violates its declared domain
    #[error("Field '{field}' of {disease} out of range: {value} not in {}", bounds_label(.min, .max))]
    OutOfRange {
        disease: String,
        field: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// Validation errors outside the numeric domain checks (unknown field names, bad labels)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

fn bounds_label(min: &Option<f64>, max: &Option<f64>) -> String {
    match (*min, *max) {
        (Some(lo), Some(hi)) => format!("[{}, {}]", lo, hi),
        (Some(lo), None) => format!("[{}, +inf)", lo),
        (None, Some(hi)) => format!("(-inf, {}]", hi),
        (None, None) => "finite values".to_string(),
    }
}

impl AppError {
    /// Construct a load error for the given artifact path
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AppError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Load { .. } => "LOAD_ERROR",
            AppError::UnknownDisease(_) => "UNKNOWN_DISEASE",
            AppError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            AppError::OutOfRange { .. } => "OUT_OF_RANGE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller can reasonably continue after this error.
    ///
    /// Load and configuration failures abort startup; request errors are
    /// returned to the presentation layer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::UnknownDisease(_)
                | AppError::ShapeMismatch { .. }
                | AppError::OutOfRange { .. }
                | AppError::Validation(_)
        )
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from serde_yaml::Error
impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from bincode::Error
impl From<bincode::Error> for AppError {
    fn from(err: bincode::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::UnknownDisease("x".to_string()).error_code(),
            "UNKNOWN_DISEASE"
        );
        assert_eq!(
            AppError::ShapeMismatch {
                disease: "Diabetes".to_string(),
                expected: 8,
                got: 7
            }
            .error_code(),
            "SHAPE_MISMATCH"
        );
        assert_eq!(AppError::load("m.json", "missing").error_code(), "LOAD_ERROR");
    }

    #[test]
    fn test_recoverability() {
        assert!(!AppError::load("m.json", "missing").is_recoverable());
        assert!(!AppError::Configuration("bad".to_string()).is_recoverable());
        assert!(AppError::UnknownDisease("x".to_string()).is_recoverable());
        assert!(AppError::OutOfRange {
            disease: "Diabetes".to_string(),
            field: "Glucose".to_string(),
            value: 400.0,
            min: Some(0.0),
            max: Some(300.0),
        }
        .is_recoverable());
    }

    #[test]
    fn test_out_of_range_message_names_field() {
        let err = AppError::OutOfRange {
            disease: "Diabetes".to_string(),
            field: "Glucose".to_string(),
            value: 400.0,
            min: Some(0.0),
            max: Some(300.0),
        };
        let message = err.to_string();
        assert!(message.contains("Glucose"));
        assert!(message.contains("[0, 300]"));
    }
}
