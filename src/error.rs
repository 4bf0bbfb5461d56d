use thiserror::Error;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    /// Training data errors (absorbed internally by the dataset provider,
    /// surfaced only when even the synthetic fallback cannot be built)
    #[error("Data error: {0}")]
    Data(String),

    /// Model training errors
    #[error("Training failed: {0}")]
    Training(String),

    /// The model could not be made available for inference
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Errors during feature building, scaling, or model evaluation
    #[error("Inference failed: {0}")]
    Inference(String),

    /// Input validation errors
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
}

impl EngineError {
    /// Get error code string for structured failure results
    pub fn error_code(&self) -> &str {
        match self {
            EngineError::Data(_) => "DATA_ERROR",
            EngineError::Training(_) => "TRAINING_FAILED",
            EngineError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            EngineError::Inference(_) => "INFERENCE_FAILED",
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::Configuration(_) => "CONFIGURATION_ERROR",
            EngineError::Io(_) => "IO_ERROR",
            EngineError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        EngineError::Data(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            EngineError::ModelUnavailable("test".to_string()).error_code(),
            "MODEL_UNAVAILABLE"
        );
        assert_eq!(
            EngineError::Training("test".to_string()).error_code(),
            "TRAINING_FAILED"
        );
        assert_eq!(
            EngineError::Inference("test".to_string()).error_code(),
            "INFERENCE_FAILED"
        );
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::ModelUnavailable("training failed".to_string());
        assert_eq!(err.to_string(), "Model unavailable: training failed");
    }
}
