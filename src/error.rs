//! Error types for the hydration engine.
//!

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HydrationError {
    /// A hydration spec is malformed. Raised before any resolver runs.
    #[error("Invalid hydration spec {spec}: {reason}")]
    InvalidSpec { spec: String, reason: String },

    /// A second resolver of the same kind was registered for a key
    #[error("Duplicate {kind} registration for key '{key}'")]
    DuplicateRegistration { kind: String, key: String },

    /// Restructuring consumed a different number of elements than were flattened
    #[error("Shape mismatch for key '{key}': descriptor expects {expected} elements, got {actual}")]
    ShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// A resolver broke its input/output contract
    #[error("Resolver contract violated for key '{key}': {reason}")]
    ResolverContract { key: String, reason: String },

    #[error("Resolver error for key '{key}': {message}")]
    Resolver { key: String, message: String },

    #[error("Query error for {target}: {message}")]
    Query { target: String, message: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HydrationError {
    pub fn invalid_spec(spec: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        HydrationError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.into(),
        }
    }

    pub fn resolver(key: impl Into<String>, message: impl Into<String>) -> Self {
        HydrationError::Resolver {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn query(target: impl Into<String>, message: impl Into<String>) -> Self {
        HydrationError::Query {
            target: target.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before any resolver or store call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            HydrationError::InvalidSpec { .. } | HydrationError::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for HydrationError {
    fn from(error: serde_json::Error) -> Self {
        HydrationError::Serialization(format!("JSON serialization error: {error}"))
    }
}

impl From<config::ConfigError> for HydrationError {
    fn from(error: config::ConfigError) -> Self {
        HydrationError::Configuration(error.to_string())
    }
}

pub type HydrationResult<T> = Result<T, HydrationError>;
