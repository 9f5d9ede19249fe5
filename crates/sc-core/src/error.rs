//! Core error types for Service Center RS
//!
//! Every service operation fails with one of the kinds below. Validation and
//! state errors are raised before any write; persistence errors are opaque.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Core error type for all service center operations
#[derive(Error, Debug)]
pub enum ScError {
    #[error("Not found: {entity} {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid state: {entity} {id} is {current}: {message}")]
    InvalidState {
        entity: &'static str,
        id: String,
        current: String,
        message: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Identifier space exhausted for {category}")]
    AllocationExhausted { category: &'static str },

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        ScError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ScError::Forbidden {
            message: message.into(),
        }
    }

    pub fn invalid_state(
        entity: &'static str,
        id: impl ToString,
        current: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        ScError::InvalidState {
            entity,
            id: id.to_string(),
            current: current.to_string(),
            message: message.into(),
        }
    }

    /// Single base validation message
    pub fn validation(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        ScError::Validation(errors)
    }

    /// Single field validation message
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        ScError::Validation(errors)
    }

    pub fn persistence(message: impl ToString) -> Self {
        ScError::Persistence(message.to_string())
    }
}

/// Validation errors collection
///
/// Field keys are kept ordered so messages listing several failing
/// entities come out in a stable order.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> messages
    pub errors: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for (field, field_messages) in &self.errors {
            for msg in field_messages {
                messages.push(format!("{} {}", field, msg));
            }
        }
        messages
    }

    /// Turn the collection into a result, failing if anything was recorded
    pub fn into_result(self) -> Result<(), ScError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ScError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// HTTP status code mapping for errors
impl ScError {
    pub fn status_code(&self) -> u16 {
        match self {
            ScError::NotFound { .. } => 404,
            ScError::Unauthorized { .. } => 401,
            ScError::Forbidden { .. } => 403,
            ScError::InvalidState { .. } | ScError::AllocationExhausted { .. } => 409,
            ScError::Validation(_) => 422,
            ScError::Persistence(_) | ScError::Config(_) | ScError::Internal(_) => 500,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ScError::NotFound { .. } => "not_found",
            ScError::Unauthorized { .. } => "unauthorized",
            ScError::Forbidden { .. } => "forbidden",
            ScError::InvalidState { .. } => "invalid_state",
            ScError::Validation(_) => "validation_failed",
            ScError::AllocationExhausted { .. } => "allocation_exhausted",
            ScError::Persistence(_) => "persistence_failure",
            ScError::Config(_) => "configuration_error",
            ScError::Internal(_) => "internal_error",
        }
    }

    /// Whether the message may be shown to API clients as-is
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
