//! Core error types for boardflow-core.
//!
//! This module defines the error hierarchy using thiserror, split by
//! concern: save-time validation, graph conversion, and storage.

use thiserror::Error;

use crate::flow::condition::{ConditionField, ConditionOperator};
use crate::flow::graph::NodeKind;

/// Top-level error type for boardflow-core.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Save-time rule validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationFailure),

    /// Graph/canvas conversion failed
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Store collaborator failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// A problem with a single configuration field.
///
/// Produced by schema checks and handler validators; carried inside
/// [`ValidationError`] with the position of the offending component.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{key}': {message}")]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

impl FieldError {
    /// A required field was left empty
    pub fn required(key: &str) -> Self {
        Self {
            key: key.to_string(),
            message: "value is required".to_string(),
        }
    }

    /// A field was present but its value is unusable
    pub fn invalid(key: &str, message: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// A single hard error found while validating a rule before save.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Rule name must not be empty")]
    EmptyName,

    #[error("Unknown trigger type '{0}'")]
    UnknownTrigger(String),

    #[error("Trigger configuration: {0}")]
    TriggerConfig(FieldError),

    #[error("Condition {index}: operator '{operator}' is not allowed for field '{field}'")]
    OperatorNotAllowed {
        index: usize,
        field: ConditionField,
        operator: ConditionOperator,
    },

    #[error("Condition {index}: operator '{operator}' requires a value")]
    MissingConditionValue {
        index: usize,
        operator: ConditionOperator,
    },

    #[error("Rule has no actions")]
    NoActions,

    #[error("Unknown action type '{kind}' at position {index}")]
    UnknownAction { index: usize, kind: String },

    #[error("Action {index}: {error}")]
    ActionConfig { index: usize, error: FieldError },

    #[error("Duplicate action order {0}")]
    DuplicateActionOrder(u32),
}

/// All hard errors found in one validation pass.
///
/// Validation never stops at the first problem so the editor can show
/// everything that needs fixing at once.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Rule validation failed with {} error(s)", .errors.len())]
pub struct ValidationFailure {
    pub errors: Vec<ValidationError>,
}

/// Non-blocking validation findings. The rule still saves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// The rule references an action that is announced but not executable yet
    ComingSoonAction { index: usize, kind: String },
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationWarning::ComingSoonAction { index, kind } => {
                write!(
                    f,
                    "Action {index}: '{kind}' is not available yet and will fail at run time"
                )
            }
        }
    }
}

/// Graph-to-rule and canvas editing errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Flow has no trigger node")]
    MissingTrigger,

    #[error("Flow has {0} trigger nodes, expected exactly one")]
    MultipleTriggers(usize),

    #[error("Node '{node_id}' has {count} outgoing connections, a flow must be a single path")]
    Branching { node_id: String, count: usize },

    #[error("Flow contains a cycle through node '{node_id}'")]
    Cycle { node_id: String },

    #[error("Unknown node '{0}' referenced by a connection")]
    UnknownNode(String),

    #[error("Cannot connect nodes that belong to different rules")]
    CrossRule,

    #[error("Cannot connect a {from} node to a {to} node")]
    EdgeNotAllowed { from: NodeKind, to: NodeKind },

    #[error("A node cannot connect to itself")]
    SelfLoop,

    #[error("Connection from '{source_id}' to '{target_id}' already exists")]
    DuplicateEdge {
        source_id: String,
        target_id: String,
    },
}

/// Storage errors for the rule, run log, and template stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read/write rules file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse rules TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize rules TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Rule '{0}' not found")]
    RuleNotFound(String),

    #[error("Board '{0}' not found")]
    BoardNotFound(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type alias for FlowError
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failure_counts_errors() {
        let failure = ValidationFailure {
            errors: vec![ValidationError::EmptyName, ValidationError::NoActions],
        };
        assert_eq!(failure.to_string(), "Rule validation failed with 2 error(s)");
    }

    #[test]
    fn test_field_error_display() {
        let err = FieldError::required("column_id");
        assert_eq!(err.to_string(), "field 'column_id': value is required");
    }

    #[test]
    fn test_flow_error_wraps_store_error() {
        let err: FlowError = StoreError::RuleNotFound("r1".to_string()).into();
        assert!(err.to_string().contains("Rule 'r1' not found"));
    }
}
