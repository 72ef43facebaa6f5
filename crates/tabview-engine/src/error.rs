//! Error types for the view engine.
//!
//! The engine is defensive about data: malformed filter text, missing values
//! and incomparable values all degrade to well-defined behavior instead of
//! failing. Only configuration-shape problems surface here, and every variant
//! names the offending field.

use thiserror::Error;

use crate::op::FilterOperator;
use crate::schema::DataDomain;

/// Which part of the view configuration referenced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldContext {
    Sort,
    Filter,
    Group,
    Column,
}

impl FieldContext {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldContext::Sort => "sort",
            FieldContext::Filter => "filter",
            FieldContext::Group => "group",
            FieldContext::Column => "column",
        }
    }
}

impl std::fmt::Display for FieldContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised when a view configuration does not fit the field schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A sort, filter, group or column request named a field that is not in the schema.
    #[error("unknown {context} field '{field}'")]
    UnknownField { field: String, context: FieldContext },

    /// The operator does not belong to the field's data domain.
    #[error("operator '{operator}' is not valid for {domain} field '{field}'")]
    UnsupportedOperator {
        field: String,
        operator: FilterOperator,
        domain: DataDomain,
    },

    /// A sort specification listed the same field twice.
    #[error("field '{field}' appears more than once in the sort specification")]
    DuplicateSortField { field: String },

    /// Strict group ordering is on and the sort keys do not lead with the group fields.
    #[error("group field '{expected}' must be sort key #{position}, found {found}")]
    GroupSortMismatch {
        expected: String,
        position: usize,
        found: String,
    },

    /// Page size must be at least one.
    #[error("page size must be at least 1")]
    InvalidPageSize,
}

impl EngineError {
    pub(crate) fn unknown(field: impl Into<String>, context: FieldContext) -> Self {
        EngineError::UnknownField {
            field: field.into(),
            context,
        }
    }

    /// The field the error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            EngineError::UnknownField { field, .. }
            | EngineError::UnsupportedOperator { field, .. }
            | EngineError::DuplicateSortField { field } => Some(field),
            EngineError::GroupSortMismatch { expected, .. } => Some(expected),
            EngineError::InvalidPageSize => None,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
