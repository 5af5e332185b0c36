// Copyright 2025 Windrow Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Windrow
//!
//! All failures are reported to the caller at whole-query granularity;
//! there is no internal retry and no partial result on error.

use thiserror::Error;

use super::types::DataType;

/// Result type alias for Windrow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for query evaluation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Schema and relation errors
    // =========================================================================
    /// Column not found in the relation schema
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    /// Duplicate column name in a schema
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// Value type does not match the column's declared type
    #[error("type mismatch for column '{column}': expected {expected}, got {got}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        got: DataType,
    },

    /// Row has the wrong number of values for the schema
    #[error("row arity mismatch: schema has {expected} columns, row has {got}")]
    RowArityMismatch { expected: usize, got: usize },

    // =========================================================================
    // Window evaluation errors
    // =========================================================================
    /// Ranking/offset function requested without an ordering
    #[error("window function {0} requires an order specification")]
    MissingOrderSpec(String),

    /// Malformed window frame bounds
    #[error("invalid frame specification: {0}")]
    InvalidFrameSpec(String),

    // =========================================================================
    // Recursive resolution errors
    // =========================================================================
    /// Depth cap reached with a non-empty frontier
    #[error("recursion limit exceeded: frontier not empty after {max_depth} iterations")]
    RecursionLimitExceeded { max_depth: usize },

    /// Recursive member incompatible with the anchor
    #[error("invalid recursive spec: {0}")]
    InvalidRecursiveSpec(String),

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Invalid argument for an operation
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new TypeMismatch error
    pub fn type_mismatch(column: impl Into<String>, expected: DataType, got: DataType) -> Self {
        Error::TypeMismatch {
            column: column.into(),
            expected,
            got,
        }
    }

    /// Create a new MissingOrderSpec error
    pub fn missing_order_spec(function: impl Into<String>) -> Self {
        Error::MissingOrderSpec(function.into())
    }

    /// Create a new InvalidFrameSpec error
    pub fn invalid_frame_spec(message: impl Into<String>) -> Self {
        Error::InvalidFrameSpec(message.into())
    }

    /// Create a new InvalidRecursiveSpec error
    pub fn invalid_recursive_spec(message: impl Into<String>) -> Self {
        Error::InvalidRecursiveSpec(message.into())
    }

    /// Create a new InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Check if this error indicates a malformed caller-supplied spec
    pub fn is_spec_error(&self) -> bool {
        matches!(
            self,
            Error::MissingOrderSpec(_)
                | Error::InvalidFrameSpec(_)
                | Error::InvalidRecursiveSpec(_)
                | Error::InvalidArgument(_)
        )
    }

    /// Check if this error indicates a schema/type problem in the input data
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::ColumnNotFound(_)
                | Error::DuplicateColumn(_)
                | Error::TypeMismatch { .. }
                | Error::RowArityMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::ColumnNotFound("ts".to_string()).to_string(),
            "column 'ts' not found"
        );
        assert_eq!(
            Error::missing_order_spec("ROW_NUMBER").to_string(),
            "window function ROW_NUMBER requires an order specification"
        );
        assert_eq!(
            Error::RecursionLimitExceeded { max_depth: 8 }.to_string(),
            "recursion limit exceeded: frontier not empty after 8 iterations"
        );
        assert_eq!(
            Error::type_mismatch("age", DataType::Integer, DataType::Text).to_string(),
            "type mismatch for column 'age': expected INTEGER, got TEXT"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::missing_order_spec("RANK").is_spec_error());
        assert!(Error::invalid_frame_spec("start after end").is_spec_error());
        assert!(!Error::ColumnNotFound("c".to_string()).is_spec_error());

        assert!(Error::ColumnNotFound("c".to_string()).is_schema_error());
        assert!(Error::RowArityMismatch { expected: 3, got: 2 }.is_schema_error());
        assert!(!Error::RecursionLimitExceeded { max_depth: 1 }.is_schema_error());
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(
            Error::ColumnNotFound("c".to_string()),
            Error::ColumnNotFound("c".to_string())
        );
        assert_ne!(
            Error::RecursionLimitExceeded { max_depth: 1 },
            Error::RecursionLimitExceeded { max_depth: 2 }
        );
    }
}
