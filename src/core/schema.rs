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

//! Schema types - column definitions for relations

use std::fmt;

use rustc_hash::FxHashMap;

use super::error::{Error, Result};
use super::types::DataType;

/// A column definition in a relation schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    /// Column name, unique within the schema
    pub name: String,

    /// Semantic data type of the column
    pub data_type: DataType,
}

impl SchemaColumn {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered sequence of uniquely named columns
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<SchemaColumn>,
    /// Name -> ordinal lookup
    by_name: FxHashMap<String, usize>,
}

impl Schema {
    /// Create a schema from (name, type) pairs
    ///
    /// Fails with DuplicateColumn if two columns share a name.
    pub fn new(columns: Vec<(impl Into<String>, DataType)>) -> Result<Self> {
        let columns: Vec<SchemaColumn> = columns
            .into_iter()
            .map(|(name, dt)| SchemaColumn::new(name, dt))
            .collect();
        Self::from_columns(columns)
    }

    /// Create a schema from column definitions
    pub fn from_columns(columns: Vec<SchemaColumn>) -> Result<Self> {
        let mut by_name = FxHashMap::default();
        by_name.reserve(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if by_name.insert(col.name.clone(), i).is_some() {
                return Err(Error::DuplicateColumn(col.name.clone()));
            }
        }
        Ok(Self { columns, by_name })
    }

    /// The column definitions, in order
    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Look up a column's ordinal by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Look up a column's ordinal by name, failing with ColumnNotFound
    pub fn require_index(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// Get a column definition by name
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Build a new schema with one column appended
    ///
    /// Fails with DuplicateColumn if the name is already taken.
    pub fn with_column(&self, name: impl Into<String>, data_type: DataType) -> Result<Schema> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(Error::DuplicateColumn(name));
        }
        let mut columns = self.columns.clone();
        columns.push(SchemaColumn::new(name, data_type));
        Schema::from_columns(columns)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", col.name, col.data_type)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup() {
        let schema = Schema::new(vec![
            ("id", DataType::Integer),
            ("name", DataType::Text),
        ])
        .unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.column_index("name"), Some(1));
        assert_eq!(schema.column_index("missing"), None);
        assert_eq!(
            schema.require_index("missing"),
            Err(Error::ColumnNotFound("missing".to_string()))
        );
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Schema::new(vec![("id", DataType::Integer), ("id", DataType::Text)]);
        assert_eq!(result.unwrap_err(), Error::DuplicateColumn("id".to_string()));
    }

    #[test]
    fn test_with_column() {
        let schema = Schema::new(vec![("id", DataType::Integer)]).unwrap();
        let extended = schema.with_column("rank", DataType::Integer).unwrap();
        assert_eq!(extended.len(), 2);
        assert_eq!(extended.column_index("rank"), Some(1));
        // Original schema is untouched
        assert_eq!(schema.len(), 1);

        assert!(schema.with_column("id", DataType::Text).is_err());
    }

    #[test]
    fn test_schema_equality_ignores_lookup_map() {
        let a = Schema::new(vec![("x", DataType::Integer)]).unwrap();
        let b = Schema::new(vec![("x", DataType::Integer)]).unwrap();
        let c = Schema::new(vec![("x", DataType::Float)]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let schema = Schema::new(vec![
            ("id", DataType::Integer),
            ("ts", DataType::Timestamp),
        ])
        .unwrap();
        assert_eq!(schema.to_string(), "(id INTEGER, ts TIMESTAMP)");
    }
}
