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

//! Relation - an ordered, schema-conforming sequence of rows
//!
//! Row order is significant only as arrival order, which serves as the
//! stable tie-break for all downstream sorting.

use super::error::{Error, Result};
use super::row::Row;
use super::schema::Schema;
use super::value::Value;

/// An immutable in-memory table: a schema plus rows in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    schema: Schema,
    rows: Vec<Row>,
}

impl Relation {
    /// Create an empty relation with the given schema
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Create a relation from rows, checking each against the schema
    pub fn from_rows(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let mut relation = Relation::new(schema);
        relation.rows.reserve(rows.len());
        for row in rows {
            relation.push_row(row)?;
        }
        Ok(relation)
    }

    /// Append a row, checking arity and value types against the schema
    ///
    /// A value conforms if it is NULL or its type equals the column's type.
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.len() {
            return Err(Error::RowArityMismatch {
                expected: self.schema.len(),
                got: row.len(),
            });
        }
        for (value, col) in row.iter().zip(self.schema.columns()) {
            if !value.is_null() && value.data_type() != col.data_type {
                return Err(Error::type_mismatch(
                    &col.name,
                    col.data_type,
                    value.data_type(),
                ));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    /// The relation's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The rows in arrival order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the relation has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a single value by row index and column name
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.schema.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Collect one column's values in arrival order
    pub fn column_values(&self, column: &str) -> Result<Vec<Value>> {
        let col = self.schema.require_index(column)?;
        Ok(self.rows.iter().map(|r| r[col].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DataType;

    fn test_schema() -> Schema {
        Schema::new(vec![("id", DataType::Integer), ("name", DataType::Text)]).unwrap()
    }

    #[test]
    fn test_push_conforming_rows() {
        let mut rel = Relation::new(test_schema());
        rel.push_row(Row::from_values(vec![Value::Integer(1), Value::text("a")]))
            .unwrap();
        rel.push_row(Row::from_values(vec![
            Value::Integer(2),
            Value::null(DataType::Text),
        ]))
        .unwrap();
        assert_eq!(rel.len(), 2);
        assert_eq!(rel.value(0, "name"), Some(&Value::text("a")));
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let mut rel = Relation::new(test_schema());
        let err = rel
            .push_row(Row::from_values(vec![Value::Integer(1)]))
            .unwrap_err();
        assert_eq!(err, Error::RowArityMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut rel = Relation::new(test_schema());
        let err = rel
            .push_row(Row::from_values(vec![Value::text("x"), Value::text("a")]))
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_column_values() {
        let rel = Relation::from_rows(
            test_schema(),
            vec![
                Row::from_values(vec![Value::Integer(1), Value::text("a")]),
                Row::from_values(vec![Value::Integer(2), Value::text("b")]),
            ],
        )
        .unwrap();
        assert_eq!(
            rel.column_values("id").unwrap(),
            vec![Value::Integer(1), Value::Integer(2)]
        );
        assert!(rel.column_values("missing").is_err());
    }
}
