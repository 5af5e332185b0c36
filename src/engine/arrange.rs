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

//! Partition & Sort Engine
//!
//! Splits a relation into partitions keyed by column values and stable-sorts
//! each partition under an order specification. Determinism matters here:
//! ROW_NUMBER, LAG/LEAD, and frame boundaries are all defined in terms of a
//! specific row order, so ties must resolve identically on every call given
//! the same arrival order. Null placement is explicit per sort key rather
//! than implementation-defined.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::core::{Relation, Result, Value};

/// Partition key values - stack-allocated for the common case (up to 4 columns)
pub type PartitionKeyValue = SmallVec<[Value; 4]>;

/// Sort direction for one order key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Explicit null placement for one order key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    NullsFirst,
    NullsLast,
}

/// One entry of an order specification: column, direction, null placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: SortDirection,
    pub nulls: NullOrder,
}

impl SortKey {
    /// Ascending sort with nulls last
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
            nulls: NullOrder::NullsLast,
        }
    }

    /// Descending sort with nulls last
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
            nulls: NullOrder::NullsLast,
        }
    }

    /// Override the null placement
    pub fn with_nulls(mut self, nulls: NullOrder) -> Self {
        self.nulls = nulls;
        self
    }
}

/// One partition: its key values and row indices into the input relation,
/// sorted by the order specification
#[derive(Debug, Clone)]
pub struct Partition {
    /// The partition key values, one per partition column
    pub key: PartitionKeyValue,
    /// Indices into the input relation's rows, in arrangement order
    pub row_indices: Vec<usize>,
}

/// Resolved column ordinals for an order specification
#[derive(Debug, Clone)]
pub(crate) struct OrderColumns {
    pub(crate) keys: Vec<(usize, SortDirection, NullOrder)>,
}

impl OrderColumns {
    pub(crate) fn resolve(relation: &Relation, order_by: &[SortKey]) -> Result<Self> {
        let keys = order_by
            .iter()
            .map(|key| {
                relation
                    .schema()
                    .require_index(&key.column)
                    .map(|idx| (idx, key.direction, key.nulls))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keys })
    }

    /// Compare two rows under the order specification
    ///
    /// Null placement applies independently of direction; non-null values
    /// compare under the total value ordering, reversed for descending keys.
    pub(crate) fn compare_rows(&self, relation: &Relation, a: usize, b: usize) -> Ordering {
        let rows = relation.rows();
        for &(col, direction, nulls) in &self.keys {
            let va = &rows[a][col];
            let vb = &rows[b][col];
            let cmp = match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => match nulls {
                    NullOrder::NullsFirst => Ordering::Less,
                    NullOrder::NullsLast => Ordering::Greater,
                },
                (false, true) => match nulls {
                    NullOrder::NullsFirst => Ordering::Greater,
                    NullOrder::NullsLast => Ordering::Less,
                },
                (false, false) => {
                    let cmp = va.cmp_total(vb);
                    match direction {
                        SortDirection::Ascending => cmp,
                        SortDirection::Descending => cmp.reverse(),
                    }
                }
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }

    /// Returns true if two rows have equal order-key values (peers)
    pub(crate) fn rows_are_peers(&self, relation: &Relation, a: usize, b: usize) -> bool {
        let rows = relation.rows();
        self.keys.iter().all(|&(col, _, _)| {
            let va = &rows[a][col];
            let vb = &rows[b][col];
            if va.is_null() || vb.is_null() {
                va.is_null() && vb.is_null()
            } else {
                va.cmp_total(vb) == Ordering::Equal
            }
        })
    }
}

/// Split a relation into partitions and stable-sort each one
///
/// Partitions are returned in first-appearance order of their key values;
/// an empty partition key yields a single global partition. The output is a
/// pure reordering: every input row index appears in exactly one partition.
pub fn arrange(
    relation: &Relation,
    partition_by: &[String],
    order_by: &[SortKey],
) -> Result<Vec<Partition>> {
    let partition_cols = partition_by
        .iter()
        .map(|name| relation.schema().require_index(name))
        .collect::<Result<Vec<_>>>()?;
    let order_cols = OrderColumns::resolve(relation, order_by)?;

    let mut partitions: Vec<Partition> = Vec::new();

    if partition_cols.is_empty() {
        // One global partition
        partitions.push(Partition {
            key: SmallVec::new(),
            row_indices: (0..relation.len()).collect(),
        });
    } else {
        let mut by_key: FxHashMap<PartitionKeyValue, usize> = FxHashMap::default();
        for (i, row) in relation.rows().iter().enumerate() {
            let mut key: PartitionKeyValue = SmallVec::with_capacity(partition_cols.len());
            for &col in &partition_cols {
                key.push(row[col].clone());
            }
            match by_key.get(&key) {
                Some(&slot) => partitions[slot].row_indices.push(i),
                None => {
                    by_key.insert(key.clone(), partitions.len());
                    partitions.push(Partition {
                        key,
                        row_indices: vec![i],
                    });
                }
            }
        }
    }

    if !order_cols.keys.is_empty() {
        for partition in &mut partitions {
            // Stable: rows comparing equal keep their arrival order
            partition
                .row_indices
                .sort_by(|&a, &b| order_cols.compare_rows(relation, a, b));
        }
    }

    Ok(partitions)
}
