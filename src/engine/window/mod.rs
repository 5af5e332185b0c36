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

//! Window Function Evaluation
//!
//! Computes one output value per input row for a window specification.
//!
//! Supports:
//! - ROW_NUMBER() - sequential numbering within each partition
//! - RANK() / DENSE_RANK() - tie-aware ranking with/without gaps
//! - LAG(col, offset, default) / LEAD(col, offset, default) - offset access
//! - SUM/COUNT/AVG/MIN/MAX over ROWS and RANGE frames
//!
//! The set of supported functions is a closed tagged-variant dispatch:
//! each variant carries its own argument payload and evaluation is an
//! exhaustive match. Partitions are independent and are evaluated in
//! parallel for large inputs, with results merged by original row index,
//! so output is identical to the sequential path.

mod aggregate;
mod offset;
mod ranking;

use log::debug;
use rayon::prelude::*;

use crate::core::{DataType, Error, Relation, Result, Value};
use crate::engine::arrange::{arrange, OrderColumns, Partition, SortKey};

pub(crate) use aggregate::value_axis_delta;

/// Row-count threshold above which partitions are evaluated in parallel
const PARALLEL_ROW_THRESHOLD: usize = 4096;

/// Aggregate function kinds usable over a window frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl AggregateKind {
    fn name(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "SUM",
            AggregateKind::Count => "COUNT",
            AggregateKind::Avg => "AVG",
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
        }
    }
}

/// A window function with its argument payload
#[derive(Debug, Clone)]
pub enum WindowFunc {
    /// Sequential 1..n numbering in arrangement order, never repeating
    RowNumber,
    /// Tie-aware ranking with gaps
    Rank,
    /// Tie-aware ranking without gaps
    DenseRank,
    /// Value from `offset` rows earlier in the partition
    Lag {
        column: String,
        offset: usize,
        default: Value,
    },
    /// Value from `offset` rows later in the partition
    Lead {
        column: String,
        offset: usize,
        default: Value,
    },
    /// Frame-bounded aggregate; `column: None` counts rows (COUNT only)
    Aggregate {
        kind: AggregateKind,
        column: Option<String>,
    },
}

impl WindowFunc {
    /// Function name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            WindowFunc::RowNumber => "ROW_NUMBER",
            WindowFunc::Rank => "RANK",
            WindowFunc::DenseRank => "DENSE_RANK",
            WindowFunc::Lag { .. } => "LAG",
            WindowFunc::Lead { .. } => "LEAD",
            WindowFunc::Aggregate { kind, .. } => kind.name(),
        }
    }

    /// Whether row order must be defined for this function to be
    /// deterministic
    fn requires_order(&self) -> bool {
        matches!(
            self,
            WindowFunc::RowNumber
                | WindowFunc::Rank
                | WindowFunc::DenseRank
                | WindowFunc::Lag { .. }
                | WindowFunc::Lead { .. }
        )
    }
}

/// Frame boundary unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUnit {
    /// Physical row offsets
    Rows,
    /// Ordering-value offsets (e.g. date intervals)
    Range,
}

/// One frame boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    /// Coarse position class used to validate start <= end
    fn position_class(&self) -> u8 {
        match self {
            FrameBound::UnboundedPreceding => 0,
            FrameBound::Preceding(_) => 1,
            FrameBound::CurrentRow => 2,
            FrameBound::Following(_) => 3,
            FrameBound::UnboundedFollowing => 4,
        }
    }
}

/// A window frame: unit plus start/end bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    pub unit: FrameUnit,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl FrameSpec {
    /// Check that the start bound does not lie after the end bound
    pub fn validate(&self) -> Result<()> {
        let start = self.start.position_class();
        let end = self.end.position_class();
        let ordered = match start.cmp(&end) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => match (&self.start, &self.end) {
                // Larger PRECEDING offsets lie earlier
                (FrameBound::Preceding(a), FrameBound::Preceding(b)) => a >= b,
                (FrameBound::Following(a), FrameBound::Following(b)) => a <= b,
                _ => true,
            },
        };
        if !ordered {
            return Err(Error::invalid_frame_spec(format!(
                "frame start {:?} lies after frame end {:?}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// A complete window specification: function, partitioning, ordering, frame
#[derive(Debug, Clone)]
pub struct WindowSpec {
    pub func: WindowFunc,
    pub partition_by: Vec<String>,
    pub order_by: Vec<SortKey>,
    pub frame: Option<FrameSpec>,
    /// Name of the computed output column
    pub output_column: String,
}

impl WindowSpec {
    /// Validate the spec against a relation's schema
    ///
    /// Returns the resolved argument column ordinal (if the function takes
    /// one) so evaluation does not re-resolve it.
    fn validate(&self, relation: &Relation) -> Result<Option<usize>> {
        if self.func.requires_order() && self.order_by.is_empty() {
            return Err(Error::missing_order_spec(self.func.name()));
        }

        if let Some(frame) = &self.frame {
            frame.validate()?;
            if !matches!(self.func, WindowFunc::Aggregate { .. }) {
                return Err(Error::invalid_frame_spec(format!(
                    "{} does not accept a frame",
                    self.func.name()
                )));
            }
            if frame.unit == FrameUnit::Range {
                if self.order_by.len() != 1 {
                    return Err(Error::invalid_frame_spec(
                        "RANGE frames require exactly one ordering column",
                    ));
                }
                let order_col = relation
                    .schema()
                    .column(&self.order_by[0].column)
                    .ok_or_else(|| Error::ColumnNotFound(self.order_by[0].column.clone()))?;
                if !order_col.data_type.has_distance() {
                    return Err(Error::invalid_frame_spec(format!(
                        "RANGE frames need a numeric or timestamp ordering column, got {}",
                        order_col.data_type
                    )));
                }
            }
        }

        match &self.func {
            WindowFunc::Lag { column, .. } | WindowFunc::Lead { column, .. } => {
                Ok(Some(relation.schema().require_index(column)?))
            }
            WindowFunc::Aggregate { kind, column } => match column {
                Some(column) => {
                    let idx = relation.schema().require_index(column)?;
                    let data_type = relation.schema().columns()[idx].data_type;
                    if matches!(kind, AggregateKind::Sum | AggregateKind::Avg)
                        && !data_type.is_numeric()
                        && data_type != DataType::Null
                    {
                        return Err(Error::invalid_argument(format!(
                            "{} requires a numeric column, '{}' is {}",
                            kind.name(),
                            column,
                            data_type
                        )));
                    }
                    Ok(Some(idx))
                }
                None => {
                    if *kind != AggregateKind::Count {
                        return Err(Error::invalid_argument(format!(
                            "{} requires an argument column",
                            kind.name()
                        )));
                    }
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    /// Data type of the computed column
    fn output_type(&self, relation: &Relation, arg_column: Option<usize>) -> DataType {
        match &self.func {
            WindowFunc::RowNumber | WindowFunc::Rank | WindowFunc::DenseRank => DataType::Integer,
            WindowFunc::Lag { .. } | WindowFunc::Lead { .. } => arg_column
                .map(|idx| relation.schema().columns()[idx].data_type)
                .unwrap_or(DataType::Null),
            WindowFunc::Aggregate { kind, .. } => {
                let column_type = arg_column
                    .map(|idx| relation.schema().columns()[idx].data_type)
                    .unwrap_or(DataType::Null);
                match kind {
                    AggregateKind::Count => DataType::Integer,
                    AggregateKind::Avg => DataType::Float,
                    AggregateKind::Sum | AggregateKind::Min | AggregateKind::Max => column_type,
                }
            }
        }
    }
}

/// Evaluate a window specification, returning one value per input row in
/// input order
pub fn evaluate_window(relation: &Relation, spec: &WindowSpec) -> Result<Vec<Value>> {
    let arg_column = spec.validate(relation)?;
    let partitions = arrange(relation, &spec.partition_by, &spec.order_by)?;
    let order = OrderColumns::resolve(relation, &spec.order_by)?;

    debug!(
        "window {}: {} rows, {} partitions",
        spec.func.name(),
        relation.len(),
        partitions.len()
    );

    let parallel = relation.len() >= PARALLEL_ROW_THRESHOLD && partitions.len() > 1;
    let per_partition: Vec<Vec<Value>> = if parallel {
        partitions
            .par_iter()
            .map(|p| evaluate_partition(relation, spec, arg_column, &order, p))
            .collect::<Result<Vec<_>>>()?
    } else {
        partitions
            .iter()
            .map(|p| evaluate_partition(relation, spec, arg_column, &order, p))
            .collect::<Result<Vec<_>>>()?
    };

    // Merge by original row index
    let mut results = vec![Value::null_unknown(); relation.len()];
    for (partition, values) in partitions.iter().zip(per_partition) {
        for (&row_index, value) in partition.row_indices.iter().zip(values) {
            results[row_index] = value;
        }
    }
    Ok(results)
}

/// Evaluate a window specification and append the computed column
pub fn arrange_and_evaluate_window(relation: &Relation, spec: &WindowSpec) -> Result<Relation> {
    let arg_column = spec.validate(relation)?;
    let values = evaluate_window(relation, spec)?;
    let schema = relation
        .schema()
        .with_column(&spec.output_column, spec.output_type(relation, arg_column))?;

    let rows = relation
        .rows()
        .iter()
        .zip(values)
        .map(|(row, value)| row.appended(value))
        .collect();
    Relation::from_rows(schema, rows)
}

/// Evaluate one partition, returning values in arrangement order
fn evaluate_partition(
    relation: &Relation,
    spec: &WindowSpec,
    arg_column: Option<usize>,
    order: &OrderColumns,
    partition: &Partition,
) -> Result<Vec<Value>> {
    match &spec.func {
        WindowFunc::RowNumber => Ok(ranking::row_numbers(partition.row_indices.len())),
        WindowFunc::Rank => Ok(ranking::ranks(&peer_group_starts(
            relation, order, partition,
        ))),
        WindowFunc::DenseRank => Ok(ranking::dense_ranks(&peer_group_starts(
            relation, order, partition,
        ))),
        WindowFunc::Lag {
            offset, default, ..
        } => {
            let values = partition_values(relation, arg_column, partition);
            Ok(offset::lag(&values, *offset, default))
        }
        WindowFunc::Lead {
            offset, default, ..
        } => {
            let values = partition_values(relation, arg_column, partition);
            Ok(offset::lead(&values, *offset, default))
        }
        WindowFunc::Aggregate { kind, .. } => {
            let column_type = match arg_column {
                Some(idx) => relation.schema().columns()[idx].data_type,
                None => DataType::Integer,
            };
            aggregate::evaluate_aggregate(
                relation,
                *kind,
                arg_column,
                column_type,
                spec.frame.as_ref(),
                order,
                partition,
            )
        }
    }
}

/// Per-position flags marking the start of a new peer group under the
/// order specification (position 0 always starts one)
fn peer_group_starts(
    relation: &Relation,
    order: &OrderColumns,
    partition: &Partition,
) -> Vec<bool> {
    partition
        .row_indices
        .iter()
        .enumerate()
        .map(|(pos, &row)| {
            pos == 0 || !order.rows_are_peers(relation, partition.row_indices[pos - 1], row)
        })
        .collect()
}

/// Project the argument column in arrangement order
fn partition_values(
    relation: &Relation,
    arg_column: Option<usize>,
    partition: &Partition,
) -> Vec<Value> {
    let rows = relation.rows();
    partition
        .row_indices
        .iter()
        .map(|&i| match arg_column {
            Some(c) => rows[i][c].clone(),
            None => Value::null_unknown(),
        })
        .collect()
}
