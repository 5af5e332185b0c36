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

//! Streak and gap grouping
//!
//! Derives contiguous or gap-tolerant group identifiers, composed entirely
//! from the window evaluator:
//!
//! - contiguous runs: `ROW_NUMBER() - ROW_NUMBER()` restricted to rows
//!   satisfying a qualifying condition, constant within each maximal run;
//! - gap-tolerant streaks: a per-row start flag (gap beyond tolerance, or
//!   no previous row) summed with a running ROWS frame.
//!
//! Post-grouping aggregation (streak length and boundary values) is a plain
//! group-by over the computed column.

use rustc_hash::FxHashMap;

use crate::core::{DataType, Error, Relation, Result, Row, Schema, Value};
use crate::engine::arrange::SortKey;
use crate::engine::window::{
    evaluate_window, value_axis_delta, AggregateKind, FrameBound, FrameSpec, FrameUnit,
    WindowFunc, WindowSpec,
};

/// Name of the computed group column
pub const GROUP_ID_COLUMN: &str = "group_id";

/// Internal column holding the per-row group-start flag
const STREAK_START_COLUMN: &str = "__streak_start";

/// Row predicate deciding streak membership
pub type RowPredicate = Box<dyn Fn(&Schema, &Row) -> Result<bool> + Send + Sync>;

/// Whether a gap exactly equal to the tolerance starts a new group
///
/// The source material is inconsistent on this boundary, so it is an
/// explicit configuration rather than an assumption: `Exclusive` starts a
/// new group only when the gap is strictly greater than the tolerance,
/// `Inclusive` already when it reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapBoundary {
    Inclusive,
    Exclusive,
}

/// How rows are grouped into streaks
pub enum StreakRule {
    /// Maximal runs of consecutive rows satisfying the predicate; rows
    /// failing it get a NULL group id
    Qualifying(RowPredicate),
    /// Gap-tolerant grouping over an ordering column: a new group starts
    /// where the gap from the previous row exceeds the tolerance
    ///
    /// Gaps are measured in the column's units: numeric difference for
    /// numeric columns, whole days for timestamps.
    Gap {
        column: String,
        tolerance: f64,
        boundary: GapBoundary,
    },
}

/// Group rows into streaks, appending an integer `group_id` column
///
/// Group ids are constant within one streak and distinct between streaks of
/// the same partition; they are not globally unique across partitions.
pub fn group_streaks(
    relation: &Relation,
    partition_by: &[String],
    order_by: &[SortKey],
    rule: &StreakRule,
) -> Result<Relation> {
    let group_ids = match rule {
        StreakRule::Qualifying(predicate) => {
            qualifying_group_ids(relation, partition_by, order_by, predicate)?
        }
        StreakRule::Gap {
            column,
            tolerance,
            boundary,
        } => gap_group_ids(relation, partition_by, order_by, column, *tolerance, *boundary)?,
    };

    let schema = relation
        .schema()
        .with_column(GROUP_ID_COLUMN, DataType::Integer)?;
    let rows = relation
        .rows()
        .iter()
        .zip(group_ids)
        .map(|(row, id)| row.appended(id))
        .collect();
    Relation::from_rows(schema, rows)
}

/// Contiguous-run grouping: ROW_NUMBER over all rows minus ROW_NUMBER over
/// qualifying rows only
fn qualifying_group_ids(
    relation: &Relation,
    partition_by: &[String],
    order_by: &[SortKey],
    predicate: &RowPredicate,
) -> Result<Vec<Value>> {
    let rn_all = evaluate_window(
        relation,
        &WindowSpec {
            func: WindowFunc::RowNumber,
            partition_by: partition_by.to_vec(),
            order_by: order_by.to_vec(),
            frame: None,
            output_column: "rn".to_string(),
        },
    )?;

    let mut qualifies = Vec::with_capacity(relation.len());
    for row in relation.rows() {
        qualifies.push(predicate(relation.schema(), row)?);
    }

    // Row numbers among qualifying rows only, computed on the filtered
    // sub-relation (same schema, arrival order preserved) and scattered
    // back by original index
    let qualifying_rows: Vec<Row> = relation
        .rows()
        .iter()
        .zip(&qualifies)
        .filter(|(_, &q)| q)
        .map(|(row, _)| row.clone())
        .collect();
    let sub = Relation::from_rows(relation.schema().clone(), qualifying_rows)?;
    let rn_qualifying = evaluate_window(
        &sub,
        &WindowSpec {
            func: WindowFunc::RowNumber,
            partition_by: partition_by.to_vec(),
            order_by: order_by.to_vec(),
            frame: None,
            output_column: "rn".to_string(),
        },
    )?;

    let mut sub_pos = 0usize;
    let mut out = Vec::with_capacity(relation.len());
    for (i, &q) in qualifies.iter().enumerate() {
        if q {
            let all = rn_all[i].as_int64().unwrap_or(0);
            let qual = rn_qualifying[sub_pos].as_int64().unwrap_or(0);
            sub_pos += 1;
            out.push(Value::Integer(all - qual));
        } else {
            out.push(Value::null(DataType::Integer));
        }
    }
    Ok(out)
}

/// Gap-tolerant grouping: LAG to find the previous value, a start flag per
/// row, then a running sum of start flags
fn gap_group_ids(
    relation: &Relation,
    partition_by: &[String],
    order_by: &[SortKey],
    column: &str,
    tolerance: f64,
    boundary: GapBoundary,
) -> Result<Vec<Value>> {
    let col = relation.schema().require_index(column)?;
    let data_type = relation.schema().columns()[col].data_type;
    if !data_type.has_distance() {
        return Err(Error::invalid_argument(format!(
            "gap grouping needs a numeric or timestamp column, '{}' is {}",
            column, data_type
        )));
    }

    let previous = evaluate_window(
        relation,
        &WindowSpec {
            func: WindowFunc::Lag {
                column: column.to_string(),
                offset: 1,
                default: Value::null(data_type),
            },
            partition_by: partition_by.to_vec(),
            order_by: order_by.to_vec(),
            frame: None,
            output_column: "prev".to_string(),
        },
    )?;

    let starts: Vec<Value> = relation
        .rows()
        .iter()
        .zip(&previous)
        .map(|(row, prev)| {
            let current = &row[col];
            let starts_new = if current.is_null() || prev.is_null() {
                true
            } else {
                match value_axis_delta(current, prev) {
                    Some(delta) => {
                        let gap = delta.abs();
                        match boundary {
                            GapBoundary::Exclusive => gap > tolerance,
                            GapBoundary::Inclusive => gap >= tolerance,
                        }
                    }
                    None => true,
                }
            };
            Value::Integer(if starts_new { 1 } else { 0 })
        })
        .collect();

    // Running count of resets over the partition so far
    let flagged = append_column(relation, STREAK_START_COLUMN, DataType::Integer, starts)?;
    evaluate_window(
        &flagged,
        &WindowSpec {
            func: WindowFunc::Aggregate {
                kind: AggregateKind::Sum,
                column: Some(STREAK_START_COLUMN.to_string()),
            },
            partition_by: partition_by.to_vec(),
            order_by: order_by.to_vec(),
            frame: Some(FrameSpec {
                unit: FrameUnit::Rows,
                start: FrameBound::UnboundedPreceding,
                end: FrameBound::CurrentRow,
            }),
            output_column: GROUP_ID_COLUMN.to_string(),
        },
    )
}

fn append_column(
    relation: &Relation,
    name: &str,
    data_type: DataType,
    values: Vec<Value>,
) -> Result<Relation> {
    let schema = relation.schema().with_column(name, data_type)?;
    let rows = relation
        .rows()
        .iter()
        .zip(values)
        .map(|(row, value)| row.appended(value))
        .collect();
    Relation::from_rows(schema, rows)
}

/// Summarize streaks: one output row per group value in first-appearance
/// order, with the streak length and the minimum and maximum of a value
/// column (typically the ordering column, giving boundary values)
///
/// Rows with a NULL group value are skipped. Groups are identified by the
/// group column's value alone; partitioned inputs should summarize per
/// partition or include the partition key in the group identity.
pub fn summarize_streaks(
    relation: &Relation,
    group_column: &str,
    value_column: &str,
) -> Result<Relation> {
    let group_col = relation.schema().require_index(group_column)?;
    let value_col = relation.schema().require_index(value_column)?;
    let group_type = relation.schema().columns()[group_col].data_type;
    let value_type = relation.schema().columns()[value_col].data_type;

    struct GroupState {
        key: Value,
        length: i64,
        min: Value,
        max: Value,
    }

    let mut order: Vec<GroupState> = Vec::new();
    let mut by_key: FxHashMap<Value, usize> = FxHashMap::default();

    for row in relation.rows() {
        let key = &row[group_col];
        if key.is_null() {
            continue;
        }
        let value = &row[value_col];
        let slot = match by_key.get(key) {
            Some(&slot) => slot,
            None => {
                by_key.insert(key.clone(), order.len());
                order.push(GroupState {
                    key: key.clone(),
                    length: 0,
                    min: Value::null(value_type),
                    max: Value::null(value_type),
                });
                order.len() - 1
            }
        };
        let state = &mut order[slot];
        state.length += 1;
        if !value.is_null() {
            if state.min.is_null() || value.cmp_total(&state.min) == std::cmp::Ordering::Less {
                state.min = value.clone();
            }
            if state.max.is_null() || value.cmp_total(&state.max) == std::cmp::Ordering::Greater {
                state.max = value.clone();
            }
        }
    }

    let schema = Schema::new(vec![
        (group_column.to_string(), group_type),
        ("length".to_string(), DataType::Integer),
        ("min".to_string(), value_type),
        ("max".to_string(), value_type),
    ])?;
    let rows = order
        .into_iter()
        .map(|state| {
            Row::from_values(vec![
                state.key,
                Value::Integer(state.length),
                state.min,
                state.max,
            ])
        })
        .collect();
    Relation::from_rows(schema, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Schema;

    fn date_relation(days: &[u32]) -> Relation {
        let schema = Schema::new(vec![("day", DataType::Timestamp)]).unwrap();
        Relation::from_rows(
            schema,
            days.iter()
                .map(|&d| Row::from_values(vec![Value::date(2024, 1, d)]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_gap_grouping_over_dates() {
        // Days 1,2,3 then a gap, then 5,6: two streaks
        let rel = date_relation(&[1, 2, 3, 5, 6]);
        let grouped = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("day")],
            &StreakRule::Gap {
                column: "day".to_string(),
                tolerance: 1.0,
                boundary: GapBoundary::Exclusive,
            },
        )
        .unwrap();
        let ids: Vec<i64> = grouped
            .rows()
            .iter()
            .map(|r| r[1].as_int64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 1, 1, 2, 2]);
    }

    #[test]
    fn test_gap_boundary_inclusive_vs_exclusive() {
        let schema = Schema::new(vec![("v", DataType::Integer)]).unwrap();
        let rel = Relation::from_rows(
            schema,
            [0i64, 2, 4].iter().map(|&v| Row::from_values(vec![Value::Integer(v)])).collect(),
        )
        .unwrap();

        // Gaps are exactly 2; exclusive tolerance 2 keeps one streak
        let exclusive = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("v")],
            &StreakRule::Gap {
                column: "v".to_string(),
                tolerance: 2.0,
                boundary: GapBoundary::Exclusive,
            },
        )
        .unwrap();
        let ids: Vec<i64> = exclusive
            .rows()
            .iter()
            .map(|r| r[1].as_int64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 1, 1]);

        // Inclusive tolerance 2 splits at every gap
        let inclusive = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("v")],
            &StreakRule::Gap {
                column: "v".to_string(),
                tolerance: 2.0,
                boundary: GapBoundary::Inclusive,
            },
        )
        .unwrap();
        let ids: Vec<i64> = inclusive
            .rows()
            .iter()
            .map(|r| r[1].as_int64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_qualifying_runs() {
        let schema = Schema::new(vec![
            ("pos", DataType::Integer),
            ("won", DataType::Boolean),
        ])
        .unwrap();
        let rel = Relation::from_rows(
            schema,
            [true, true, false, true, true, true]
                .iter()
                .enumerate()
                .map(|(i, &w)| {
                    Row::from_values(vec![Value::Integer(i as i64), Value::Boolean(w)])
                })
                .collect(),
        )
        .unwrap();

        let grouped = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("pos")],
            &StreakRule::Qualifying(Box::new(|schema, row| {
                let idx = schema.require_index("won")?;
                Ok(row[idx].as_boolean().unwrap_or(false))
            })),
        )
        .unwrap();

        let ids: Vec<Option<i64>> = grouped
            .rows()
            .iter()
            .map(|r| r[2].as_int64())
            .collect();
        // Two winning runs with a constant id each, the loss row unassigned
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], None);
        assert_eq!(ids[3], ids[4]);
        assert_eq!(ids[4], ids[5]);
        assert_ne!(ids[0], ids[3]);
    }

    #[test]
    fn test_summarize_streaks() {
        let rel = date_relation(&[1, 2, 3, 5, 6]);
        let grouped = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("day")],
            &StreakRule::Gap {
                column: "day".to_string(),
                tolerance: 1.0,
                boundary: GapBoundary::Exclusive,
            },
        )
        .unwrap();
        let summary = summarize_streaks(&grouped, GROUP_ID_COLUMN, "day").unwrap();
        assert_eq!(summary.len(), 2);

        let lengths: Vec<i64> = summary
            .rows()
            .iter()
            .map(|r| r[1].as_int64().unwrap())
            .collect();
        assert_eq!(lengths, vec![3, 2]);
        assert_eq!(summary.rows()[0][2], Value::date(2024, 1, 1));
        assert_eq!(summary.rows()[0][3], Value::date(2024, 1, 3));
        assert_eq!(summary.rows()[1][2], Value::date(2024, 1, 5));
        assert_eq!(summary.rows()[1][3], Value::date(2024, 1, 6));
    }

    #[test]
    fn test_gap_grouping_rejects_text_column() {
        let schema = Schema::new(vec![("name", DataType::Text)]).unwrap();
        let rel = Relation::from_rows(
            schema,
            vec![Row::from_values(vec![Value::text("a")])],
        )
        .unwrap();
        let err = group_streaks(
            &rel,
            &[],
            &[SortKey::asc("name")],
            &StreakRule::Gap {
                column: "name".to_string(),
                tolerance: 1.0,
                boundary: GapBoundary::Exclusive,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
