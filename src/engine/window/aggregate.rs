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

//! Frame-bounded aggregation (SUM, COUNT, AVG, MIN, MAX)
//!
//! ROWS frames slide row-by-row, so both frame edges advance monotonically
//! and the aggregate is maintained incrementally: a running sum/count for
//! SUM/COUNT/AVG and a monotonic deque for MIN/MAX, giving linear total
//! cost per partition. RANGE frames are value-based; their bounds are
//! recomputed per row from the ordering column, with CURRENT ROW bounds
//! extending over the current row's peers.

use std::cmp::Ordering;
use std::collections::VecDeque;

use crate::core::{DataType, Relation, Result, Row, Value};
use crate::engine::arrange::{OrderColumns, Partition, SortDirection};

use super::{AggregateKind, FrameBound, FrameSpec, FrameUnit};

/// Signed distance between two values along the ordering axis
///
/// Numeric values measure by numeric difference; timestamps by whole days
/// (the ordering granularity used for date-interval frames and gap
/// tolerances). Returns None when no distance is defined.
pub(crate) fn value_axis_delta(a: &Value, b: &Value) -> Option<f64> {
    match (a, b) {
        (Value::Timestamp(ta), Value::Timestamp(tb)) => {
            Some(ta.signed_duration_since(*tb).num_days() as f64)
        }
        _ => {
            let fa = a.as_float64()?;
            let fb = b.as_float64()?;
            Some(fa - fb)
        }
    }
}

/// Running sum/count state for incremental SUM/COUNT/AVG
///
/// Integer and float contributions are tracked separately so that a pure
/// integer window yields an integer SUM.
#[derive(Debug, Default)]
struct NumericAccumulator {
    int_sum: i64,
    float_sum: f64,
    float_count: i64,
    non_null: i64,
    frame_rows: i64,
}

impl NumericAccumulator {
    fn add(&mut self, value: Option<&Value>) {
        self.frame_rows += 1;
        match value {
            Some(Value::Integer(v)) => {
                self.int_sum += v;
                self.non_null += 1;
            }
            Some(Value::Float(v)) => {
                self.float_sum += v;
                self.float_count += 1;
                self.non_null += 1;
            }
            Some(v) if !v.is_null() => {
                self.non_null += 1;
            }
            _ => {}
        }
    }

    fn remove(&mut self, value: Option<&Value>) {
        self.frame_rows -= 1;
        match value {
            Some(Value::Integer(v)) => {
                self.int_sum -= v;
                self.non_null -= 1;
            }
            Some(Value::Float(v)) => {
                self.float_sum -= v;
                self.float_count -= 1;
                self.non_null -= 1;
            }
            Some(v) if !v.is_null() => {
                self.non_null -= 1;
            }
            _ => {}
        }
    }

    fn sum(&self, column_type: DataType) -> Value {
        if self.non_null == 0 {
            return Value::null(column_type);
        }
        if self.float_count > 0 || column_type == DataType::Float {
            Value::Float(self.int_sum as f64 + self.float_sum)
        } else {
            Value::Integer(self.int_sum)
        }
    }

    fn avg(&self) -> Value {
        if self.non_null == 0 {
            return Value::null(DataType::Float);
        }
        Value::Float((self.int_sum as f64 + self.float_sum) / self.non_null as f64)
    }

    fn count(&self, counts_rows: bool) -> Value {
        if counts_rows {
            Value::Integer(self.frame_rows)
        } else {
            Value::Integer(self.non_null)
        }
    }
}

/// Frame bounds in row positions for one current row, end exclusive
fn rows_frame_bounds(
    frame: Option<&FrameSpec>,
    has_order: bool,
    current: usize,
    len: usize,
) -> (usize, usize) {
    let Some(frame) = frame else {
        // SQL default: full partition without ordering, otherwise
        // unbounded preceding through current row
        return if has_order { (0, current + 1) } else { (0, len) };
    };

    let start = match frame.start {
        FrameBound::UnboundedPreceding => 0,
        FrameBound::Preceding(n) => current.saturating_sub(n as usize),
        FrameBound::CurrentRow => current,
        FrameBound::Following(n) => (current + n as usize).min(len),
        FrameBound::UnboundedFollowing => len,
    };
    let end = match frame.end {
        FrameBound::UnboundedPreceding => 0,
        FrameBound::Preceding(n) => {
            if (n as usize) <= current {
                current - n as usize + 1
            } else {
                0
            }
        }
        FrameBound::CurrentRow => current + 1,
        FrameBound::Following(n) => (current + n as usize + 1).min(len),
        FrameBound::UnboundedFollowing => len,
    };
    // An out-of-range pairing (e.g. 3 PRECEDING .. 2 PRECEDING near the
    // partition start) collapses to an empty frame
    if start > end {
        (start, start)
    } else {
        (start, end)
    }
}

/// Lower-bound test for RANGE frames, `offset` measured along the sort axis
fn within_lower(offset: f64, bound: &FrameBound) -> bool {
    match bound {
        FrameBound::UnboundedPreceding => true,
        FrameBound::Preceding(n) => offset >= -(*n as f64),
        FrameBound::CurrentRow => offset >= 0.0,
        FrameBound::Following(n) => offset >= *n as f64,
        FrameBound::UnboundedFollowing => false,
    }
}

/// Upper-bound test for RANGE frames
fn within_upper(offset: f64, bound: &FrameBound) -> bool {
    match bound {
        FrameBound::UnboundedPreceding => false,
        FrameBound::Preceding(n) => offset <= -(*n as f64),
        FrameBound::CurrentRow => offset <= 0.0,
        FrameBound::Following(n) => offset <= *n as f64,
        FrameBound::UnboundedFollowing => true,
    }
}

/// Evaluate one aggregate window function over one partition
///
/// Returns one value per partition position, in arrangement order.
pub(crate) fn evaluate_aggregate(
    relation: &Relation,
    kind: AggregateKind,
    column: Option<usize>,
    column_type: DataType,
    frame: Option<&FrameSpec>,
    order: &OrderColumns,
    partition: &Partition,
) -> Result<Vec<Value>> {
    let rows = relation.rows();
    let indices = &partition.row_indices;
    let value_at = |pos: usize| -> Option<&Value> { column.map(|c| &rows[indices[pos]][c]) };

    let unit = frame.map(|f| f.unit).unwrap_or(FrameUnit::Rows);
    match unit {
        FrameUnit::Rows => {
            let has_order = !order.keys.is_empty();
            let bounds = |i: usize| rows_frame_bounds(frame, has_order, i, indices.len());
            match kind {
                AggregateKind::Min => Ok(sliding_extreme(indices.len(), value_at, bounds, true)),
                AggregateKind::Max => Ok(sliding_extreme(indices.len(), value_at, bounds, false)),
                _ => Ok(sliding_numeric(
                    kind,
                    column_type,
                    column.is_none(),
                    indices.len(),
                    value_at,
                    bounds,
                )),
            }
        }
        FrameUnit::Range => {
            let frame = frame.expect("range unit implies an explicit frame");
            range_aggregate(rows, indices, kind, column, column_type, frame, order)
        }
    }
}

/// Incremental SUM/COUNT/AVG over monotonically advancing ROWS bounds
fn sliding_numeric<'a>(
    kind: AggregateKind,
    column_type: DataType,
    counts_rows: bool,
    len: usize,
    value_at: impl Fn(usize) -> Option<&'a Value>,
    bounds: impl Fn(usize) -> (usize, usize),
) -> Vec<Value> {
    let mut acc = NumericAccumulator::default();
    let mut cur_start = 0usize;
    let mut cur_end = 0usize;
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let (start, end) = bounds(i);
        while cur_end < end {
            acc.add(value_at(cur_end));
            cur_end += 1;
        }
        while cur_start < start {
            acc.remove(value_at(cur_start));
            cur_start += 1;
        }
        out.push(match kind {
            AggregateKind::Sum => acc.sum(column_type),
            AggregateKind::Avg => acc.avg(),
            AggregateKind::Count => acc.count(counts_rows),
            AggregateKind::Min | AggregateKind::Max => unreachable!("handled by sliding_extreme"),
        });
    }
    out
}

/// Incremental MIN/MAX via a monotonic deque of candidate positions
///
/// The deque holds positions of non-null values in increasing order whose
/// values are strictly improving toward the front; the front is always the
/// current extreme of the window.
fn sliding_extreme<'a>(
    len: usize,
    value_at: impl Fn(usize) -> Option<&'a Value>,
    bounds: impl Fn(usize) -> (usize, usize),
    want_min: bool,
) -> Vec<Value> {
    let mut deque: VecDeque<usize> = VecDeque::new();
    let mut cur_start = 0usize;
    let mut cur_end = 0usize;
    let mut out = Vec::with_capacity(len);

    let keeps_front = |front: &Value, incoming: &Value| -> bool {
        let cmp = front.cmp_total(incoming);
        if want_min {
            cmp == Ordering::Less
        } else {
            cmp == Ordering::Greater
        }
    };

    for i in 0..len {
        let (start, end) = bounds(i);
        while cur_end < end {
            if let Some(v) = value_at(cur_end) {
                if !v.is_null() {
                    while let Some(&back) = deque.back() {
                        let back_value = value_at(back).expect("position was enqueued");
                        if keeps_front(back_value, v) {
                            break;
                        }
                        deque.pop_back();
                    }
                    deque.push_back(cur_end);
                }
            }
            cur_end += 1;
        }
        cur_start = cur_start.max(start);
        while let Some(&front) = deque.front() {
            if front >= cur_start {
                break;
            }
            deque.pop_front();
        }
        out.push(match deque.front() {
            Some(&front) => value_at(front).expect("position was enqueued").clone(),
            None => Value::null_unknown(),
        });
    }
    out
}

/// RANGE frames: bounds recomputed per row from the ordering column's value
fn range_aggregate(
    rows: &[Row],
    indices: &[usize],
    kind: AggregateKind,
    column: Option<usize>,
    column_type: DataType,
    frame: &FrameSpec,
    order: &OrderColumns,
) -> Result<Vec<Value>> {
    // Validated upstream: RANGE frames carry exactly one ordering key
    let (order_col, direction, _) = order.keys[0];
    let sign = match direction {
        SortDirection::Ascending => 1.0,
        SortDirection::Descending => -1.0,
    };

    let len = indices.len();
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let current = &rows[indices[i]][order_col];
        let mut acc = NumericAccumulator::default();
        let mut extreme: Option<Value> = None;

        for j in 0..len {
            let candidate = &rows[indices[j]][order_col];
            // Rows with NULL ordering values are peers of each other and
            // frame only with those peers
            let offset = match (current.is_null(), candidate.is_null()) {
                (true, true) => 0.0,
                (false, false) => match value_axis_delta(candidate, current) {
                    Some(delta) => sign * delta,
                    None => continue,
                },
                _ => continue,
            };
            if !within_lower(offset, &frame.start) || !within_upper(offset, &frame.end) {
                continue;
            }

            let value = column.map(|c| &rows[indices[j]][c]);
            acc.add(value);
            if let Some(v) = value {
                if !v.is_null() {
                    let better = match &extreme {
                        None => true,
                        Some(best) => {
                            let cmp = v.cmp_total(best);
                            match kind {
                                AggregateKind::Min => cmp == Ordering::Less,
                                AggregateKind::Max => cmp == Ordering::Greater,
                                _ => false,
                            }
                        }
                    };
                    if better {
                        extreme = Some(v.clone());
                    }
                }
            }
        }

        out.push(match kind {
            AggregateKind::Sum => acc.sum(column_type),
            AggregateKind::Avg => acc.avg(),
            AggregateKind::Count => acc.count(column.is_none()),
            AggregateKind::Min | AggregateKind::Max => {
                extreme.unwrap_or_else(|| Value::null(column_type))
            }
        });
    }
    Ok(out)
}
