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

//! # Windrow
//!
//! An embeddable query evaluation core for in-memory relations, providing
//! the analytical machinery that usually lives deep inside a SQL engine:
//!
//! - **Partition & sort**: stable arrangement of rows into partitions with
//!   explicit null ordering ([`arrange`])
//! - **Window functions**: ROW_NUMBER, RANK, DENSE_RANK, LAG/LEAD, and
//!   framed aggregates with incremental sliding evaluation
//!   ([`evaluate_window`])
//! - **Streak grouping**: contiguous-run and gap-tolerant group derivation
//!   composed from window primitives ([`group_streaks`])
//! - **Recursive resolution**: iterative fixed-point expansion with depth
//!   caps and per-path cycle avoidance ([`resolve_recursive`])
//!
//! ## Example
//!
//! ```
//! use windrow::{
//!     evaluate_window, DataType, Relation, Row, Schema, SortKey, Value,
//!     WindowFunc, WindowSpec,
//! };
//!
//! let schema = Schema::new(vec![("score", DataType::Integer)])?;
//! let relation = Relation::from_rows(
//!     schema,
//!     vec![
//!         Row::from_values(vec![Value::Integer(10)]),
//!         Row::from_values(vec![Value::Integer(10)]),
//!         Row::from_values(vec![Value::Integer(5)]),
//!     ],
//! )?;
//!
//! let ranks = evaluate_window(
//!     &relation,
//!     &WindowSpec {
//!         func: WindowFunc::Rank,
//!         partition_by: vec![],
//!         order_by: vec![SortKey::desc("score")],
//!         frame: None,
//!         output_column: "rank".to_string(),
//!     },
//! )?;
//! assert_eq!(
//!     ranks,
//!     vec![Value::Integer(1), Value::Integer(1), Value::Integer(3)]
//! );
//! # Ok::<(), windrow::Error>(())
//! ```

pub mod core;
pub mod engine;

pub use crate::core::{DataType, Error, Relation, Result, Row, Schema, SchemaColumn, Value};
pub use crate::engine::{
    arrange, arrange_and_evaluate_window, evaluate_window, group_streaks, resolve_recursive,
    summarize_streaks, AggregateKind, FrameBound, FrameSpec, FrameUnit, GapBoundary,
    KeyJoinMember, NullOrder, Partition, PartitionKeyValue, RecursiveMember, RecursiveSpec,
    RowPredicate, SortDirection, SortKey, StreakRule, WindowFunc, WindowSpec, GROUP_ID_COLUMN,
};
