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

//! Query evaluation engine
//!
//! The evaluation layers build on each other: [`arrange`] partitions and
//! sorts rows, [`window`] evaluates window functions over the arrangement,
//! [`streaks`] composes window primitives into streak grouping, and
//! [`recursive`] resolves recursive expansion by iterative fixed point.

pub mod arrange;
pub mod recursive;
pub mod streaks;
pub mod window;

pub use arrange::{arrange, NullOrder, Partition, PartitionKeyValue, SortDirection, SortKey};
pub use recursive::{resolve_recursive, KeyJoinMember, RecursiveMember, RecursiveSpec};
pub use streaks::{
    group_streaks, summarize_streaks, GapBoundary, RowPredicate, StreakRule, GROUP_ID_COLUMN,
};
pub use window::{
    arrange_and_evaluate_window, evaluate_window, AggregateKind, FrameBound, FrameSpec, FrameUnit,
    WindowFunc, WindowSpec,
};
