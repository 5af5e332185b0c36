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

//! ROW_NUMBER, RANK, and DENSE_RANK over a sorted partition
//!
//! All three are computed in one pass over the arrangement order. Peer
//! groups (rows with equal order-key values) are precomputed by the caller
//! as a `new_group` flag per position: true where a row starts a new group.

use crate::core::Value;

/// ROW_NUMBER: strictly increasing 1..n in arrangement order
pub(crate) fn row_numbers(len: usize) -> Vec<Value> {
    (1..=len as i64).map(Value::Integer).collect()
}

/// RANK: equal keys share a rank; the next distinct key's rank is the
/// previous rank plus the number of tied rows (gaps allowed)
pub(crate) fn ranks(new_group: &[bool]) -> Vec<Value> {
    let mut out = Vec::with_capacity(new_group.len());
    let mut current = 1i64;
    for (i, &starts) in new_group.iter().enumerate() {
        if starts {
            current = i as i64 + 1;
        }
        out.push(Value::Integer(current));
    }
    out
}

/// DENSE_RANK: equal keys share a rank; the next distinct key's rank is the
/// previous rank plus one (no gaps)
pub(crate) fn dense_ranks(new_group: &[bool]) -> Vec<Value> {
    let mut out = Vec::with_capacity(new_group.len());
    let mut current = 0i64;
    for &starts in new_group {
        if starts {
            current += 1;
        }
        out.push(Value::Integer(current));
    }
    out
}
