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

//! LAG and LEAD offset access within a sorted partition

use crate::core::Value;

/// LAG: the value `offset` positions before the current row in arrangement
/// order, or the default when the offset falls outside the partition
pub(crate) fn lag(values: &[Value], offset: usize, default: &Value) -> Vec<Value> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i >= offset {
                values[i - offset].clone()
            } else {
                default.clone()
            }
        })
        .collect()
}

/// LEAD: the value `offset` positions after the current row in arrangement
/// order, or the default when the offset falls outside the partition
pub(crate) fn lead(values: &[Value], offset: usize, default: &Value) -> Vec<Value> {
    (0..values.len())
        .map(|i| match i.checked_add(offset) {
            Some(j) if j < values.len() => values[j].clone(),
            _ => default.clone(),
        })
        .collect()
}
