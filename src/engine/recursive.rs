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

//! Recursive Resolver
//!
//! Fixed-point expansion of a self-referential relationship: an anchor
//! relation seeds the result, then a recursive member repeatedly maps the
//! current frontier to candidate rows until the frontier is empty.
//!
//! The expansion is an explicit loop with a depth counter, never native
//! call-stack recursion: the depth cap is enforced before any expansion
//! work happens and stack usage stays bounded. Cycle avoidance is a data
//! check - a candidate whose identity key already occurs in its own
//! ancestor chain is dropped, so malformed self-referential data cannot
//! loop forever even with an unlimited depth.

use std::sync::Arc;

use log::debug;
use smallvec::SmallVec;

use crate::core::{Error, Relation, Result, Row, Schema, Value};

/// Identity key of a row under the cycle-key columns
type IdentityKey = SmallVec<[Value; 4]>;

/// One expansion step of a recursive resolution
///
/// Implementations produce the candidate rows reachable from a frontier.
/// Each candidate is tagged with the index of its parent row in the
/// frontier, which carries the ancestor chain used for cycle avoidance.
pub trait RecursiveMember {
    /// Schema of the rows this member produces; must match the anchor's
    /// schema exactly so the fixed point is well-typed
    fn schema(&self) -> &Schema;

    /// Produce (parent frontier index, candidate row) pairs for one step,
    /// in frontier order and stable within each parent
    fn expand(&self, frontier: &Relation) -> Result<Vec<(usize, Row)>>;
}

/// Recursive member joining a base relation to the frontier on a key pair
///
/// For each frontier row, emits the base rows whose `base_column` value
/// equals the frontier row's `frontier_column` value, in base arrival
/// order. NULL keys never match.
pub struct KeyJoinMember {
    base: Relation,
    frontier_column: String,
    base_column: String,
}

impl KeyJoinMember {
    /// Create a key-join member, validating both join columns
    pub fn new(
        base: Relation,
        frontier_column: impl Into<String>,
        base_column: impl Into<String>,
    ) -> Result<Self> {
        let frontier_column = frontier_column.into();
        let base_column = base_column.into();
        base.schema().require_index(&frontier_column)?;
        base.schema().require_index(&base_column)?;
        Ok(Self {
            base,
            frontier_column,
            base_column,
        })
    }
}

impl RecursiveMember for KeyJoinMember {
    fn schema(&self) -> &Schema {
        self.base.schema()
    }

    fn expand(&self, frontier: &Relation) -> Result<Vec<(usize, Row)>> {
        let frontier_col = frontier.schema().require_index(&self.frontier_column)?;
        let base_col = self.base.schema().require_index(&self.base_column)?;

        let mut candidates = Vec::new();
        for (parent, frontier_row) in frontier.rows().iter().enumerate() {
            let key = &frontier_row[frontier_col];
            if key.is_null() {
                continue;
            }
            for base_row in self.base.rows() {
                let candidate_key = &base_row[base_col];
                if !candidate_key.is_null() && candidate_key == key {
                    candidates.push((parent, base_row.clone()));
                }
            }
        }
        Ok(candidates)
    }
}

/// Specification of one recursive resolution
pub struct RecursiveSpec<M: RecursiveMember> {
    /// Seed relation; its schema is the output schema
    pub anchor: Relation,
    /// The step applied repeatedly to the current frontier
    pub member: M,
    /// Iteration cap; 0 means unlimited (cycle avoidance still terminates
    /// finite data)
    pub max_depth: usize,
    /// Identity columns used to detect revisits along an ancestor chain
    pub cycle_key_columns: Vec<String>,
    /// When set, the output schema gains an integer column recording each
    /// row's depth level (anchor rows are depth 0)
    pub depth_column: Option<String>,
}

/// Ancestor chain as a shared linked list: each frontier row points at its
/// parent's chain, so inheriting a chain is O(1) and membership checks walk
/// at most `depth` links
struct AncestorChain {
    key: IdentityKey,
    parent: Option<Arc<AncestorChain>>,
}

impl AncestorChain {
    fn seed(key: IdentityKey) -> Arc<Self> {
        Arc::new(Self { key, parent: None })
    }

    fn child(self: &Arc<Self>, key: IdentityKey) -> Arc<Self> {
        Arc::new(Self {
            key,
            parent: Some(Arc::clone(self)),
        })
    }

    fn contains(&self, key: &IdentityKey) -> bool {
        let mut node = Some(self);
        while let Some(chain) = node {
            if &chain.key == key {
                return true;
            }
            node = chain.parent.as_ref().map(Arc::as_ref);
        }
        false
    }
}

/// Resolve a recursive specification to its fixed point
///
/// Fails with InvalidRecursiveSpec if the member's schema does not match
/// the anchor's, and with RecursionLimitExceeded if `max_depth > 0` and the
/// frontier is still non-empty when the cap is reached. Failure is atomic:
/// no partial result is returned.
pub fn resolve_recursive<M: RecursiveMember>(spec: &RecursiveSpec<M>) -> Result<Relation> {
    if spec.member.schema() != spec.anchor.schema() {
        return Err(Error::invalid_recursive_spec(format!(
            "recursive member schema {} does not match anchor schema {}",
            spec.member.schema(),
            spec.anchor.schema()
        )));
    }
    if spec.cycle_key_columns.is_empty() {
        return Err(Error::invalid_recursive_spec(
            "cycle key columns must not be empty",
        ));
    }
    let key_cols = spec
        .cycle_key_columns
        .iter()
        .map(|name| spec.anchor.schema().require_index(name))
        .collect::<Result<Vec<_>>>()?;

    let output_schema = match &spec.depth_column {
        Some(name) => spec
            .anchor
            .schema()
            .with_column(name, crate::core::DataType::Integer)?,
        None => spec.anchor.schema().clone(),
    };

    let identity_of = |row: &Row| -> IdentityKey {
        key_cols.iter().map(|&c| row[c].clone()).collect()
    };
    let emit = |result: &mut Relation, row: &Row, depth: usize| -> Result<()> {
        let out = match spec.depth_column {
            Some(_) => row.appended(Value::Integer(depth as i64)),
            None => row.clone(),
        };
        result.push_row(out)
    };

    let mut result = Relation::new(output_schema);
    let mut frontier = spec.anchor.clone();
    let mut chains: Vec<Arc<AncestorChain>> = Vec::with_capacity(frontier.len());
    for row in frontier.rows() {
        chains.push(AncestorChain::seed(identity_of(row)));
        emit(&mut result, row, 0)?;
    }

    let mut depth = 0usize;
    while !frontier.is_empty() && (spec.max_depth == 0 || depth < spec.max_depth) {
        let candidates = spec.member.expand(&frontier)?;

        let mut next_frontier = Relation::new(spec.anchor.schema().clone());
        let mut next_chains = Vec::new();
        for (parent, row) in candidates {
            let chain = chains.get(parent).ok_or_else(|| {
                Error::invalid_recursive_spec(format!(
                    "recursive member referenced frontier row {} of {}",
                    parent,
                    frontier.len()
                ))
            })?;
            let key = identity_of(&row);
            if chain.contains(&key) {
                // Revisit of an ancestor: cycle, drop the candidate
                continue;
            }
            next_chains.push(chain.child(key));
            next_frontier.push_row(row)?;
        }

        depth += 1;
        debug!(
            "recursive resolve: depth {} produced {} rows",
            depth,
            next_frontier.len()
        );
        for row in next_frontier.rows() {
            emit(&mut result, row, depth)?;
        }
        frontier = next_frontier;
        chains = next_chains;
    }

    if !frontier.is_empty() {
        return Err(Error::RecursionLimitExceeded {
            max_depth: spec.max_depth,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    /// Edge table: (id, parent_id)
    fn edges(pairs: &[(i64, Option<i64>)]) -> Relation {
        let schema = Schema::new(vec![
            ("id", DataType::Integer),
            ("parent_id", DataType::Integer),
        ])
        .unwrap();
        Relation::from_rows(
            schema,
            pairs
                .iter()
                .map(|&(id, parent)| {
                    Row::from_values(vec![
                        Value::Integer(id),
                        parent.map(Value::Integer).unwrap_or(Value::null(DataType::Integer)),
                    ])
                })
                .collect(),
        )
        .unwrap()
    }

    fn roots(base: &Relation) -> Relation {
        let rows = base
            .rows()
            .iter()
            .filter(|r| r[1].is_null())
            .cloned()
            .collect();
        Relation::from_rows(base.schema().clone(), rows).unwrap()
    }

    fn spec_for(base: Relation, max_depth: usize) -> RecursiveSpec<KeyJoinMember> {
        let anchor = roots(&base);
        let member = KeyJoinMember::new(base, "id", "parent_id").unwrap();
        RecursiveSpec {
            anchor,
            member,
            max_depth,
            cycle_key_columns: vec!["id".to_string()],
            depth_column: None,
        }
    }

    #[test]
    fn test_chain_resolution() {
        // 1 -> 2 -> 3
        let base = edges(&[(1, None), (2, Some(1)), (3, Some(2))]);
        let result = resolve_recursive(&spec_for(base, 0)).unwrap();
        let ids: Vec<i64> = result
            .rows()
            .iter()
            .map(|r| r[0].as_int64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_depth_column() {
        let base = edges(&[(1, None), (2, Some(1)), (3, Some(2))]);
        let mut spec = spec_for(base, 0);
        spec.depth_column = Some("depth".to_string());
        let result = resolve_recursive(&spec).unwrap();
        assert_eq!(result.schema().len(), 3);
        let depths: Vec<i64> = result
            .rows()
            .iter()
            .map(|r| r[2].as_int64().unwrap())
            .collect();
        assert_eq!(depths, vec![0, 1, 2]);
    }

    #[test]
    fn test_two_cycle_terminates() {
        // A references B, B references A; anchor is A itself
        let base = edges(&[(1, Some(2)), (2, Some(1))]);
        let anchor = Relation::from_rows(
            base.schema().clone(),
            vec![base.rows()[0].clone()],
        )
        .unwrap();
        let member = KeyJoinMember::new(base, "id", "parent_id").unwrap();
        let spec = RecursiveSpec {
            anchor,
            member,
            max_depth: 0,
            cycle_key_columns: vec!["id".to_string()],
            depth_column: None,
        };
        let result = resolve_recursive(&spec).unwrap();
        let ids: Vec<i64> = result
            .rows()
            .iter()
            .map(|r| r[0].as_int64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_depth_limit_fails_atomically() {
        let base = edges(&[(1, None), (2, Some(1)), (3, Some(2))]);
        let err = resolve_recursive(&spec_for(base, 2)).unwrap_err();
        assert_eq!(err, Error::RecursionLimitExceeded { max_depth: 2 });
    }

    #[test]
    fn test_depth_limit_sufficient() {
        let base = edges(&[(1, None), (2, Some(1)), (3, Some(2))]);
        // Depth 3: level 2 is reached and one further (empty) expansion fits
        let result = resolve_recursive(&spec_for(base, 3)).unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let base = edges(&[(1, None)]);
        let anchor = Relation::new(
            Schema::new(vec![("id", DataType::Integer)]).unwrap(),
        );
        let member = KeyJoinMember::new(base, "id", "parent_id").unwrap();
        let spec = RecursiveSpec {
            anchor,
            member,
            max_depth: 0,
            cycle_key_columns: vec!["id".to_string()],
            depth_column: None,
        };
        assert!(matches!(
            resolve_recursive(&spec).unwrap_err(),
            Error::InvalidRecursiveSpec(_)
        ));
    }

    #[test]
    fn test_empty_cycle_keys_rejected() {
        let base = edges(&[(1, None)]);
        let mut spec = spec_for(base, 0);
        spec.cycle_key_columns.clear();
        assert!(matches!(
            resolve_recursive(&spec).unwrap_err(),
            Error::InvalidRecursiveSpec(_)
        ));
    }

    #[test]
    fn test_empty_anchor_yields_empty_result() {
        let base = edges(&[(1, Some(2)), (2, Some(1))]);
        let spec = spec_for(base, 0); // no roots
        let result = resolve_recursive(&spec).unwrap();
        assert!(result.is_empty());
    }
}
