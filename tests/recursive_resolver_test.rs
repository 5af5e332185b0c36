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

//! Recursive resolution over the public API

use windrow::{
    resolve_recursive, DataType, Error, KeyJoinMember, Relation, RecursiveSpec, Row, Schema,
    Value,
};

fn edge_schema() -> Schema {
    Schema::new(vec![
        ("id", DataType::Integer),
        ("parent_id", DataType::Integer),
    ])
    .unwrap()
}

fn edge_row(id: i64, parent: Option<i64>) -> Row {
    Row::from_values(vec![
        Value::Integer(id),
        parent
            .map(Value::Integer)
            .unwrap_or(Value::null(DataType::Integer)),
    ])
}

/// Balanced tree with the given branching factor and depth; ids assigned
/// breadth-first starting at 1
fn balanced_tree(branching: i64, depth: usize) -> Relation {
    let mut rows = vec![edge_row(1, None)];
    let mut level = vec![1i64];
    let mut next_id = 2i64;
    for _ in 0..depth {
        let mut next_level = Vec::new();
        for &parent in &level {
            for _ in 0..branching {
                rows.push(edge_row(next_id, Some(parent)));
                next_level.push(next_id);
                next_id += 1;
            }
        }
        level = next_level;
    }
    Relation::from_rows(edge_schema(), rows).unwrap()
}

fn descend_spec(base: Relation, anchor: Relation, max_depth: usize) -> RecursiveSpec<KeyJoinMember> {
    let member = KeyJoinMember::new(base, "id", "parent_id").unwrap();
    RecursiveSpec {
        anchor,
        member,
        max_depth,
        cycle_key_columns: vec!["id".to_string()],
        depth_column: None,
    }
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

#[test]
fn test_balanced_tree_row_count() {
    // A tree with branching b and depth d resolves to (b^(d+1) - 1) / (b - 1)
    // rows from its root
    for &(b, d) in &[(2i64, 3usize), (3, 2), (4, 2)] {
        let base = balanced_tree(b, d);
        let spec = descend_spec(base.clone(), roots(&base), 0);
        let result = resolve_recursive(&spec).unwrap();
        let expected = (b.pow(d as u32 + 1) - 1) / (b - 1);
        assert_eq!(result.len() as i64, expected, "b={} d={}", b, d);
    }
}

#[test]
fn test_depth_levels_are_breadth_first() {
    let base = balanced_tree(2, 2);
    let mut spec = descend_spec(base.clone(), roots(&base), 0);
    spec.depth_column = Some("level".to_string());
    let result = resolve_recursive(&spec).unwrap();

    let levels: Vec<i64> = result
        .rows()
        .iter()
        .map(|r| r[2].as_int64().unwrap())
        .collect();
    // Root, then both children, then the four grandchildren
    assert_eq!(levels, vec![0, 1, 1, 2, 2, 2, 2]);
    // Levels never decrease: expansion is strictly level by level
    assert!(levels.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_two_node_cycle_terminates() {
    let base = Relation::from_rows(
        edge_schema(),
        vec![edge_row(1, Some(2)), edge_row(2, Some(1))],
    )
    .unwrap();
    let anchor = Relation::from_rows(edge_schema(), vec![edge_row(1, Some(2))]).unwrap();
    let result = resolve_recursive(&descend_spec(base, anchor, 0)).unwrap();
    // Each node appears exactly once despite the unlimited depth
    let ids: Vec<i64> = result
        .rows()
        .iter()
        .map(|r| r[0].as_int64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_self_loop_terminates() {
    let base = Relation::from_rows(edge_schema(), vec![edge_row(1, Some(1))]).unwrap();
    let anchor = Relation::from_rows(edge_schema(), vec![edge_row(1, Some(1))]).unwrap();
    let result = resolve_recursive(&descend_spec(base, anchor, 0)).unwrap();
    assert_eq!(result.len(), 1);
}

#[test]
fn test_diamond_reaches_shared_node_twice() {
    // 1 -> {2, 3}, both 2 and 3 -> 4: node 4 appears once per path because
    // cycle avoidance is per ancestor chain, not global
    let base = Relation::from_rows(
        edge_schema(),
        vec![
            edge_row(1, None),
            edge_row(2, Some(1)),
            edge_row(3, Some(1)),
            edge_row(4, Some(2)),
            edge_row(4, Some(3)),
        ],
    )
    .unwrap();
    let spec = descend_spec(base.clone(), roots(&base), 0);
    let result = resolve_recursive(&spec).unwrap();
    let fours = result
        .rows()
        .iter()
        .filter(|r| r[0] == Value::Integer(4))
        .count();
    assert_eq!(fours, 2);
    assert_eq!(result.len(), 5);
}

#[test]
fn test_depth_cap_fails_without_partial_result() {
    let base = balanced_tree(2, 5);
    let spec = descend_spec(base.clone(), roots(&base), 3);
    let err = resolve_recursive(&spec).unwrap_err();
    assert_eq!(err, Error::RecursionLimitExceeded { max_depth: 3 });
}

#[test]
fn test_depth_cap_just_sufficient() {
    let base = balanced_tree(2, 3);
    // Levels 1..3 need three expansions plus one empty expansion to prove
    // the frontier exhausted
    let result = resolve_recursive(&descend_spec(base.clone(), roots(&base), 4)).unwrap();
    assert_eq!(result.len(), 15);
}

#[test]
fn test_anchor_schema_must_match_member() {
    let base = balanced_tree(2, 1);
    let anchor = Relation::new(Schema::new(vec![("id", DataType::Integer)]).unwrap());
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
fn test_null_keys_never_match() {
    // A NULL parent_id matches nothing, not even another NULL
    let base = Relation::from_rows(
        edge_schema(),
        vec![edge_row(1, None), edge_row(2, None)],
    )
    .unwrap();
    let anchor = roots(&base);
    let result = resolve_recursive(&descend_spec(base, anchor, 0)).unwrap();
    assert_eq!(result.len(), 2);
}
