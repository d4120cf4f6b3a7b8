use std::collections::{HashMap, HashSet, VecDeque};

use clap::ValueEnum;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

use crate::abstract_store::{ErrorDetails, ErrorLayer, Result, StoreError};

/**
Forest reconstruction over self-referential rows.

The rows arrive as flat JSON objects with an id field and a nullable
parent-reference field, in whatever order the store produced them.  We index
everything into an arena in a single pass, deferring any child seen before
its parent into a FIFO that gets drained once the index is complete, then
run a breadth-first pass from the root set to assign 1-based depths.

Two deliberate departures from the obvious approach:

- The input rows are moved into an immutable arena and the output is
  projected from it, rather than splicing `children`/`depth` keys into the
  caller's rows.  This keeps the same rows reusable across builds and makes
  the parent back-reference chain (used when re-rooting) a rendering
  concern instead of an aliasing hazard.
- Both the BFS and the upward re-root walk memoize on arena index, i.e. on
  record identity rather than id value.  A parent cycle in the source data
  is a data integrity violation, but it must terminate here regardless;
  what such input produces beyond termination is unspecified.
*/

/// What to do with a record whose parent id never appears in the row set.
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum OrphanPolicy {
    /// Leave the record out of the forest and log a warning.
    Drop,
    /// Fail the whole build.
    Fail,
}

#[derive(Clone, Debug)]
pub struct HierarchyConfig {
    /// Field holding each row's unique identifier.
    pub id_key: String,
    /// Field referencing the parent row's identifier; null or absent marks a
    /// root.
    pub parent_key: String,
    /// Output field for the child list.
    pub child_key: String,
    /// Output field for the computed depth.
    pub depth_key: String,
    /// When given, the forest is re-rooted at this id (canonical string form
    /// of the row's id value).
    pub root_id: Option<String>,
    /// Project the flat BFS-ordered list instead of the nested forest.
    pub flatten: bool,
    pub orphan_policy: OrphanPolicy,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        HierarchyConfig {
            id_key: "id".to_string(),
            parent_key: "parent_id".to_string(),
            child_key: "children".to_string(),
            depth_key: "depth".to_string(),
            root_id: None,
            flatten: false,
            orphan_policy: OrphanPolicy::Drop,
        }
    }
}

/// Canonical string form of an id-bearing JSON value.  Integer and string
/// ids are both in use across the source tables, and the CLI can only hand
/// us strings, so everything is keyed through this.
pub fn canonical_id(val: &Value) -> Option<String> {
    match val {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

struct HierRecord {
    /// The row as it arrived, id and parent fields included.
    payload: Map<String, Value>,
    /// Canonical form of the parent reference, if the row has one.
    parent_key: Option<String>,
    /// Arena indices of attached children, in attachment order.
    children: Vec<usize>,
    /// 1-based BFS depth; 0 means the record was never reached.
    depth: u64,
}

/// The built forest.  Serializes as either the nested root list or the flat
/// BFS projection depending on `config.flatten`.
pub struct HierarchyForest {
    config: HierarchyConfig,
    arena: Vec<HierRecord>,
    roots: Vec<usize>,
    /// Every record reached from the roots, in BFS (level) order.
    visit_order: Vec<usize>,
    /// When re-rooted, the upward path of parents from the root (nearest
    /// first), rendered as a shallow-copy back-reference chain.
    root_chain: Vec<usize>,
}

fn bad_record_err(message: String) -> StoreError {
    StoreError::StickyProblem(ErrorDetails {
        layer: ErrorLayer::DataLayer,
        message,
    })
}

pub fn build_hierarchy(rows: Vec<Value>, config: HierarchyConfig) -> Result<HierarchyForest> {
    let mut arena: Vec<HierRecord> = Vec::with_capacity(rows.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
    let mut deferred: VecDeque<usize> = VecDeque::new();
    let mut roots: Vec<usize> = vec![];

    // Single indexing pass.  Children can show up before their parents, so
    // anything whose parent isn't indexed yet goes into the deferred queue.
    for row in rows {
        let payload = match row {
            Value::Object(map) => map,
            other => {
                return Err(bad_record_err(format!(
                    "hierarchy row is not an object: {}",
                    other
                )));
            }
        };
        let key = payload
            .get(&config.id_key)
            .and_then(canonical_id)
            .ok_or_else(|| {
                bad_record_err(format!("hierarchy row lacks usable '{}'", config.id_key))
            })?;
        let parent_key = match payload.get(&config.parent_key) {
            None | Some(Value::Null) => None,
            Some(val) => Some(canonical_id(val).ok_or_else(|| {
                bad_record_err(format!(
                    "hierarchy row '{}' has unusable '{}'",
                    key, config.parent_key
                ))
            })?),
        };

        let idx = arena.len();
        arena.push(HierRecord {
            payload,
            parent_key: parent_key.clone(),
            children: vec![],
            depth: 0,
        });
        // Uniqueness is the store's primary-key constraint, not ours; a
        // duplicate id here just shadows the earlier record in the index.
        index.insert(key, idx);

        match parent_key {
            None => {
                if config.root_id.is_none() {
                    roots.push(idx);
                }
            }
            Some(parent) => {
                if let Some(&parent_idx) = index.get(&parent) {
                    arena[parent_idx].children.push(idx);
                } else {
                    deferred.push_back(idx);
                }
            }
        }
    }

    // At this point every record has been seen once, so the deferred records
    // can resolve against the complete index.
    while let Some(idx) = deferred.pop_front() {
        let parent = arena[idx].parent_key.clone().unwrap();
        match index.get(&parent) {
            Some(&parent_idx) => {
                // A record that is its own parent would otherwise self-attach
                // and show up as its own child.
                if parent_idx != idx {
                    arena[parent_idx].children.push(idx);
                }
            }
            None => match config.orphan_policy {
                OrphanPolicy::Drop => {
                    warn!(
                        parent = %parent,
                        "dropping record with unresolvable parent"
                    );
                }
                OrphanPolicy::Fail => {
                    return Err(bad_record_err(format!(
                        "record references unknown parent '{}'",
                        parent
                    )));
                }
            },
        }
    }

    let mut root_chain = vec![];
    if let Some(root_id) = &config.root_id {
        let root_idx = match index.get(root_id) {
            Some(&idx) => idx,
            None => {
                return Err(StoreError::NotFound(ErrorDetails {
                    layer: ErrorLayer::DataLayer,
                    message: format!("no record with id '{}'", root_id),
                }));
            }
        };
        roots = vec![root_idx];

        // Walk upward to the true root, memoizing on arena index so a parent
        // cycle stops the walk instead of looping.
        let mut memo = HashSet::new();
        memo.insert(root_idx);
        let mut cursor = root_idx;
        while let Some(parent) = &arena[cursor].parent_key {
            let parent_idx = match index.get(parent) {
                Some(&idx) => idx,
                // Parent outside the supplied row set; the chain just ends.
                None => break,
            };
            if !memo.insert(parent_idx) {
                break;
            }
            root_chain.push(parent_idx);
            cursor = parent_idx;
        }
    }

    // Breadth-first depth assignment, memoized on arena index so duplicated
    // or cyclic input still terminates.
    let mut visit_order = vec![];
    let mut memo = HashSet::new();
    let mut queue: VecDeque<(usize, u64)> = roots.iter().map(|&idx| (idx, 1)).collect();
    while let Some((idx, depth)) = queue.pop_front() {
        if !memo.insert(idx) {
            continue;
        }
        arena[idx].depth = depth;
        visit_order.push(idx);
        queue.extend(arena[idx].children.iter().map(|&child| (child, depth + 1)));
    }

    Ok(HierarchyForest {
        config,
        arena,
        roots,
        visit_order,
        root_chain,
    })
}

impl HierarchyForest {
    /// Output key for the parent back-reference chain, derived from the
    /// parent field: `parent_account_id` renders as `parent_account`.
    fn parent_field(&self) -> &str {
        self.config
            .parent_key
            .strip_suffix("_id")
            .unwrap_or("parent")
    }

    /// BFS assigns each record the depth of the level it was first reached
    /// at, so an attached child whose depth is not exactly one deeper marks a
    /// cycle-closing link; skipping those keeps the rendering finite.
    fn tree_children(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        let depth = self.arena[idx].depth;
        self.arena[idx]
            .children
            .iter()
            .copied()
            .filter(move |&child| self.arena[child].depth == depth + 1)
    }

    fn node_json(&self, idx: usize) -> Value {
        let record = &self.arena[idx];
        let mut obj = record.payload.clone();
        obj.insert(self.config.depth_key.clone(), record.depth.into());
        obj.insert(
            self.config.child_key.clone(),
            Value::Array(
                self.tree_children(idx)
                    .map(|child| self.node_json(child))
                    .collect(),
            ),
        );
        Value::Object(obj)
    }

    /// Shallow copy for the upward chain: payload only, no child list and no
    /// depth, so the serialized root doesn't duplicate whole subtrees.
    fn chain_json(&self) -> Option<Value> {
        let parent_field = self.parent_field().to_string();
        let mut nested: Option<Value> = None;
        for &idx in self.root_chain.iter().rev() {
            let mut obj = self.arena[idx].payload.clone();
            if let Some(inner) = nested.take() {
                obj.insert(parent_field.clone(), inner);
            }
            nested = Some(Value::Object(obj));
        }
        nested
    }

    /// The nested forest: root records only, children recursively attached.
    pub fn to_forest_json(&self) -> Value {
        let parent_field = self.parent_field().to_string();
        let chain = self.chain_json();
        Value::Array(
            self.roots
                .iter()
                .map(|&idx| {
                    let mut node = self.node_json(idx);
                    if let (Some(obj), Some(chain)) = (node.as_object_mut(), chain.clone()) {
                        obj.insert(parent_field.clone(), chain);
                    }
                    node
                })
                .collect(),
        )
    }

    /// The flat projection: every reachable record once, in BFS order, with
    /// the child field reduced to a list of child id values so consumers get
    /// an edge list rather than nested duplication.
    pub fn to_flat_json(&self) -> Value {
        Value::Array(
            self.visit_order
                .iter()
                .map(|&idx| {
                    let record = &self.arena[idx];
                    let mut obj = record.payload.clone();
                    obj.insert(self.config.depth_key.clone(), record.depth.into());
                    obj.insert(
                        self.config.child_key.clone(),
                        Value::Array(
                            self.tree_children(idx)
                                .filter_map(|child| {
                                    self.arena[child].payload.get(&self.config.id_key).cloned()
                                })
                                .collect(),
                        ),
                    );
                    Value::Object(obj)
                })
                .collect(),
        )
    }

    pub fn to_value(&self) -> Value {
        if self.config.flatten {
            self.to_flat_json()
        } else {
            self.to_forest_json()
        }
    }
}

impl Serialize for HierarchyForest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
