use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::{json, Value};
use tracing::trace;

/**
Node/edge accumulator for force-directed graph rendering.

### Motivation / Implementation Rationale

Several independent relation-traversal passes each contribute a partial
graph over heterogeneous entity types (artists, people, albums, tables),
and the partial graphs get merged into one payload for the rendering
widget.  Node ids are strings of the form `"{type}-{pk}"` so different
entity types can share one id space.

We have no foreseen need to run graph algorithms against this
representation; its whole job is deduplicated accumulation and a stable
serialization order.  So rather than building on a graph library, nodes
live in an insertion-ordered `Vec` with an id-to-index side map, and edges
live in an explicit ordered map: a first-insertion-ordered key list plus a
key-to-parallel-edges map.  "First edge for a `(from, to)` pair wins" is a
parameter (`allow_duplicates`) instead of an accident of insertion-order
dictionary semantics.

Edges are recorded even when an endpoint was never added as a node.  The
rendering side tolerates dangling references, and hiding them here would
just mask exporter bugs; `collect_mass` skips what it can't resolve and
leaves a trace-level breadcrumb.
*/

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisNodeFont {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(rename = "strokeWidth", skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vadjust: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
}

/// A displayable graph node.  Everything beyond id/label/group is a visual
/// pass-through for the widget; `mass` and `value` are the weights the
/// force simulation sizes nodes by.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mass: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<VisNodeFont>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisEdgeColor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

/// A directed edge between node ids.  `from_` serializes as `from` because
/// the consumer-facing key collides with a reserved word on our side.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VisEdge {
    #[serde(rename = "from")]
    pub from_: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<VisEdgeColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashes: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physics: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
}

type EdgeKey = (String, String);

/// Merge behavior for `VisNetwork::extend`.
#[derive(Clone, Debug)]
pub struct ExtendOptions {
    /// Sum `mass`/`value` for nodes present on both sides (only when both
    /// sides carry a value; a one-sided weight is kept as-is).
    pub combine: bool,
    /// Let the incoming node's structural fields (label, group, visuals)
    /// replace the existing ones instead of first-seen-wins.
    pub overwrite_nodes: bool,
    /// Append incoming edges even for `(from, to)` pairs we already carry.
    pub allow_duplicate_edges: bool,
}

impl Default for ExtendOptions {
    fn default() -> Self {
        ExtendOptions {
            combine: true,
            overwrite_nodes: false,
            allow_duplicate_edges: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct VisNetwork {
    /// Nodes in insertion order; this is the serialization order.
    nodes: Vec<VisNode>,
    /// Maps node ids to their index in `nodes`.
    node_id_to_ix: HashMap<String, usize>,
    /// `(from, to)` keys in first-insertion order; this is the edge
    /// serialization order, each key expanding to its parallel edges.
    edge_keys: Vec<EdgeKey>,
    edges: HashMap<EdgeKey, Vec<VisEdge>>,
}

impl VisNetwork {
    pub fn new() -> Self {
        VisNetwork::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|parallel| parallel.len()).sum()
    }

    pub fn lookup_node(&self, id: &str) -> Option<&VisNode> {
        self.node_id_to_ix.get(id).map(|&ix| &self.nodes[ix])
    }

    /// Insert the node only if its id is new; an existing node's attributes
    /// are left untouched.
    pub fn add_node(&mut self, node: VisNode) {
        if !self.node_id_to_ix.contains_key(&node.id) {
            self.node_id_to_ix.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node);
        }
    }

    /// Insert if new, otherwise hand back the stored node so the caller can
    /// keep mutating shared counters like `mass`.
    pub fn get_or_add_node(&mut self, node: VisNode) -> &mut VisNode {
        let ix = match self.node_id_to_ix.get(&node.id) {
            Some(&ix) => ix,
            None => {
                let ix = self.nodes.len();
                self.node_id_to_ix.insert(node.id.clone(), ix);
                self.nodes.push(node);
                ix
            }
        };
        &mut self.nodes[ix]
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .contains_key(&(from.to_string(), to.to_string()))
    }

    /// Register an edge under its `(from, to)` key.  By default only the
    /// first edge for a given pair survives; later ones are silently dropped
    /// unless the caller opts into parallel edges.
    pub fn add_edge(&mut self, edge: VisEdge, allow_duplicates: bool) {
        let key = (edge.from_.clone(), edge.to.clone());
        match self.edges.get_mut(&key) {
            Some(parallel) => {
                if allow_duplicates {
                    parallel.push(edge);
                } else {
                    trace!(from = %key.0, to = %key.1, "dropping duplicate edge");
                }
            }
            None => {
                self.edge_keys.push(key.clone());
                self.edges.insert(key, vec![edge]);
            }
        }
    }

    /// Merge another network into this one.  Node order is ours first, then
    /// the incoming nodes we hadn't seen; edge-key order likewise.
    pub fn extend(&mut self, other: VisNetwork, options: &ExtendOptions) {
        for incoming in other.nodes {
            match self.node_id_to_ix.get(&incoming.id) {
                Some(&ix) => {
                    let existing = &mut self.nodes[ix];
                    let mass = combine_weight(existing.mass, incoming.mass, options);
                    let value = combine_weight(existing.value, incoming.value, options);
                    if options.overwrite_nodes {
                        *existing = incoming;
                    }
                    existing.mass = mass;
                    existing.value = value;
                }
                None => {
                    self.add_node(incoming);
                }
            }
        }
        for key in other.edge_keys {
            if let Some(parallel) = other.edges.get(&key) {
                for edge in parallel {
                    self.add_edge(edge.clone(), options.allow_duplicate_edges);
                }
            }
        }
    }

    /// Fallback weighting pass for callers that didn't accumulate mass while
    /// building: every edge adds 1 to its target node's mass (unset counts
    /// as 0), and the result optionally mirrors into `value`.
    pub fn collect_mass(&mut self, use_for_value: bool) {
        for key in &self.edge_keys {
            let parallel = &self.edges[key];
            for edge in parallel {
                match self.node_id_to_ix.get(&edge.to) {
                    Some(&ix) => {
                        let node = &mut self.nodes[ix];
                        node.mass = Some(node.mass.unwrap_or(0) + 1);
                    }
                    None => {
                        trace!(to = %edge.to, "collect_mass: dangling edge target");
                    }
                }
            }
        }
        if use_for_value {
            for node in &mut self.nodes {
                if node.mass.is_some() {
                    node.value = node.mass;
                }
            }
        }
    }

    /// Flatten into the `{nodes, edges}` payload the rendering widget
    /// embeds directly: nodes in insertion order, edges in the order their
    /// keys were first inserted with parallel edges expanded in place.
    pub fn to_presentation(&self) -> Value {
        let mut edges: Vec<&VisEdge> = vec![];
        for key in &self.edge_keys {
            edges.extend(self.edges[key].iter());
        }
        json!({
            "nodes": self.nodes,
            "edges": edges,
        })
    }
}

fn combine_weight(existing: Option<u64>, incoming: Option<u64>, options: &ExtendOptions) -> Option<u64> {
    match (existing, incoming) {
        (Some(a), Some(b)) if options.combine => Some(a + b),
        (a, b) => {
            if options.overwrite_nodes {
                b
            } else {
                a
            }
        }
    }
}

impl Serialize for VisNetwork {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_presentation().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, label: &str) -> VisNode {
        VisNode {
            id: id.to_string(),
            label: label.to_string(),
            ..VisNode::default()
        }
    }

    fn edge(from: &str, to: &str) -> VisEdge {
        VisEdge {
            from_: from.to_string(),
            to: to.to_string(),
            ..VisEdge::default()
        }
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut network = VisNetwork::new();
        network.add_node(node("person-1", "Alice"));
        network.add_node(node("person-1", "Imposter"));
        assert_eq!(network.node_count(), 1);
        assert_eq!(network.lookup_node("person-1").unwrap().label, "Alice");
    }

    #[test]
    fn get_or_add_returns_the_stored_node() {
        let mut network = VisNetwork::new();
        network.add_node(VisNode {
            mass: Some(2),
            ..node("person-1", "Alice")
        });
        let stored = network.get_or_add_node(node("person-1", "Imposter"));
        stored.mass = Some(stored.mass.unwrap_or(0) + 1);
        assert_eq!(network.lookup_node("person-1").unwrap().mass, Some(3));
        assert_eq!(network.lookup_node("person-1").unwrap().label, "Alice");
    }

    #[test]
    fn duplicate_edges_drop_by_default() {
        let mut network = VisNetwork::new();
        network.add_edge(
            VisEdge {
                width: Some(2),
                ..edge("a", "b")
            },
            false,
        );
        network.add_edge(
            VisEdge {
                width: Some(9),
                ..edge("a", "b")
            },
            false,
        );
        assert_eq!(network.edge_count(), 1);
        let presentation = network.to_presentation();
        assert_eq!(presentation["edges"].as_array().unwrap().len(), 1);
        // First edge wins.
        assert_eq!(presentation["edges"][0]["width"], 2);
    }

    #[test]
    fn parallel_edges_when_opted_in() {
        let mut network = VisNetwork::new();
        network.add_edge(edge("a", "b"), true);
        network.add_edge(edge("a", "b"), true);
        network.add_edge(edge("b", "c"), true);
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn collect_mass_counts_in_degree_and_mirrors_value() {
        let mut network = VisNetwork::new();
        network.add_node(node("x", "X"));
        network.add_node(node("y", "Y"));
        network.add_node(node("z", "Z"));
        network.add_edge(edge("x", "y"), false);
        network.add_edge(edge("z", "y"), false);
        network.collect_mass(true);
        let y = network.lookup_node("y").unwrap();
        assert_eq!(y.mass, Some(2));
        assert_eq!(y.value, Some(2));
        // Nothing points at x, so it stays unweighted.
        assert_eq!(network.lookup_node("x").unwrap().mass, None);
    }

    #[test]
    fn collect_mass_tolerates_dangling_target() {
        let mut network = VisNetwork::new();
        network.add_node(node("x", "X"));
        network.add_edge(edge("x", "ghost"), false);
        network.collect_mass(true);
        assert_eq!(network.edge_count(), 1);
    }

    #[test]
    fn extend_combines_masses_but_keeps_labels() {
        let mut a = VisNetwork::new();
        a.add_node(VisNode {
            mass: Some(3),
            ..node("p", "Preferred")
        });
        let mut b = VisNetwork::new();
        b.add_node(VisNode {
            mass: Some(3),
            ..node("p", "Other")
        });
        a.extend(b, &ExtendOptions::default());
        let p = a.lookup_node("p").unwrap();
        assert_eq!(p.mass, Some(6));
        assert_eq!(p.label, "Preferred");
    }

    #[test]
    fn extend_overwrite_lets_incoming_win() {
        let mut a = VisNetwork::new();
        a.add_node(VisNode {
            mass: Some(3),
            ..node("p", "Preferred")
        });
        let mut b = VisNetwork::new();
        b.add_node(VisNode {
            mass: Some(3),
            ..node("p", "Other")
        });
        a.extend(
            b,
            &ExtendOptions {
                overwrite_nodes: true,
                ..ExtendOptions::default()
            },
        );
        let p = a.lookup_node("p").unwrap();
        assert_eq!(p.label, "Other");
        assert_eq!(p.mass, Some(6));
    }

    #[test]
    fn extend_does_not_combine_one_sided_weights() {
        let mut a = VisNetwork::new();
        a.add_node(node("p", "Preferred"));
        let mut b = VisNetwork::new();
        b.add_node(VisNode {
            mass: Some(5),
            ..node("p", "Other")
        });
        a.extend(b, &ExtendOptions::default());
        assert_eq!(a.lookup_node("p").unwrap().mass, None);
    }

    #[test]
    fn extend_edge_dedup_is_first_wins_across_networks() {
        let mut a = VisNetwork::new();
        a.add_edge(
            VisEdge {
                width: Some(1),
                ..edge("a", "b")
            },
            false,
        );
        let mut b = VisNetwork::new();
        b.add_edge(
            VisEdge {
                width: Some(2),
                ..edge("a", "b")
            },
            false,
        );
        b.add_edge(edge("b", "c"), false);
        a.extend(b, &ExtendOptions::default());
        assert_eq!(a.edge_count(), 2);
        assert_eq!(a.to_presentation()["edges"][0]["width"], 1);
    }

    #[test]
    fn presentation_renames_from_and_omits_unset_fields() {
        let mut network = VisNetwork::new();
        network.add_node(node("a", "A"));
        network.add_node(node("b", "B"));
        network.add_edge(
            VisEdge {
                dashes: Some(true),
                ..edge("a", "b")
            },
            false,
        );
        let presentation = network.to_presentation();
        assert_eq!(
            presentation["edges"][0],
            serde_json::json!({"from": "a", "to": "b", "dashes": true})
        );
        // Unset group/mass/value stay out of the node payload.
        assert_eq!(
            presentation["nodes"][0],
            serde_json::json!({"id": "a", "label": "A"})
        );
    }

    #[test]
    fn presentation_orders_nodes_by_insertion_and_edges_by_key() {
        let mut network = VisNetwork::new();
        network.add_node(node("n2", "Second"));
        network.add_node(node("n1", "First"));
        network.add_edge(edge("n2", "n1"), true);
        network.add_edge(edge("n1", "n2"), true);
        network.add_edge(edge("n2", "n1"), true);
        let presentation = network.to_presentation();
        let ids: Vec<&str> = presentation["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["n2", "n1"]);
        let pairs: Vec<(String, String)> = presentation["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| {
                (
                    e["from"].as_str().unwrap().to_string(),
                    e["to"].as_str().unwrap().to_string(),
                )
            })
            .collect();
        // Parallel edges expand at their key's first-insertion position.
        assert_eq!(
            pairs,
            vec![
                ("n2".to_string(), "n1".to_string()),
                ("n2".to_string(), "n1".to_string()),
                ("n1".to_string(), "n2".to_string()),
            ]
        );
    }
}
