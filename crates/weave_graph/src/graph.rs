//! The hypergraph: an arena of named nodes and weighted hyperedges.
//!
//! The graph owns both sides of the node/edge relationship. Nodes hold
//! back-references to incident edges as [`EdgeId`]s and edges name their
//! members by node name, so removal from either side can restore the
//! invariants without shared-ownership cycles:
//!
//! 1. node names are unique;
//! 2. no two edges have identical member-name sets;
//! 3. every edge's member set is a subset of the current node set;
//! 4. a node's back-reference set is exactly the set of edges containing it.

use std::collections::{BTreeSet, HashMap};

use crate::edge::{Edge, EdgeId};
use crate::error::GraphError;
use crate::node::Node;

/// A weighted hypergraph addressed by node name.
///
/// All mutation goes through this API; node and edge internals are never
/// exposed mutably.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    name: Option<String>,
    nodes: HashMap<String, Node>,
    edges: HashMap<EdgeId, Edge>,
    member_index: HashMap<BTreeSet<String>, EdgeId>,
    next_edge_id: u64,
}

impl Graph {
    /// Create an empty, unlabeled graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with a label.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Build a graph from initial node names (weight 1) and edge specs.
    pub fn from_parts(nodes: &[&str], edges: &[(Vec<&str>, f64)]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for name in nodes {
            graph.add_node(name)?;
        }
        for (members, weight) in edges {
            graph.add_edge(members, *weight)?;
        }
        Ok(graph)
    }

    /// The graph's label, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Add a node with the default weight of 1.
    pub fn add_node(&mut self, name: &str) -> Result<(), GraphError> {
        self.add_weighted_node(name, 1.0)
    }

    /// Add a node with an explicit weight.
    ///
    /// The weight must be finite and strictly positive: it divides edge
    /// weights during routing, so zero would make traversal cost undefined.
    pub fn add_weighted_node(&mut self, name: &str, weight: f64) -> Result<(), GraphError> {
        if name.is_empty() {
            return Err(GraphError::InvalidArgument(
                "node name must be non-empty".to_string(),
            ));
        }
        validate_weight(weight)?;
        if self.nodes.contains_key(name) {
            return Err(GraphError::DuplicateNode(name.to_string()));
        }
        self.nodes
            .insert(name.to_string(), Node::new(name.to_string(), weight));
        Ok(())
    }

    /// Add a hyperedge over the given member names.
    ///
    /// Every member must already be a node (unknown members fail closed with
    /// [`GraphError::UnknownNode`]); at least two distinct members are
    /// required; the member set must not duplicate an existing edge.
    pub fn add_edge(&mut self, members: &[&str], weight: f64) -> Result<EdgeId, GraphError> {
        validate_weight(weight)?;
        let member_set: BTreeSet<String> = members.iter().map(|m| m.to_string()).collect();
        if member_set.len() < 2 {
            return Err(GraphError::InvalidArgument(
                "a hyperedge needs at least two distinct members".to_string(),
            ));
        }
        for member in &member_set {
            if !self.nodes.contains_key(member) {
                return Err(GraphError::UnknownNode(member.clone()));
            }
        }
        if self.member_index.contains_key(&member_set) {
            let names: Vec<&str> = member_set.iter().map(String::as_str).collect();
            return Err(GraphError::DuplicateEdge(names.join(", ")));
        }

        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        for member in &member_set {
            if let Some(node) = self.nodes.get_mut(member) {
                node.edges.insert(id);
            }
        }
        self.member_index.insert(member_set.clone(), id);
        self.edges.insert(id, Edge::new(member_set, weight));
        Ok(id)
    }

    /// Remove a node and every hyperedge incident to it. No-op if absent.
    pub fn remove_node(&mut self, name: &str) {
        let Some(node) = self.nodes.remove(name) else {
            return;
        };
        for id in node.edges {
            let Some(edge) = self.edges.remove(&id) else {
                continue;
            };
            self.member_index.remove(edge.members());
            for member in edge.members() {
                if member == name {
                    continue;
                }
                if let Some(other) = self.nodes.get_mut(member) {
                    other.edges.remove(&id);
                }
            }
        }
    }

    /// Remove the hyperedge with exactly this member set. No-op if absent.
    pub fn remove_edge(&mut self, members: &[&str]) {
        let member_set: BTreeSet<String> = members.iter().map(|m| m.to_string()).collect();
        let Some(id) = self.member_index.remove(&member_set) else {
            return;
        };
        if let Some(edge) = self.edges.remove(&id) {
            for member in edge.members() {
                if let Some(node) = self.nodes.get_mut(member) {
                    node.edges.remove(&id);
                }
            }
        }
    }

    /// Update an edge's weight in place. No-op if no edge matches.
    ///
    /// The single arena entry is mutated, so every holder of the edge's ID
    /// observes the new weight immediately.
    pub fn update_edge_weight(&mut self, members: &[&str], weight: f64) -> Result<(), GraphError> {
        validate_weight(weight)?;
        let member_set: BTreeSet<String> = members.iter().map(|m| m.to_string()).collect();
        if let Some(id) = self.member_index.get(&member_set) {
            if let Some(edge) = self.edges.get_mut(id) {
                edge.set_weight(weight);
            }
        }
        Ok(())
    }

    /// Attach or clear the runtime endpoint correlated with a node. No-op
    /// if the node is absent.
    pub fn set_endpoint(&mut self, name: &str, endpoint: Option<std::net::SocketAddr>) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.endpoint = endpoint;
        }
    }

    /// Look up a node by name.
    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Look up an edge by its exact member set.
    pub fn get_edge(&self, members: &[&str]) -> Option<&Edge> {
        let member_set: BTreeSet<String> = members.iter().map(|m| m.to_string()).collect();
        self.member_index
            .get(&member_set)
            .and_then(|id| self.edges.get(id))
    }

    /// Resolve an edge handle.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    /// The names of all current nodes, in arbitrary order.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    /// All edges as (member-name-set, weight) pairs, in arbitrary order.
    pub fn edge_specs(&self) -> Vec<(BTreeSet<String>, f64)> {
        self.edges
            .values()
            .map(|edge| (edge.members().clone(), edge.weight()))
            .collect()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of hyperedges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn validate_weight(weight: f64) -> Result<(), GraphError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(GraphError::InvalidArgument(format!(
            "weight must be finite and positive, got {weight}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
