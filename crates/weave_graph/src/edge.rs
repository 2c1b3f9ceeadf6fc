//! Weighted hyperedges and their arena handles.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a hyperedge inside a [`Graph`](crate::Graph) arena.
///
/// Edge handles stay valid until the edge is removed; nodes keep these IDs
/// as back-references instead of owning the edge, so there is no ownership
/// cycle between nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub(crate) u64);

impl EdgeId {
    /// Return the raw numeric handle.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A hyperedge joining two or more named vertices with a scalar weight.
///
/// Identity is the unordered member-name set; no two edges in a graph may
/// share one. The weight is mutable in place through
/// [`Graph::update_edge_weight`](crate::Graph::update_edge_weight), and every
/// holder of the edge's ID observes the new value immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    members: BTreeSet<String>,
    weight: f64,
}

impl Edge {
    pub(crate) fn new(members: BTreeSet<String>, weight: f64) -> Self {
        Self { members, weight }
    }

    /// The names of the nodes this edge connects.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    /// The edge's traversal weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether the named node is a member of this edge.
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub(crate) fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.members.iter().map(String::as_str).collect();
        write!(f, "{{{}}} w={}", names.join(", "), self.weight)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn members(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_edge_membership() {
        let edge = Edge::new(members(&["A", "B", "C"]), 2.0);
        assert!(edge.contains("A"));
        assert!(edge.contains("C"));
        assert!(!edge.contains("D"));
        assert_eq!(edge.members().len(), 3);
    }

    #[test]
    fn test_edge_display() {
        let edge = Edge::new(members(&["B", "A"]), 1.5);
        // Members render sorted regardless of insertion order.
        assert_eq!(format!("{edge}"), "{A, B} w=1.5");
        assert_eq!(format!("{}", EdgeId(3)), "e3");
    }
}
