//! All-pairs routing table derived from a graph snapshot.
//!
//! The table is a pure function of the graph: it is recomputed wholesale
//! whenever the topology changes, never patched incrementally. Note the two
//! distinct cost notions: paths are *found* with the weight-scaled distance
//! from [`shortest_path`](crate::routing::shortest_path), while the `cost`
//! recorded here sums the traversed edges' raw weights. The two numbers are
//! not required to match.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::routing::shortest_path;

/// A routed path and its aggregate edge-weight cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Ordered node names from source to destination inclusive.
    pub path: Vec<String>,
    /// Sum of the traversed edges' weights.
    pub cost: f64,
}

/// Mapping from (source, destination) to the route between them.
///
/// Ordered pairs of distinct node names with no path are absent from the
/// table (absence-as-empty-result, matching the routing contract).
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: HashMap<(String, String), Route>,
}

impl RoutingTable {
    /// Compute the table for every ordered pair of distinct node names.
    pub fn compute(graph: &Graph) -> Self {
        let names = graph.node_names();
        let mut routes = HashMap::new();

        for source in &names {
            for destination in &names {
                if source == destination {
                    continue;
                }
                let path = shortest_path(graph, source, destination);
                if path.is_empty() {
                    continue;
                }
                let cost = path_cost(graph, &path);
                routes.insert(
                    (source.clone(), destination.clone()),
                    Route { path, cost },
                );
            }
        }

        Self { routes }
    }

    /// Look up the route for an ordered pair.
    pub fn route(&self, source: &str, destination: &str) -> Option<&Route> {
        self.routes
            .get(&(source.to_string(), destination.to_string()))
    }

    /// Number of routed pairs.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table holds no routes at all.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterate over ((source, destination), route) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&(String, String), &Route)> {
        self.routes.iter()
    }
}

/// Sum the cheapest joining edge's weight for each consecutive hop pair.
fn path_cost(graph: &Graph, path: &[String]) -> f64 {
    path.windows(2)
        .map(|hop| cheapest_joining_edge(graph, &hop[0], &hop[1]))
        .sum()
}

fn cheapest_joining_edge(graph: &Graph, from: &str, to: &str) -> f64 {
    let Some(node) = graph.get_node(from) else {
        return 0.0;
    };
    node.edges()
        .filter_map(|id| graph.edge(id))
        .filter(|edge| edge.contains(to))
        .map(|edge| edge.weight())
        .fold(f64::INFINITY, f64::min)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Graph {
        Graph::from_parts(
            &["A", "B", "C"],
            &[(vec!["A", "B"], 1.0), (vec!["B", "C"], 2.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_all_pairs_coverage() {
        let table = RoutingTable::compute(&chain());
        // 3 nodes, fully reachable: 6 ordered pairs.
        assert_eq!(table.len(), 6);
        assert!(table.route("A", "A").is_none());
    }

    #[test]
    fn test_route_path_and_cost() {
        let table = RoutingTable::compute(&chain());
        let route = table.route("A", "C").unwrap();
        assert_eq!(route.path, vec!["A", "B", "C"]);
        // Edge-weight sum: 1 (A-B) + 2 (B-C).
        assert_eq!(route.cost, 3.0);
    }

    #[test]
    fn test_unreachable_pairs_absent() {
        let graph = Graph::from_parts(
            &["A", "B", "C"],
            &[(vec!["A", "B"], 1.0)],
        )
        .unwrap();
        let table = RoutingTable::compute(&graph);

        assert!(table.route("A", "C").is_none());
        assert!(table.route("C", "A").is_none());
        assert!(table.route("A", "B").is_some());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cost_picks_cheapest_joining_edge() {
        // Two parallel ways to join A and B: the pairwise edge (weight 5)
        // and a hyperedge {A, B, C} (weight 1). The path may be found either
        // way; the recorded cost uses the cheapest joining edge.
        let graph = Graph::from_parts(
            &["A", "B", "C"],
            &[(vec!["A", "B"], 5.0), (vec!["A", "B", "C"], 1.0)],
        )
        .unwrap();
        let table = RoutingTable::compute(&graph);

        let route = table.route("A", "B").unwrap();
        assert_eq!(route.path, vec!["A", "B"]);
        assert_eq!(route.cost, 1.0);
    }

    #[test]
    fn test_route_serializes() {
        let table = RoutingTable::compute(&chain());
        let route = table.route("A", "C").unwrap();
        let json = serde_json::to_string(route).unwrap();
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, route);
    }

    #[test]
    fn test_empty_graph_empty_table() {
        let table = RoutingTable::compute(&Graph::new());
        assert!(table.is_empty());
    }
}
