//! Shortest-path routing over the hypergraph.
//!
//! A generalization of Dijkstra's algorithm: from the current node, every
//! incident hyperedge offers a hop to each of its *other* members, and the
//! cost of entering a member is `edge.weight / member.weight`. Heavier nodes
//! are therefore cheaper to route through. Node weights are validated
//! strictly positive at construction, so the division is always defined; a
//! non-finite candidate distance is treated as impassable rather than
//! relaxed.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use crate::graph::Graph;

/// A candidate on the frontier: tentative distance plus the entered node.
///
/// Ordering is ascending by distance; ties break on the entered node's own
/// weight (the historical comparator for this algorithm), then on name so
/// the order is total and deterministic.
#[derive(Debug, Clone)]
struct Candidate {
    distance: f64,
    node_weight: f64,
    name: String,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.node_weight.total_cmp(&other.node_weight))
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Compute the minimum-cost path between two named nodes.
///
/// Returns the ordered sequence of node names from `start` to `end`
/// inclusive; an empty sequence if either endpoint is absent or no path
/// exists; `[start]` when `start == end`.
pub fn shortest_path(graph: &Graph, start: &str, end: &str) -> Vec<String> {
    if graph.get_node(start).is_none() || graph.get_node(end).is_none() {
        return Vec::new();
    }

    let mut distances: HashMap<&str, f64> = HashMap::new();
    let mut predecessors: HashMap<String, String> = HashMap::new();
    distances.insert(start, 0.0);

    let mut frontier = BinaryHeap::new();
    let start_weight = graph
        .get_node(start)
        .map(|n| n.weight())
        .unwrap_or_default();
    frontier.push(Reverse(Candidate {
        distance: 0.0,
        node_weight: start_weight,
        name: start.to_string(),
    }));

    while let Some(Reverse(current)) = frontier.pop() {
        let best = distances
            .get(current.name.as_str())
            .copied()
            .unwrap_or(f64::INFINITY);
        // Stale frontier entry: this node was already improved and settled.
        if current.distance > best {
            continue;
        }
        if current.name == end {
            return reconstruct(&predecessors, start, end);
        }

        let Some(node) = graph.get_node(&current.name) else {
            continue;
        };
        for edge_id in node.edges() {
            let Some(edge) = graph.edge(edge_id) else {
                continue;
            };
            for member_name in edge.members() {
                if member_name == &current.name {
                    continue;
                }
                let Some(member) = graph.get_node(member_name) else {
                    continue;
                };
                let tentative = current.distance + edge.weight() / member.weight();
                if !tentative.is_finite() {
                    continue;
                }
                let known = distances
                    .get(member_name.as_str())
                    .copied()
                    .unwrap_or(f64::INFINITY);
                if tentative < known {
                    distances.insert(member.name(), tentative);
                    predecessors.insert(member_name.clone(), current.name.clone());
                    frontier.push(Reverse(Candidate {
                        distance: tentative,
                        node_weight: member.weight(),
                        name: member_name.clone(),
                    }));
                }
            }
        }
    }

    Vec::new()
}

fn reconstruct(predecessors: &HashMap<String, String>, start: &str, end: &str) -> Vec<String> {
    let mut path = vec![end.to_string()];
    let mut cursor = end;
    while cursor != start {
        match predecessors.get(cursor) {
            Some(prev) => {
                path.push(prev.clone());
                cursor = prev;
            }
            None => return Vec::new(),
        }
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn test_shortest_path_chain() {
        let graph = Graph::from_parts(
            &["A", "B", "C"],
            &[(vec!["A", "B"], 1.0), (vec!["B", "C"], 2.0)],
        )
        .unwrap();

        assert_eq!(shortest_path(&graph, "A", "C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_shortest_path_disconnected() {
        let graph = Graph::from_parts(
            &["A", "B", "C", "D"],
            &[(vec!["A", "B"], 1.0), (vec!["C", "D"], 1.0)],
        )
        .unwrap();

        assert!(shortest_path(&graph, "A", "D").is_empty());
    }

    #[test]
    fn test_shortest_path_same_endpoint() {
        let graph = Graph::from_parts(&["X", "Y"], &[(vec!["X", "Y"], 1.0)]).unwrap();
        assert_eq!(shortest_path(&graph, "X", "X"), vec!["X"]);
    }

    #[test]
    fn test_shortest_path_absent_endpoint() {
        let graph = Graph::from_parts(&["A", "B"], &[(vec!["A", "B"], 1.0)]).unwrap();
        assert!(shortest_path(&graph, "A", "ghost").is_empty());
        assert!(shortest_path(&graph, "ghost", "A").is_empty());
    }

    #[test]
    fn test_cheaper_route_wins() {
        // A-B-D costs 1 + 1 = 2, the direct A-D edge costs 5.
        let graph = Graph::from_parts(
            &["A", "B", "D"],
            &[
                (vec!["A", "B"], 1.0),
                (vec!["B", "D"], 1.0),
                (vec!["A", "D"], 5.0),
            ],
        )
        .unwrap();

        assert_eq!(shortest_path(&graph, "A", "D"), vec!["A", "B", "D"]);
    }

    #[test]
    fn test_node_weight_scales_traversal_cost() {
        // Two hop candidates from A to D. Hops through the heavy node cost
        // edge.weight / 4, making the B route cheaper despite equal edge
        // weights.
        let mut graph = Graph::new();
        graph.add_node("A").unwrap();
        graph.add_weighted_node("B", 4.0).unwrap();
        graph.add_node("C").unwrap();
        graph.add_node("D").unwrap();
        graph.add_edge(&["A", "B"], 2.0).unwrap();
        graph.add_edge(&["A", "C"], 2.0).unwrap();
        // Entering D costs the same from either side; the difference is
        // the first hop: 2/4 through B versus 2/1 through C.
        graph.add_edge(&["B", "D"], 2.0).unwrap();
        graph.add_edge(&["C", "D"], 2.0).unwrap();

        assert_eq!(shortest_path(&graph, "A", "D"), vec!["A", "B", "D"]);
    }

    #[test]
    fn test_hyperedge_spans_multiple_members() {
        // One hyperedge over {A, B, C}: every member is one hop from every
        // other member.
        let graph =
            Graph::from_parts(&["A", "B", "C"], &[(vec!["A", "B", "C"], 1.0)]).unwrap();

        assert_eq!(shortest_path(&graph, "A", "C"), vec!["A", "C"]);
        assert_eq!(shortest_path(&graph, "B", "C"), vec!["B", "C"]);
    }

    #[test]
    fn test_tie_break_is_deterministic() {
        // Two equal-cost routes A-B-D and A-C-D. Repeated runs must pick
        // the same one.
        let graph = Graph::from_parts(
            &["A", "B", "C", "D"],
            &[
                (vec!["A", "B"], 1.0),
                (vec!["A", "C"], 1.0),
                (vec!["B", "D"], 1.0),
                (vec!["C", "D"], 1.0),
            ],
        )
        .unwrap();

        let first = shortest_path(&graph, "A", "D");
        for _ in 0..10 {
            assert_eq!(shortest_path(&graph, "A", "D"), first);
        }
    }
}
