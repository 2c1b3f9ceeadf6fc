//! Weave Graph — weighted hypergraph topology and shortest-path routing.
//!
//! This crate models an overlay topology as a hypergraph (edges join
//! arbitrary sets of two or more nodes, not just pairs) and derives routing
//! information from it:
//!
//! - **Model**: an arena-owned [`Graph`] of named, weighted nodes and
//!   weighted hyperedges, with a mutation API enforcing uniqueness
//!   invariants.
//! - **Routing**: hypergraph Dijkstra ([`shortest_path`]) where traversal
//!   cost is scaled down by the entered node's weight.
//! - **Table**: an all-pairs [`RoutingTable`] recomputed from any graph
//!   snapshot.
//!
//! # Quick start
//!
//! ```rust
//! use weave_graph::{Graph, shortest_path};
//!
//! let graph = Graph::from_parts(
//!     &["A", "B", "C"],
//!     &[(vec!["A", "B"], 1.0), (vec!["B", "C"], 2.0)],
//! )
//! .unwrap();
//!
//! assert_eq!(shortest_path(&graph, "A", "C"), vec!["A", "B", "C"]);
//! ```

pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod routing;
pub mod table;

// ── Re-exports for convenience ──────────────────────────────────────────

pub use edge::{Edge, EdgeId};
pub use error::GraphError;
pub use graph::Graph;
pub use node::Node;
pub use routing::shortest_path;
pub use table::{Route, RoutingTable};
