//! Overlay orchestration: synthetic topology, routing table, live peers.
//!
//! An [`Overlay`] builds a hypergraph with one node per synthetic
//! `ip:port` address, wires hyperedges at random from a fixed seed,
//! derives the all-pairs routing table, then realizes the topology as
//! live peers. The routing table is informational output; the live
//! connection policy is a full mesh regardless, so the two are
//! independently observable results of a run.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use weave_graph::{Graph, GraphError, RoutingTable};

use crate::config::OverlayConfig;
use crate::error::NetError;
use crate::peer::Peer;

/// Outcome of one measured flood across the overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalReport {
    /// Peers that observed the message within the timeout.
    pub delivered: usize,
    /// Peers that were expected to observe it.
    pub expected: usize,
    /// Wall-clock time from origination until the last observation (or
    /// until the timeout fired).
    pub elapsed: Duration,
    /// Whether the bounded wait elapsed before full delivery.
    pub timed_out: bool,
}

/// Builds and runs one overlay: topology, routing table, peers, flood.
pub struct Overlay {
    config: OverlayConfig,
    peers: Vec<Peer>,
    topology: Option<Graph>,
}

impl Overlay {
    /// Create an overlay for the given configuration. No sockets are
    /// opened until [`launch`](Overlay::launch).
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            peers: Vec::new(),
            topology: None,
        }
    }

    /// Build the synthetic topology graph: one node per peer address,
    /// weight 1, and for every unordered pair an edge with the configured
    /// probability and weight 1. A fixed seed reproduces the same wiring
    /// for a given node count.
    pub fn build_topology(config: &OverlayConfig) -> Result<Graph, GraphError> {
        let mut graph = Graph::named("overlay");
        let names: Vec<String> = (0..config.node_count)
            .map(|i| config.peer_address(i))
            .collect();
        for name in &names {
            graph.add_node(name)?;
        }

        let mut rng = StdRng::seed_from_u64(config.topology_seed);
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if rng.random_bool(config.edge_probability) {
                    graph.add_edge(&[names[i].as_str(), names[j].as_str()], 1.0)?;
                }
            }
        }
        Ok(graph)
    }

    /// Run the overlay end to end:
    ///
    /// 1. build the topology and log its all-pairs routing table;
    /// 2. start one peer per address (a bind failure is fatal for that
    ///    peer: it is logged and the peer abandoned);
    /// 3. connect every ordered pair of live peers (full mesh; a connect
    ///    failure is logged and mesh setup continues);
    /// 4. originate one message from the first peer and wait, bounded by
    ///    the configured timeout, for every other peer to observe it.
    ///
    /// The returned [`TraversalReport`] is the run's terminal output.
    pub async fn launch(&mut self) -> Result<TraversalReport, NetError> {
        let mut graph = Self::build_topology(&self.config)?;
        let table = RoutingTable::compute(&graph);
        info!(
            "topology: {} nodes, {} hyperedges, {} routed pairs",
            graph.node_count(),
            graph.edge_count(),
            table.len()
        );
        for ((source, destination), route) in table.iter() {
            debug!(
                "route {source} -> {destination}: {:?} cost={}",
                route.path, route.cost
            );
        }

        self.start_peers().await;
        // Correlate each live listening socket with its topology node.
        for peer in &self.peers {
            graph.set_endpoint(&peer.addr().to_string(), Some(peer.addr()));
        }
        self.topology = Some(graph);

        self.connect_mesh().await;
        self.measure_flood().await
    }

    /// The topology graph of the last launch, with live endpoints attached
    /// to every started node.
    pub fn topology(&self) -> Option<&Graph> {
        self.topology.as_ref()
    }

    /// Start one peer per configured address.
    async fn start_peers(&mut self) {
        for i in 0..self.config.node_count {
            let addr: SocketAddr = match self.config.peer_address(i).parse() {
                Ok(addr) => addr,
                Err(e) => {
                    error!("invalid peer address {}: {e}", self.config.peer_address(i));
                    continue;
                }
            };
            let mut peer = Peer::new(addr, self.config.message_log_capacity);
            match peer.start().await {
                Ok(addr) => {
                    self.peers.push(peer);
                    debug!("started peer {addr}");
                }
                Err(e) => {
                    // Fatal for this peer only; the overlay runs without it.
                    error!("peer failed to start: {e}");
                }
            }
        }
    }

    /// Connect every ordered pair of live peers, independent of the
    /// routing table.
    async fn connect_mesh(&self) {
        for a in 0..self.peers.len() {
            for b in 0..self.peers.len() {
                if a == b {
                    continue;
                }
                if let Err(e) = self.peers[a].connect(self.peers[b].addr()).await {
                    warn!("mesh setup: {e}");
                }
            }
        }
    }

    /// Originate one message from the first peer and poll the remaining
    /// peers' logs until all observed it or the timeout elapses.
    async fn measure_flood(&self) -> Result<TraversalReport, NetError> {
        let Some((origin, rest)) = self.peers.split_first() else {
            // Nothing to flood; degenerate but not an error.
            return Ok(TraversalReport {
                delivered: 0,
                expected: 0,
                elapsed: Duration::ZERO,
                timed_out: false,
            });
        };

        let payload = format!("flood from {}", origin.addr());
        let started = Instant::now();
        origin.send_message(&payload).await;

        let mut delivered = 0;
        while started.elapsed() < self.config.delivery_timeout {
            delivered = 0;
            for peer in rest {
                if peer.has_delivered(&payload).await {
                    delivered += 1;
                }
            }
            if delivered == rest.len() {
                let elapsed = started.elapsed();
                info!(
                    "flood reached {}/{} peers in {elapsed:?}",
                    delivered,
                    rest.len()
                );
                return Ok(TraversalReport {
                    delivered,
                    expected: rest.len(),
                    elapsed,
                    timed_out: false,
                });
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        warn!(
            "flood timed out: {}/{} peers after {:?}",
            delivered,
            rest.len(),
            self.config.delivery_timeout
        );
        Ok(TraversalReport {
            delivered,
            expected: rest.len(),
            elapsed: started.elapsed(),
            timed_out: true,
        })
    }

    /// The live peers, in address order.
    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    /// Stop every peer's accept loop.
    pub fn shutdown(&mut self) {
        for peer in &mut self.peers {
            peer.shutdown();
        }
        info!("overlay shut down");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(start_port: u16, node_count: usize) -> OverlayConfig {
        OverlayConfig {
            start_port,
            node_count,
            delivery_timeout: Duration::from_secs(5),
            ..OverlayConfig::default()
        }
    }

    #[test]
    fn test_topology_is_reproducible() {
        let config = test_config(9600, 6);
        let first = Overlay::build_topology(&config).unwrap();
        let second = Overlay::build_topology(&config).unwrap();

        assert_eq!(first.node_count(), 6);
        let mut a = first.edge_specs();
        let mut b = second.edge_specs();
        a.sort_by(|x, y| x.0.cmp(&y.0));
        b.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_topology_seed_changes_wiring() {
        let base = test_config(9600, 8);
        let mut reseeded = test_config(9600, 8);
        reseeded.topology_seed = base.topology_seed + 1;

        let first = Overlay::build_topology(&base).unwrap();
        let second = Overlay::build_topology(&reseeded).unwrap();

        let mut a = first.edge_specs();
        let mut b = second.edge_specs();
        a.sort_by(|x, y| x.0.cmp(&y.0));
        b.sort_by(|x, y| x.0.cmp(&y.0));
        // With 28 candidate pairs at p=0.5 an identical draw is vanishingly
        // unlikely; treat equality as a seed regression.
        assert_ne!(a, b);
    }

    #[test]
    fn test_edge_probability_bounds() {
        let mut config = test_config(9600, 5);
        config.edge_probability = 0.0;
        assert_eq!(Overlay::build_topology(&config).unwrap().edge_count(), 0);

        config.edge_probability = 1.0;
        // Complete pairwise wiring: C(5, 2) edges.
        assert_eq!(Overlay::build_topology(&config).unwrap().edge_count(), 10);
    }

    #[tokio::test]
    async fn test_overlay_flood_reaches_all_peers() {
        let mut overlay = Overlay::new(test_config(39731, 3));
        let report = overlay.launch().await.unwrap();

        assert!(!report.timed_out, "flood timed out: {report:?}");
        assert_eq!(report.delivered, 2);
        assert_eq!(report.expected, 2);

        // Full mesh regardless of the routing table.
        for peer in overlay.peers() {
            assert_eq!(peer.metrics().await.peer_count, 2);
        }

        // Every started node is correlated with its live endpoint.
        let topology = overlay.topology().unwrap();
        for peer in overlay.peers() {
            let node = topology.get_node(&peer.addr().to_string()).unwrap();
            assert_eq!(node.endpoint(), Some(peer.addr()));
        }
        overlay.shutdown();
    }
}
