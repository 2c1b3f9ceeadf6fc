//! Network error types.

use std::net::SocketAddr;
use std::time::Duration;

/// Errors that can occur in the weave_network crate.
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Binding or listening on the peer's address failed. This is fatal for
    /// that peer's lifecycle; it is not retried.
    #[error("bind on {addr} failed: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// A single outbound connection attempt failed. Isolated to that call;
    /// fan-out and mesh setup continue past it.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// An I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bounded wait elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Topology construction failed.
    #[error(transparent)]
    Graph(#[from] weave_graph::GraphError),
}
