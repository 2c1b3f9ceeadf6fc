//! Weave Network — the live peer overlay runtime.
//!
//! This crate realizes a [`weave_graph`] topology as live network peers
//! that exchange flooding-style messages while tracking delivery metrics.
//!
//! # Architecture
//!
//! - **Frames**: single-shot plain-text messages over TCP, one fixed-size
//!   read per connection (`CONNECT`, `MESSAGE`).
//! - **Peer**: one listening socket per peer; every accepted connection is
//!   an independent short-lived session; application messages are flooded
//!   to all known peers without route computation or deduplication.
//! - **Overlay**: builds a seeded random hypergraph over synthetic
//!   addresses, derives the all-pairs routing table (informational), wires
//!   the live peers as a full mesh and measures one end-to-end flood.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use weave_network::{Overlay, OverlayConfig};
//!
//! # async fn example() {
//! let mut overlay = Overlay::new(OverlayConfig::default());
//! let report = overlay.launch().await.unwrap();
//! println!("delivered to {}/{} peers", report.delivered, report.expected);
//! overlay.shutdown();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod frame;
pub mod overlay;
pub mod peer;

// ── Re-exports for convenience ──────────────────────────────────────────

pub use config::OverlayConfig;
pub use error::NetError;
pub use frame::{Frame, MAX_FRAME_BYTES};
pub use overlay::{Overlay, TraversalReport};
pub use peer::{DeliveryRecord, MessageLog, Peer, PeerMetrics};
