//! The peer runtime: a listening endpoint that classifies inbound frames
//! and floods application messages to its known peer set.
//!
//! Every connection is a single-shot session: one read of at most
//! [`MAX_FRAME_BYTES`](crate::frame::MAX_FRAME_BYTES), one classification,
//! then the socket closes. Outbound sends open a fresh connection per peer
//! and per message; there is no connection reuse, no retry and no backoff.
//! Every network operation is attempted at most once.
//!
//! Shared state (the peer list and the delivery log) is guarded by
//! per-peer mutexes held only long enough to snapshot or append, never
//! across a network await, so a slow peer cannot serialize unrelated
//! connections behind it.

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::error::NetError;
use crate::frame::{Frame, MAX_FRAME_BYTES};

/// Seconds since the Unix epoch as a float: the wire clock.
pub fn wall_clock() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// One recorded hop: which peer a message was sent to, and when.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// The destination peer of this hop.
    pub peer: SocketAddr,
    /// Send time in epoch seconds.
    pub timestamp: f64,
}

/// Bounded log of delivery records keyed by message payload.
///
/// Holds at most `capacity` distinct payload keys; inserting a new key at
/// capacity evicts the oldest key wholesale. Records under a live key are
/// append-only, one per hop, which is what the delivery metrics need.
#[derive(Debug)]
pub struct MessageLog {
    capacity: usize,
    entries: HashMap<String, Vec<DeliveryRecord>>,
    order: VecDeque<String>,
}

impl MessageLog {
    /// Create a log retaining at most `capacity` message keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Ensure a key exists for this payload, evicting the oldest key if the
    /// log is at capacity.
    pub fn touch(&mut self, payload: &str) {
        if self.entries.contains_key(payload) {
            return;
        }
        while self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
        self.entries.insert(payload.to_string(), Vec::new());
        self.order.push_back(payload.to_string());
    }

    /// Append a hop record under the payload's key.
    pub fn record(&mut self, payload: &str, record: DeliveryRecord) {
        self.touch(payload);
        if let Some(records) = self.entries.get_mut(payload) {
            records.push(record);
        }
    }

    /// Whether the payload has a key in the log.
    pub fn contains(&self, payload: &str) -> bool {
        self.entries.contains_key(payload)
    }

    /// The hop records for a payload, empty if unknown.
    pub fn records(&self, payload: &str) -> Vec<DeliveryRecord> {
        self.entries.get(payload).cloned().unwrap_or_default()
    }

    /// Number of distinct message keys currently retained.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Snapshot of a peer's delivery counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerMetrics {
    /// The peer's listen address.
    pub addr: SocketAddr,
    /// Number of known peers at snapshot time.
    pub peer_count: usize,
    /// Messages successfully written to an outbound connection.
    pub messages_sent: u64,
    /// Inbound application messages processed.
    pub messages_received: u64,
}

/// State shared between the peer's public API, its accept loop and every
/// per-connection task.
struct PeerShared {
    addr: RwLock<SocketAddr>,
    peers: Mutex<Vec<SocketAddr>>,
    log: Mutex<MessageLog>,
    messages_sent: AtomicU64,
    messages_received: AtomicU64,
}

impl PeerShared {
    async fn addr(&self) -> SocketAddr {
        *self.addr.read().await
    }

    /// Dial a peer, register it and send the greeting message.
    async fn connect(&self, peer: SocketAddr) -> Result<(), NetError> {
        let mut stream = TcpStream::connect(peer)
            .await
            .map_err(|source| NetError::Connect { addr: peer, source })?;

        self.peers.lock().await.push(peer);

        let greeting = Frame::Message {
            payload: format!("from {}", self.addr().await),
            timestamp: wall_clock(),
        };
        stream.write_all(greeting.encode().as_bytes()).await?;

        if let Frame::Message { payload, .. } = &greeting {
            self.log.lock().await.record(
                payload,
                DeliveryRecord {
                    peer,
                    timestamp: wall_clock(),
                },
            );
        }
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        info!("{} connected to peer {peer}", self.addr().await);
        Ok(())
    }

    /// Send `payload` to every known peer over fresh connections.
    ///
    /// The peer list is snapshotted under the lock, then each send runs
    /// without it. A failure against one peer is logged and the fan-out
    /// continues; this is not atomic. Returns the number of successful
    /// sends.
    async fn fan_out(&self, payload: &str, timestamp: f64) -> usize {
        let snapshot: Vec<SocketAddr> = self.peers.lock().await.clone();
        self.log.lock().await.touch(payload);

        let frame = Frame::Message {
            payload: payload.to_string(),
            timestamp,
        };
        let encoded = frame.encode();

        let mut delivered = 0;
        for peer in snapshot {
            match TcpStream::connect(peer).await {
                Ok(mut stream) => match stream.write_all(encoded.as_bytes()).await {
                    Ok(()) => {
                        self.log.lock().await.record(
                            payload,
                            DeliveryRecord {
                                peer,
                                timestamp: wall_clock(),
                            },
                        );
                        self.messages_sent.fetch_add(1, Ordering::Relaxed);
                        delivered += 1;
                        debug!("timestamp={timestamp} sent message to {peer}");
                    }
                    Err(e) => {
                        warn!("send to peer {peer} failed: {e}");
                    }
                },
                Err(e) => {
                    warn!("connect to peer {peer} failed: {e}");
                }
            }
        }
        delivered
    }

    /// Relay an inbound message: fan out with its origin timestamp, then
    /// count the inbound message that triggered the propagation.
    async fn propagate(&self, payload: &str, origin_timestamp: f64) -> usize {
        debug!("timestamp={origin_timestamp} received message");
        let delivered = self.fan_out(payload, origin_timestamp).await;
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        delivered
    }

    /// One single-shot inbound session: read once, classify, act, close.
    async fn handle_connection(self: Arc<Self>, mut stream: TcpStream, remote: SocketAddr) {
        let mut buf = [0u8; MAX_FRAME_BYTES];
        let n = match stream.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("read from {remote} failed: {e}");
                return;
            }
        };
        // The connection closes when `stream` drops, whatever was read.
        drop(stream);

        let text = String::from_utf8_lossy(&buf[..n]);
        match Frame::parse(&text) {
            Some(Frame::Connect { ip, port }) => {
                let Ok(peer) = format!("{ip}:{port}").parse::<SocketAddr>() else {
                    debug!("CONNECT from {remote} with unparseable address {ip}:{port}");
                    return;
                };
                if let Err(e) = self.connect(peer).await {
                    warn!("{e}");
                }
            }
            Some(Frame::Message { payload, timestamp }) => {
                self.propagate(&payload, timestamp).await;
            }
            None => {
                debug!("unclassified frame from {remote} dropped");
            }
        }
    }

    /// Accept inbound connections until the shutdown signal fires; each
    /// accepted connection is handled on its own task so the loop never
    /// waits on a session.
    async fn accept_loop(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote)) => {
                            debug!("connection from {remote}");
                            let shared = Arc::clone(&self);
                            tokio::spawn(async move {
                                shared.handle_connection(stream, remote).await;
                            });
                        }
                        Err(e) => {
                            warn!("accept failed: {e}");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("{} accept loop stopped", self.addr().await);
                    break;
                }
            }
        }
    }
}

/// A single overlay peer: one listening socket, a known-peer set and
/// flooding-style propagation with per-hop delivery records.
pub struct Peer {
    addr: SocketAddr,
    shared: Arc<PeerShared>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    running: bool,
}

impl Peer {
    /// Create a peer that will listen on `addr`. Port 0 requests an
    /// ephemeral port, resolved by [`start`](Peer::start).
    pub fn new(addr: SocketAddr, log_capacity: usize) -> Self {
        Self {
            addr,
            shared: Arc::new(PeerShared {
                addr: RwLock::new(addr),
                peers: Mutex::new(Vec::new()),
                log: Mutex::new(MessageLog::new(log_capacity)),
                messages_sent: AtomicU64::new(0),
                messages_received: AtomicU64::new(0),
            }),
            shutdown_tx: None,
            running: false,
        }
    }

    /// The peer's listen address (resolved after a successful `start`).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Whether the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Bind the listening socket and spawn the accept loop.
    ///
    /// A bind or listen failure is fatal for this peer and is returned as
    /// [`NetError::Bind`]; the peer is not retried. Returns the bound
    /// address.
    pub async fn start(&mut self) -> Result<SocketAddr, NetError> {
        if self.running {
            return Ok(self.addr);
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| NetError::Bind {
                addr: self.addr,
                source,
            })?;
        let local = listener.local_addr()?;
        self.addr = local;
        *self.shared.addr.write().await = local;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        self.shutdown_tx = Some(shutdown_tx);

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            shared.accept_loop(listener, shutdown_rx).await;
        });

        self.running = true;
        info!("peer listening on {local}");
        Ok(local)
    }

    /// Stop the accept loop. In-flight outbound sends run to completion;
    /// this is the peer's only cancellation primitive.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.running = false;
    }

    /// Dial a peer, add it to the known set and send the greeting frame.
    ///
    /// A failure is isolated to this call: the caller logs it and moves on.
    pub async fn connect(&self, peer: SocketAddr) -> Result<(), NetError> {
        self.shared.connect(peer).await
    }

    /// Originate a new message: flood it to every known peer, stamped with
    /// the wall clock at call start. Returns the number of peers reached.
    pub async fn send_message(&self, payload: &str) -> usize {
        self.shared.fan_out(payload, wall_clock()).await
    }

    /// Relay a message received with `origin_timestamp`, preserving its
    /// stamp across hops. Returns the number of peers reached.
    pub async fn propagate_message(&self, payload: &str, origin_timestamp: f64) -> usize {
        self.shared.propagate(payload, origin_timestamp).await
    }

    /// Snapshot of the known peer addresses.
    pub async fn known_peers(&self) -> Vec<SocketAddr> {
        self.shared.peers.lock().await.clone()
    }

    /// Counter-based metrics snapshot. Computed from the live counters,
    /// not by replaying the message log.
    pub async fn metrics(&self) -> PeerMetrics {
        PeerMetrics {
            addr: self.shared.addr().await,
            peer_count: self.shared.peers.lock().await.len(),
            messages_sent: self.shared.messages_sent.load(Ordering::Relaxed),
            messages_received: self.shared.messages_received.load(Ordering::Relaxed),
        }
    }

    /// Whether this peer's log has seen the payload.
    pub async fn has_delivered(&self, payload: &str) -> bool {
        self.shared.log.lock().await.contains(payload)
    }

    /// The hop records for a payload.
    pub async fn delivery_records(&self, payload: &str) -> Vec<DeliveryRecord> {
        self.shared.log.lock().await.records(payload)
    }

    /// Best-effort secondary view: hop records for `payload` younger than
    /// `window` seconds. May double count across calls; the counters in
    /// [`metrics`](Peer::metrics) are the authoritative totals.
    pub async fn delivery_count(&self, payload: &str, window: f64) -> usize {
        let cutoff = wall_clock() - window;
        self.shared
            .log
            .lock()
            .await
            .records(payload)
            .iter()
            .filter(|r| r.timestamp >= cutoff)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
