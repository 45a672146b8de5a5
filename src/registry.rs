//! # Shared Registry (C6)
//!
//! The single authoritative store of connected nodes, their locations and
//! listening frequencies, receiver-busy deadlines, per-pair loss streaks,
//! and the spawned session tasks themselves. One `std::sync::Mutex` guards
//! all tables together, per the concurrency model's single-registry-lock
//! rule; the in-flight counter sits outside it and is mutated atomically.
//!
//! The lock is only ever held for `HashMap`/`Vec` lookups/inserts — never
//! across an `.await` — so callers must clone what they need (a writer
//! handle, a location) out of the lock before doing any I/O or sleeping.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::constants::MAX_INFLIGHT;

/// A connected node's location, listening frequency, and write half.
#[derive(Clone)]
pub struct NodeRecord {
    pub location: (f64, f64),
    pub frequency: f64,
    pub writer: Arc<AsyncMutex<OwnedWriteHalf>>,
}

#[derive(Default)]
struct RegistryState {
    nodes: HashMap<u8, NodeRecord>,
    busy_until: HashMap<u8, Instant>,
    loss_streak: HashMap<(u8, u8), u32>,
    session_tasks: Vec<JoinHandle<()>>,
}

/// The shared registry. Cheap to pass around as `Arc<Registry>`.
#[derive(Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
    inflight: AtomicUsize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node record for `node_id`. A second
    /// `register` for an id already present silently replaces the prior
    /// entry — the prior session is considered stale. `writer` is shared
    /// with the owning session so that a session which re-registers (same
    /// or different id) keeps writing through the same transport.
    pub fn register(&self, node_id: u8, location: (f64, f64), frequency: f64, writer: Arc<AsyncMutex<OwnedWriteHalf>>) {
        let record = NodeRecord { location, frequency, writer };
        let mut state = self.state.lock().expect("registry lock poisoned");
        state.nodes.insert(node_id, record);
    }

    /// Removes the node record for `node_id`, if present. Called on session
    /// teardown (disconnect or shutdown).
    pub fn unregister(&self, node_id: u8) -> Option<NodeRecord> {
        let mut state = self.state.lock().expect("registry lock poisoned");
        state.nodes.remove(&node_id)
    }

    /// Looks up one node's record by id.
    pub fn lookup(&self, node_id: u8) -> Option<NodeRecord> {
        let state = self.state.lock().expect("registry lock poisoned");
        state.nodes.get(&node_id).cloned()
    }

    /// All registered nodes on `frequency`, excluding `exclude`. Iteration
    /// order follows the underlying `HashMap` and is unspecified but stable
    /// within the call, per the broadcast-ordering note in §4.4.
    pub fn peers_on_frequency(&self, frequency: f64, exclude: u8) -> Vec<(u8, NodeRecord)> {
        let state = self.state.lock().expect("registry lock poisoned");
        state
            .nodes
            .iter()
            .filter(|(&id, record)| id != exclude && record.frequency == frequency)
            .map(|(&id, record)| (id, record.clone()))
            .collect()
    }

    /// The instant `node_id`'s receiver is free, if it has ever been
    /// reserved. `None` means the receiver has no outstanding reservation.
    pub fn busy_until(&self, node_id: u8) -> Option<Instant> {
        let state = self.state.lock().expect("registry lock poisoned");
        state.busy_until.get(&node_id).copied()
    }

    /// Reserves `node_id`'s receiver until `until`. Per the monotone-busy-window
    /// law, callers only do this after confirming the packet is admitted.
    pub fn mark_busy(&self, node_id: u8, until: Instant) {
        let mut state = self.state.lock().expect("registry lock poisoned");
        state.busy_until.insert(node_id, until);
    }

    /// Current loss streak for `(sender, receiver)`.
    pub fn loss_streak(&self, sender: u8, receiver: u8) -> u32 {
        let state = self.state.lock().expect("registry lock poisoned");
        state.loss_streak.get(&(sender, receiver)).copied().unwrap_or(0)
    }

    /// Increments the loss streak for `(sender, receiver)` and returns the
    /// new value.
    pub fn record_drop(&self, sender: u8, receiver: u8) -> u32 {
        let mut state = self.state.lock().expect("registry lock poisoned");
        let streak = state.loss_streak.entry((sender, receiver)).or_insert(0);
        *streak += 1;
        *streak
    }

    /// Resets the loss streak for `(sender, receiver)` to zero.
    pub fn record_keep(&self, sender: u8, receiver: u8) {
        let mut state = self.state.lock().expect("registry lock poisoned");
        state.loss_streak.insert((sender, receiver), 0);
    }

    /// Current in-flight transmission count.
    pub fn inflight_count(&self) -> usize {
        self.inflight.load(Ordering::SeqCst)
    }

    fn inflight_enter(&self) {
        self.inflight.fetch_add(1, Ordering::SeqCst);
    }

    fn inflight_exit(&self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }

    /// Maximum in-flight ratio divisor, exposed for the drop model.
    pub fn max_inflight() -> usize {
        MAX_INFLIGHT
    }

    /// Tracks a spawned session task so shutdown can actually terminate it.
    /// A write-half shutdown alone only half-closes the socket; the
    /// session's read loop blocks on the other half until its remote peer
    /// closes, which a long-lived node has no reason to do on its own.
    /// Aborting the task on shutdown drops its owned `TcpStream` half and
    /// unblocks it immediately. Already-finished handles are pruned
    /// opportunistically so this doesn't grow without bound over the
    /// server's lifetime.
    pub fn track_session(&self, handle: JoinHandle<()>) {
        let mut state = self.state.lock().expect("registry lock poisoned");
        state.session_tasks.retain(|h| !h.is_finished());
        state.session_tasks.push(handle);
    }

    /// Closes every registered node's write half, aborts every tracked
    /// session task, and empties the node table. Used by the lifecycle's
    /// shutdown path; the busy/streak tables are left intact since they
    /// carry no open resources.
    pub async fn close_all(&self) {
        let (records, tasks): (Vec<NodeRecord>, Vec<JoinHandle<()>>) = {
            let mut state = self.state.lock().expect("registry lock poisoned");
            let records = state.nodes.drain().map(|(_, record)| record).collect();
            let tasks = state.session_tasks.drain(..).collect();
            (records, tasks)
        };
        for record in records {
            use tokio::io::AsyncWriteExt;
            let mut writer = record.writer.lock().await;
            let _ = writer.shutdown().await;
        }
        for task in tasks {
            task.abort();
        }
    }
}

/// RAII guard: increments the in-flight counter on construction,
/// decrements it on drop regardless of how the dispatcher call exits.
pub struct InflightGuard {
    registry: Arc<Registry>,
}

impl InflightGuard {
    pub fn enter(registry: Arc<Registry>) -> Self {
        registry.inflight_enter();
        InflightGuard { registry }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.registry.inflight_exit();
    }
}
