//! # Connection Sessions (C5)
//!
//! One task per accepted connection, driving the `ACCEPTED → REGISTERED →
//! (ACTIVE)* → CLOSED` state machine over newline-delimited JSON. Malformed
//! lines and frames of the wrong kind for the current state are skipped,
//! never fatal to the connection.
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;

use crate::constants::BROADCAST_NODE_ID;
use crate::dispatcher;
use crate::protocol::InboundFrame;
use crate::registry::Registry;

/// Drives one accepted connection until EOF or a read error, then tears
/// down its registry entry (if any).
pub async fn run(stream: TcpStream, registry: Arc<Registry>) {
    let peer = stream.peer_addr().ok();
    let (read_half, write_half) = stream.into_split();
    let writer = Arc::new(AsyncMutex::new(write_half));
    let mut lines = BufReader::new(read_half).lines();
    let mut node_id: Option<u8> = None;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::warn!("session read error from {peer:?}: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let frame: InboundFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(_) => continue,
        };

        match frame {
            InboundFrame::Register(reg) => {
                if reg.node_id == BROADCAST_NODE_ID {
                    log::warn!("rejected register for reserved broadcast id from {peer:?}");
                    continue;
                }
                registry.register(reg.node_id, reg.location, reg.frequency, writer.clone());
                log::info!(
                    "node {} registered at ({:.3},{:.3}), freq {}",
                    reg.node_id,
                    reg.location.0,
                    reg.location.1,
                    reg.frequency
                );
                node_id = Some(reg.node_id);
            }
            InboundFrame::Tx(tx) => {
                let Some(id) = node_id else {
                    continue;
                };
                let Some(sender_record) = registry.lookup(id) else {
                    continue;
                };
                let mut rng = rand::thread_rng();
                dispatcher::dispatch(&registry, &tx, &sender_record, &mut rng).await;
            }
        }
    }

    if let Some(id) = node_id {
        registry.unregister(id);
        log::info!("node {id} disconnected");
    }
}
