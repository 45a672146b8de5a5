//! # Medium Dispatcher (C4)
//!
//! Per `tx` frame: resolves targets, runs the link-budget (C1), airtime
//! (C2), and drop-decision (C3) models for each one, updates the registry,
//! and delivers or drops. The registry lock is never held across the
//! simulated transmission delay or the write.
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

use crate::airtime::{self, DelayInput};
use crate::constants::BROADCAST_NODE_ID;
use crate::drop_model::{self, DropContext, DropReason};
use crate::link_budget::{self, LinkBudgetInput};
use crate::protocol::{DeliveredFrame, TxFrame};
use crate::registry::{InflightGuard, NodeRecord, Registry};

/// Resolves targets and dispatches a decoded `tx` frame for `sender_record`.
pub async fn dispatch<R: Rng + ?Sized>(registry: &Arc<Registry>, tx: &TxFrame, sender_record: &NodeRecord, rng: &mut R) {
    let destination = tx.meta.destination;

    let targets: Vec<(u8, NodeRecord)> = if destination == BROADCAST_NODE_ID {
        registry.peers_on_frequency(sender_record.frequency, tx.from)
    } else {
        match registry.lookup(destination) {
            None => {
                log::warn!(
                    "DROP reason={} sender={} destination={}",
                    DropReason::InvalidDestination,
                    tx.from,
                    destination
                );
                return;
            }
            Some(target) if target.frequency != sender_record.frequency => {
                log::warn!(
                    "DROP reason={} sender={} destination={} sender_freq={} dest_freq={}",
                    DropReason::FreqMismatch,
                    tx.from,
                    destination,
                    sender_record.frequency,
                    target.frequency
                );
                return;
            }
            Some(target) => vec![(destination, target)],
        }
    };

    let _guard = InflightGuard::enter(registry.clone());

    for (target_id, target_record) in targets {
        deliver_to_one(registry, tx, sender_record, target_id, &target_record, rng).await;
    }
}

async fn deliver_to_one<R: Rng + ?Sized>(
    registry: &Arc<Registry>,
    tx: &TxFrame,
    sender_record: &NodeRecord,
    target_id: u8,
    target_record: &NodeRecord,
    rng: &mut R,
) {
    let sf = tx.meta.sf();
    let distance_km = link_budget::distance_km(sender_record.location, target_record.location);

    let link = link_budget::compute(
        &LinkBudgetInput {
            sender_id: tx.from,
            receiver_id: target_id,
            distance_km,
            sf,
            tx_power_dbm: tx.meta.tx_power_dbm(),
            aqi: tx.meta.aqi(),
            weather: tx.meta.weather(),
            obstacle: tx.meta.obstacle(),
        },
        rng,
    );

    let delay_ms = airtime::total_delay_ms(
        &DelayInput {
            payload_len: tx.data.len(),
            sf,
            distance_km,
            snr_db: link.snr_db,
            weather: tx.meta.weather(),
            obstacle: tx.meta.obstacle(),
        },
        rng,
    );

    let now = Instant::now();
    let verdict = drop_model::evaluate(
        &DropContext {
            now,
            receiver_busy_until: registry.busy_until(target_id),
            distance_km,
            sf,
            rssi_dbm: link.rssi_dbm,
            snr_db: link.snr_db,
            inflight: registry.inflight_count(),
            loss_streak: registry.loss_streak(tx.from, target_id),
        },
        rng,
    );

    if let Some(reason) = verdict {
        registry.record_drop(tx.from, target_id);
        log::warn!(
            "DROP reason={reason} sender={} receiver={target_id} rssi={:.2} snr={:.2} distance_km={:.3} delay_ms={:.2}",
            tx.from,
            link.rssi_dbm,
            link.snr_db,
            distance_km,
            delay_ms
        );
        return;
    }

    registry.record_keep(tx.from, target_id);
    registry.mark_busy(target_id, now + Duration::from_secs_f64(delay_ms / 1000.0));

    tokio::time::sleep(Duration::from_secs_f64(delay_ms / 1000.0)).await;

    let delivered = DeliveredFrame::from_tx(tx, link.rssi_dbm, link.snr_db);
    let line = match serde_json::to_string(&delivered) {
        Ok(mut s) => {
            s.push('\n');
            s
        }
        Err(e) => {
            log::warn!("failed to encode delivered frame for receiver={target_id}: {e}");
            return;
        }
    };

    let mut writer = target_record.writer.lock().await;
    if let Err(e) = writer.write_all(line.as_bytes()).await {
        log::warn!("write failure to receiver={target_id}: {e}");
    }
}
