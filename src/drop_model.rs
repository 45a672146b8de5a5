//! # Drop-Decision Engine (C3)
//!
//! Combines sensitivity, SNR margin, range ratio, congestion, streak memory,
//! and SF-scaled interference into a drop verdict with a labelled reason.
//! Rules are evaluated in a fixed priority order; the first one that fires
//! wins.
use rand::Rng;
use std::fmt;
use tokio::time::Instant;

use crate::constants;

/// Why a transmission attempt was dropped. Mirrors the wire-visible reason
/// strings in the delivered-frame log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Collision,
    RssiTooLow,
    SnrTooLow,
    OutOfRange,
    NetworkCongestion,
    PersistentLinkFailure,
    MarginalSnr,
    RandomLoss,
    FreqMismatch,
    InvalidDestination,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::Collision => "COLLISION",
            DropReason::RssiTooLow => "RSSI_TOO_LOW",
            DropReason::SnrTooLow => "SNR_TOO_LOW",
            DropReason::OutOfRange => "OUT_OF_RANGE",
            DropReason::NetworkCongestion => "NETWORK_CONGESTION",
            DropReason::PersistentLinkFailure => "PERSISTENT_LINK_FAILURE",
            DropReason::MarginalSnr => "MARGINAL_SNR",
            DropReason::RandomLoss => "RANDOM_LOSS",
            DropReason::FreqMismatch => "FREQ_MISMATCH",
            DropReason::InvalidDestination => "INVALID_DESTINATION",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the drop-decision engine needs to judge one delivery attempt.
#[derive(Debug, Clone, Copy)]
pub struct DropContext {
    pub now: Instant,
    pub receiver_busy_until: Option<Instant>,
    pub distance_km: f64,
    pub sf: u8,
    pub rssi_dbm: f64,
    pub snr_db: f64,
    pub inflight: usize,
    pub loss_streak: u32,
}

/// Evaluates one delivery attempt. Returns `None` to keep the packet, or
/// `Some(reason)` for the labelled drop reason.
pub fn evaluate<R: Rng + ?Sized>(ctx: &DropContext, rng: &mut R) -> Option<DropReason> {
    if ctx.distance_km > constants::MAX_RANGE_KM {
        return Some(DropReason::OutOfRange);
    }

    if let Some(busy_until) = ctx.receiver_busy_until {
        if ctx.now < busy_until {
            return Some(DropReason::Collision);
        }
    }

    if ctx.rssi_dbm < constants::sf_sensitivity_dbm(ctx.sf) {
        return Some(DropReason::RssiTooLow);
    }

    let snr_min = constants::sf_snr_min(ctx.sf);
    if ctx.snr_db < snr_min {
        return Some(DropReason::SnrTooLow);
    }

    let max_range = constants::sf_max_range_km(ctx.sf);
    if ctx.distance_km > max_range {
        let ratio = ctx.distance_km / max_range;
        let p = 0.95_f64.min((ratio - 1.0).powi(2) * 0.9);
        if rng.gen::<f64>() < p {
            return Some(DropReason::OutOfRange);
        }
    }

    let p = drop_probability(ctx);
    if rng.gen::<f64>() < p {
        let inflight_ratio = ctx.inflight as f64 / constants::MAX_INFLIGHT as f64;
        return Some(if inflight_ratio > 0.8 {
            DropReason::NetworkCongestion
        } else if ctx.loss_streak > 3 {
            DropReason::PersistentLinkFailure
        } else if ctx.snr_db < snr_min + 3.0 {
            DropReason::MarginalSnr
        } else {
            DropReason::RandomLoss
        });
    }

    None
}

/// The statistical drop probability `p`, capped at 0.98.
fn drop_probability(ctx: &DropContext) -> f64 {
    let sf_offset = (ctx.sf as f64) - 7.0;
    let inflight_ratio = ctx.inflight as f64 / constants::MAX_INFLIGHT as f64;

    let congestion = inflight_ratio.powi(2) * 0.5;
    let streak = (ctx.loss_streak as f64 * 0.07).min(0.35);

    let snr_min = constants::sf_snr_min(ctx.sf);
    let snr_margin = (-(ctx.snr_db - snr_min) / (4.0 + 0.25 * sf_offset)).exp() * 0.6;

    let sensitivity = constants::sf_sensitivity_dbm(ctx.sf);
    let rssi_margin = if ctx.rssi_dbm > sensitivity + 5.0 {
        0.0
    } else {
        ((ctx.rssi_dbm - (sensitivity + 5.0)).abs() / 10.0).min(1.0) * 0.4
    };

    let interference = (0.03 * inflight_ratio) * constants::sf_interference_factor(ctx.sf);

    (congestion + streak + snr_margin + rssi_margin + interference).min(0.98)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn base_ctx() -> DropContext {
        DropContext {
            now: Instant::now(),
            receiver_busy_until: None,
            distance_km: 1.0,
            sf: 7,
            rssi_dbm: -70.0,
            snr_db: 8.0,
            inflight: 0,
            loss_streak: 0,
        }
    }

    #[test]
    fn out_of_range_always_drops_regardless_of_everything_else() {
        let ctx = DropContext { distance_km: 30.0, ..base_ctx() };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(evaluate(&ctx, &mut rng), Some(DropReason::OutOfRange));
    }

    #[test]
    fn busy_receiver_collides() {
        let ctx = DropContext {
            receiver_busy_until: Some(Instant::now() + std::time::Duration::from_secs(1)),
            ..base_ctx()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(evaluate(&ctx, &mut rng), Some(DropReason::Collision));
    }

    #[test]
    fn below_sensitivity_is_rssi_too_low() {
        let ctx = DropContext { rssi_dbm: -140.0, ..base_ctx() };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(evaluate(&ctx, &mut rng), Some(DropReason::RssiTooLow));
    }

    #[test]
    fn below_snr_floor_is_snr_too_low() {
        let ctx = DropContext { snr_db: -50.0, ..base_ctx() };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(evaluate(&ctx, &mut rng), Some(DropReason::SnrTooLow));
    }

    #[test]
    fn collision_outranks_rssi_and_snr_checks() {
        let ctx = DropContext {
            receiver_busy_until: Some(Instant::now() + std::time::Duration::from_secs(1)),
            rssi_dbm: -140.0,
            snr_db: -50.0,
            ..base_ctx()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(evaluate(&ctx, &mut rng), Some(DropReason::Collision));
    }

    #[test]
    fn comfortable_link_with_no_congestion_is_very_likely_to_be_kept() {
        let ctx = base_ctx();
        let mut kept = 0;
        for seed in 0..200u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            if evaluate(&ctx, &mut rng).is_none() {
                kept += 1;
            }
        }
        assert!(kept > 150, "kept {kept}/200");
    }

    #[test]
    fn high_inflight_biases_toward_network_congestion() {
        let ctx = DropContext { inflight: 10, ..base_ctx() };
        let mut congestion_hits = 0;
        let mut total_drops = 0;
        for seed in 0..500u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Some(reason) = evaluate(&ctx, &mut rng) {
                total_drops += 1;
                if reason == DropReason::NetworkCongestion {
                    congestion_hits += 1;
                }
            }
        }
        assert!(total_drops > 0);
        assert_eq!(congestion_hits, total_drops);
    }

    #[test]
    fn streak_above_three_biases_toward_persistent_link_failure() {
        let ctx = DropContext {
            loss_streak: 10,
            snr_db: constants::sf_snr_min(7) + 0.5,
            ..base_ctx()
        };
        let mut saw_persistent = false;
        for seed in 0..500u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            if evaluate(&ctx, &mut rng) == Some(DropReason::PersistentLinkFailure) {
                saw_persistent = true;
                break;
            }
        }
        assert!(saw_persistent);
    }

    #[test]
    fn probability_is_always_capped_at_0_98() {
        let ctx = DropContext {
            inflight: 10,
            loss_streak: 100,
            snr_db: -200.0,
            rssi_dbm: -200.0,
            ..base_ctx()
        };
        assert!(drop_probability(&ctx) <= 0.98);
    }
}
