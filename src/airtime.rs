//! # Airtime & Delay Model (C2)
//!
//! Semtech time-on-air for the modulated packet, plus propagation time, an
//! SNR-dependent processing penalty, a weather/obstacle media factor, and
//! jitter, combined into the delay the dispatcher (C4) sleeps before
//! delivering a frame.
use rand::Rng;

use crate::constants::{self, BANDWIDTH_HZ};

const PREAMBLE_LEN: f64 = 8.0;
const SNR_PENALTY_MAX_MS: f64 = 50.0;
const SNR_PENALTY_K: f64 = 1.5;

/// Semtech time-on-air, in milliseconds, for `payload_len` bytes at the
/// given spreading factor.
pub fn time_on_air_ms(payload_len: usize, sf: u8) -> f64 {
    let sf_f = sf as f64;
    let de = if sf >= 11 { 1.0 } else { 0.0 };
    let ih = 0.0;
    let cr = 1.0; // 4/5 coding rate

    let symbol_time_s = 2f64.powf(sf_f) / BANDWIDTH_HZ;

    let numerator = 8.0 * payload_len as f64 - 4.0 * sf_f + 28.0 + 16.0 - 20.0 * ih;
    let denominator = 4.0 * (sf_f - 2.0 * de);
    let n_payload = 8.0 + ((numerator / denominator).ceil() * (cr + 4.0)).max(0.0);

    ((PREAMBLE_LEN + 4.25) + n_payload) * symbol_time_s * 1000.0
}

/// SNR-dependent processing-delay penalty, in milliseconds. Worst near the
/// sensitivity floor, vanishing well above it.
fn snr_penalty_ms(snr_db: f64, sf: u8) -> f64 {
    let snr_min = constants::sf_snr_min(sf);
    let snr_max = constants::sf_snr_max(sf);
    let mid = snr_min + (snr_max - snr_min) / 3.0;
    SNR_PENALTY_MAX_MS / (1.0 + (SNR_PENALTY_K * (snr_db - mid)).exp())
}

/// Weather/obstacle media factor applied to a base processing time that
/// itself grows with spreading factor.
fn media_delay_ms(weather: &str, obstacle: &str, sf: u8) -> f64 {
    let sf_offset = (sf as f64) - 7.0;
    let base = 2.0 + 1.5 * sf_offset;

    let weather_factor = (1.0 + constants::weather_atten_db_per_km(weather) / 20.0)
        * (1.0 - 0.03 * sf_offset);
    let obstacle_factor = (1.0 + constants::obstacle_loss_db(obstacle) / 50.0)
        * (1.0 - 0.03 * sf_offset);

    base * weather_factor * obstacle_factor
}

/// Inputs to the total delivery-delay computation.
#[derive(Debug, Clone, Copy)]
pub struct DelayInput<'a> {
    pub payload_len: usize,
    pub sf: u8,
    pub distance_km: f64,
    pub snr_db: f64,
    pub weather: &'a str,
    pub obstacle: &'a str,
}

/// Total delivery delay, in milliseconds: time-on-air, propagation, the
/// SNR penalty, the media factor, and jitter.
pub fn total_delay_ms<R: Rng + ?Sized>(input: &DelayInput, rng: &mut R) -> f64 {
    let t_air = time_on_air_ms(input.payload_len, input.sf);
    let propagation = input.distance_km / 300_000.0 * 1000.0;
    let snr_penalty = snr_penalty_ms(input.snr_db, input.sf);
    let media = media_delay_ms(input.weather, input.obstacle, input.sf);
    let jitter = rng.gen_range(0.5..=3.0) * (input.sf as f64 / 7.0);

    t_air + propagation + snr_penalty + media + jitter
}
