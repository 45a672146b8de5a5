//! # Medium Simulator Constants
//!
//! Fixed, read-only tables the link-budget (C1), airtime (C2), and
//! drop-decision (C3) models draw on. These are carried verbatim by the
//! server and are never overridable from the wire — a `tx` frame's optional
//! environmental fields only select a key into these tables.

/// Default listen address. There are no CLI flags, environment variables,
/// or config files — this is the one place the bind address is chosen.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Broadcast destination id. Never a registered node.
pub const BROADCAST_NODE_ID: u8 = 255;

/// Hard distance cap beyond which every transmission is `OUT_OF_RANGE`.
pub const MAX_RANGE_KM: f64 = 25.0;

/// Receiver bandwidth, Hz.
pub const BANDWIDTH_HZ: f64 = 125_000.0;

/// Receiver noise figure, dB.
pub const NOISE_FIGURE_DB: f64 = 6.0;

/// Carrier frequency used in the free-space path-loss term, MHz.
pub const FREQUENCY_MHZ: f64 = 915.0;

/// Ceiling on transmissions considered concurrently "in flight" before the
/// congestion term saturates.
pub const MAX_INFLIGHT: usize = 10;

pub const MIN_SF: u8 = 7;
pub const MAX_SF: u8 = 12;

/// `register`/`tx` defaults applied when the client omits the field.
pub const DEFAULT_AQI: i32 = 50;
pub const DEFAULT_WEATHER: &str = "clear";
pub const DEFAULT_OBSTACLE: &str = "open";
pub const DEFAULT_SF: u8 = 7;
pub const DEFAULT_TX_POWER_DBM: f64 = 23.0;

/// Receiver sensitivity floor per SF (SF7..SF12), dBm.
const SF_SENSITIVITY_DBM: [f64; 6] = [-123.0, -126.0, -129.0, -132.0, -134.5, -137.0];

/// (min, max) achievable SNR per SF (SF7..SF12), dB.
const SF_SNR_RANGE_DB: [(f64, f64); 6] = [
    (-7.5, 10.0),
    (-10.0, 10.5),
    (-12.5, 11.0),
    (-15.0, 11.5),
    (-17.5, 12.0),
    (-20.0, 12.5),
];

/// Nominal usable range per SF (SF7..SF12), km. Bounded above by `MAX_RANGE_KM`.
const SF_MAX_RANGE_KM: [f64; 6] = [2.0, 3.2, 5.0, 8.0, 13.0, 20.0];

/// Interference scaling factor per SF (SF7..SF12), used by the drop model's
/// congestion term.
const SF_INTERFERENCE_FACTOR: [f64; 6] = [0.7, 0.8, 0.9, 1.0, 1.1, 1.2];

fn sf_index(sf: u8) -> usize {
    (sf.clamp(MIN_SF, MAX_SF) - MIN_SF) as usize
}

/// Receiver sensitivity for the given spreading factor, dBm.
pub fn sf_sensitivity_dbm(sf: u8) -> f64 {
    SF_SENSITIVITY_DBM[sf_index(sf)]
}

/// Minimum demodulatable SNR for the given spreading factor, dB.
pub fn sf_snr_min(sf: u8) -> f64 {
    SF_SNR_RANGE_DB[sf_index(sf)].0
}

/// Theoretical maximum SNR for the given spreading factor, dB.
pub fn sf_snr_max(sf: u8) -> f64 {
    SF_SNR_RANGE_DB[sf_index(sf)].1
}

/// Nominal maximum range for the given spreading factor, km.
pub fn sf_max_range_km(sf: u8) -> f64 {
    SF_MAX_RANGE_KM[sf_index(sf)]
}

/// Interference scaling factor for the given spreading factor.
pub fn sf_interference_factor(sf: u8) -> f64 {
    SF_INTERFERENCE_FACTOR[sf_index(sf)]
}

/// Weather attenuation, dB per km, at the reference spreading factor (SF7).
/// Unknown keys fall back to `clear` (no attenuation).
pub fn weather_atten_db_per_km(key: &str) -> f64 {
    match key {
        "clear" => 0.0,
        "fog" => 0.3,
        "light" => 1.0,
        "moderate" => 2.5,
        "heavy" => 5.0,
        _ => 0.0,
    }
}

/// Obstacle penetration loss, dB, at the reference spreading factor (SF7).
/// Unknown keys fall back to `open` (no obstruction).
pub fn obstacle_loss_db(key: &str) -> f64 {
    match key {
        "open" => 0.0,
        "glass" => 2.0,
        "wood" => 4.0,
        "brick" => 8.0,
        "stone" => 12.0,
        "concrete" => 15.0,
        "reinforced_concrete" => 25.0,
        _ => 0.0,
    }
}
