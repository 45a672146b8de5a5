//! # Wire Protocol
//!
//! Typed frame variants for the line-delimited JSON protocol nodes speak to
//! the server. Decoding failures (malformed JSON, an unrecognized `"type"`)
//! are the session's problem (§4.5): this module only distinguishes the
//! shapes it knows about and lets `serde_json` reject the rest.
use serde::{Deserialize, Serialize};

use crate::constants;

/// A frame received from a connected node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    Register(RegisterFrame),
    Tx(TxFrame),
}

/// `{"type":"register","node_id":<u8>,"location":[x_km,y_km],"frequency":<MHz>}`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterFrame {
    pub node_id: u8,
    pub location: (f64, f64),
    pub frequency: f64,
}

/// `{"type":"tx","from":<u8>,"data":"...","meta":{...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct TxFrame {
    pub from: u8,
    pub data: String,
    pub meta: TxMeta,
}

/// Per-transmission metadata. Environmental fields are optional overrides;
/// a missing field falls back to the matching `constants::DEFAULT_*`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TxMeta {
    pub destination: u8,
    pub node: u8,
    pub identifier: u8,
    pub flags: u8,
    pub tx_power: f64,
    #[serde(default)]
    pub aqi: Option<i32>,
    #[serde(default)]
    pub weather: Option<String>,
    #[serde(default)]
    pub obstacle: Option<String>,
    #[serde(default)]
    pub sf: Option<u8>,
    pub timestamp: f64,
}

impl TxMeta {
    pub fn aqi(&self) -> i32 {
        self.aqi.unwrap_or(constants::DEFAULT_AQI)
    }

    pub fn weather(&self) -> &str {
        self.weather.as_deref().unwrap_or(constants::DEFAULT_WEATHER)
    }

    pub fn obstacle(&self) -> &str {
        self.obstacle.as_deref().unwrap_or(constants::DEFAULT_OBSTACLE)
    }

    pub fn sf(&self) -> u8 {
        self.sf.unwrap_or(constants::DEFAULT_SF)
    }

    pub fn tx_power_dbm(&self) -> f64 {
        self.tx_power
    }
}

/// A `tx` frame re-emitted to a receiving node, with server-added `rssi`/`snr`.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveredFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub from: u8,
    pub data: String,
    pub meta: TxMeta,
    pub rssi: f64,
    pub snr: f64,
}

impl DeliveredFrame {
    pub fn from_tx(tx: &TxFrame, rssi: f64, snr: f64) -> Self {
        DeliveredFrame {
            frame_type: "tx",
            from: tx.from,
            data: tx.data.clone(),
            meta: tx.meta.clone(),
            rssi: round2(rssi),
            snr: round2(snr),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
