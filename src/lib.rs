//! # lora-medium-sim - A Simulated LoRa Radio Medium Over TCP
//!
//! `lora-medium-sim` plays the part of the RF medium for a network of
//! simulated RFM9x-class LoRa nodes. Nodes connect over TCP, register a
//! location and listening frequency, and submit transmissions; the server
//! computes per-receiver path loss, RSSI, SNR, time-on-air, and a drop
//! verdict with a labelled reason, then delivers or drops accordingly,
//! enforcing a half-duplex busy window on every receiver.
//!
//! ## Features
//!
//! - A link-budget model (distance, spreading factor, weather, obstacles,
//!   air quality) producing RSSI and SNR
//! - Semtech time-on-air plus an SNR/media/jitter delay model
//! - A drop-decision engine with congestion and loss-streak memory
//! - Unicast and frequency-filtered broadcast fan-out
//! - A shared registry of connected nodes, busy windows, and loss streaks
//! - Graceful, signal-driven shutdown
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! lora-medium-sim = "0.1.0"
//! ```
//!
//! ```rust,no_run
//! use lora_medium_sim::{init_logger, run_server, constants::DEFAULT_BIND_ADDR};
//!
//! #[tokio::main]
//! async fn main() {
//!     init_logger();
//!     let addr = DEFAULT_BIND_ADDR.parse().unwrap();
//!     run_server(addr).await.unwrap();
//! }
//! ```

pub mod airtime;
pub mod constants;
pub mod dispatcher;
pub mod drop_model;
pub mod error;
pub mod link_budget;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod rng;
pub mod server;
pub mod session;

pub use crate::error::SimError;
pub use crate::logging::{init_logger, log_debug, log_error, log_info, log_warn};
pub use crate::server::run as run_server;
