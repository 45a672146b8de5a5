//! # Simulator Error Handling
//!
//! This module defines the `SimError` enum, which represents the error types
//! that can surface out of a `Result`-returning call in the medium simulator.
//!
//! Per-transmission outcomes (malformed frames, unknown destinations, drop
//! verdicts, write failures) are not represented here: the wire protocol is
//! fire-and-forget, so those are logged events, not returned errors (see
//! `drop_model::DropReason`). The only startup condition fatal to the process
//! is a listener bind failure.
use thiserror::Error;

/// Represents the error types that can occur in the medium simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// The listener could not bind to the configured address.
    #[error("failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
