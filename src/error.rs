//! Error types shared by every part of the simulation.

use crate::models::intersection::{IntersectionId, Side};

/// Top-level error for the simulation library and binary.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// A control or phase-event channel could not be created.
    #[error("channel setup failed: {reason}")]
    ChannelSetup {
        /// Explanation of what is wrong with the channel configuration.
        reason: String,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A high-priority vehicle appeared somewhere no corridor starts.
    #[error("invalid emergency spawn at {intersection} {side}")]
    InvalidEmergencySpawn {
        intersection: IntersectionId,
        side: Side,
    },

    /// A phase-event tag did not match any of the six known tags.
    #[error("unknown phase tag {0:?}")]
    UnknownPhaseTag(String),

    /// A control token did not match any known signal.
    #[error("unknown control token {0:?}")]
    UnknownControlToken(String),

    /// The emergency gate was closed because the simulation is shutting down.
    #[error("emergency corridor unavailable: simulation is shutting down")]
    CorridorUnavailable,

    /// Serializing a record to JSON failed.
    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}
