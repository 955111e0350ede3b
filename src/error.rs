//! Error types for the HOS planner.

use thiserror::Error;

/// Failure modes exposed by the [`MapProvider`](crate::services::map_provider::MapProvider)
/// port.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("address not found: {0}")]
    NotFound(String),

    #[error("map provider request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("map provider transport error: {0}")]
    Transport(String),
}

/// Failure modes for [`crate::planner::plan`] (§7 of the design doc).
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("trip requires {needed:.2}h of driving but only {available:.2}h remain in the cycle")]
    InfeasibleCycle { needed: f64, available: f64 },

    #[error("map provider error: {0}")]
    MapError(#[from] MapError),

    #[error("duty timeline invariant violated: {0}")]
    TimelineError(String),
}
