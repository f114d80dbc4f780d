//! Errors raised while configuring a simulation.

use crate::{LaneId, LinkId};
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or configuring a simulation.
///
/// Per-tick numerical edge cases are never reported through this type;
/// they stay local to the affected vehicle.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("setting this leader would create a cycle in the leader chain")]
    LeaderCycle,

    #[error("resolution order is not a permutation of the {expected} existing ids")]
    InvalidOrder { expected: usize },

    #[error("vehicles cannot be added once the simulation has started")]
    RunInProgress,

    #[error("vehicle is already in a lane")]
    AlreadyInLane,

    #[error("no lane with id {0:?}")]
    UnknownLane(LaneId),

    #[error("no link with id {0:?}")]
    UnknownLink(LinkId),
}

/// Checks that a parameter is finite and strictly positive.
pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}

/// Checks that a parameter is finite and not negative.
pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::InvalidParameter { name, value })
    }
}
