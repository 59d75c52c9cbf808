use thiserror::Error;

use crate::domain::BatteryError;

/// Errors surfaced by the simulation core's public operations.
///
/// `Infeasible` and `Overrun` are never returned to a caller directly (the
/// system keeps serving requests on the last feasible schedule); they exist
/// here so the tick loop and the planner can log them through the same
/// vocabulary the request handlers use.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    OutOfRange(#[from] BatteryError),

    #[error("no finished battery available for dispatch")]
    Rejected,

    #[error("unknown drone id: {0}")]
    UnknownDrone(String),

    #[error("demand cannot be met even with an unconstrained schedule")]
    Infeasible,

    #[error("re-plan exceeded its time budget")]
    Overrun,
}
