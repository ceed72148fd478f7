use crate::quantity::energy::KilowattHours;

/// Failures of the dispatch core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`{series}` must have {expected} slots, got {actual}")]
    SeriesLength { series: &'static str, expected: usize, actual: usize },

    #[error("`{left}` has {left_len} values, but `{right}` has {right_len}")]
    ShapeMismatch { left: &'static str, left_len: usize, right: &'static str, right_len: usize },

    #[error("usage at slot #{slot} is negative: {usage}")]
    NegativeUsage { slot: usize, usage: KilowattHours },

    #[error("`{series}` at slot #{slot} is not a finite number")]
    NotFinite { series: &'static str, slot: usize },

    #[error("energy is not conserved: {supplied} supplied for {consumed} consumed")]
    EnergyNotConserved { supplied: KilowattHours, consumed: KilowattHours },

    #[error("battery overloaded after slot #{slot}: {level} stored in {capacity}")]
    Overload { slot: usize, level: KilowattHours, capacity: KilowattHours },

    #[error("battery drained below empty after slot #{slot}: {level} stored")]
    Underflow { slot: usize, level: KilowattHours },

    #[error("charge rate exceeded at slot #{slot}: {charged} charged, {limit} allowed")]
    RateLimitExceeded { slot: usize, charged: KilowattHours, limit: KilowattHours },

    #[error("solver failed: {0}")]
    Solver(#[from] good_lp::ResolutionError),
}

impl Error {
    pub const fn is_solver_failure(&self) -> bool {
        matches!(self, Self::Solver(_))
    }
}
