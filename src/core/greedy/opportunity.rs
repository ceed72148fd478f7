use std::cmp::Ordering;

use crate::{
    core::trajectory::NEGLIGIBLE,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

/// Energy that can still be drawn from the grid at `origin` and used later.
#[derive(Copy, Clone, Debug)]
pub struct Opportunity {
    pub remaining: KilowattHours,

    /// Buy rate at the origin plus the battery cycling cost.
    pub cost: KilowattHourRate,

    pub origin: usize,
}

impl Opportunity {
    /// The opportunity left after drawing the energy, if anything is left.
    pub fn drawn(self, energy: KilowattHours) -> Option<Self> {
        let remaining = self.remaining - energy;
        (remaining > NEGLIGIBLE).then_some(Self { remaining, ..self })
    }
}

impl PartialEq for Opportunity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Opportunity {}

impl PartialOrd for Opportunity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Opportunity {
    /// Cheaper first, then earlier.
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost.cmp(&other.cost).then_with(|| self.origin.cmp(&other.origin))
    }
}
