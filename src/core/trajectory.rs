//! Battery level over the day.

use std::ops::Range;

use crate::{core::Error, quantity::energy::KilowattHours};

/// Slack allowed on every energy check.
pub const TOLERANCE: KilowattHours = KilowattHours(0.05);

/// Energy below which nothing is worth moving.
pub const NEGLIGIBLE: KilowattHours = KilowattHours(1e-9);

/// Battery level at the end of each slot.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trajectory(Vec<KilowattHours>);

impl Trajectory {
    /// Accumulate the inflows minus the outflows, slot by slot.
    pub fn from_flows<'a>(
        inflows: impl IntoIterator<Item = &'a [KilowattHours]>,
        outflows: impl IntoIterator<Item = &'a [KilowattHours]>,
        len: usize,
    ) -> Self {
        let mut deltas = vec![KilowattHours::ZERO; len];
        for inflow in inflows {
            for (delta, energy) in deltas.iter_mut().zip(inflow) {
                *delta += *energy;
            }
        }
        for outflow in outflows {
            for (delta, energy) in deltas.iter_mut().zip(outflow) {
                *delta -= *energy;
            }
        }
        let mut level = KilowattHours::ZERO;
        Self(
            deltas
                .into_iter()
                .map(|delta| {
                    level += delta;
                    level
                })
                .collect(),
        )
    }

    /// Empty battery over the whole day.
    pub fn empty(len: usize) -> Self {
        Self(vec![KilowattHours::ZERO; len])
    }

    /// Keep the energy stored at the end of every slot in the range.
    pub fn raise(&mut self, range: Range<usize>, energy: KilowattHours) {
        for level in &mut self.0[range] {
            *level += energy;
        }
    }

    pub fn levels(&self) -> &[KilowattHours] {
        &self.0
    }

    /// Highest level at the end of the slots in the range, or zero for an empty range.
    pub fn peak(&self, range: Range<usize>) -> KilowattHours {
        self.0[range].iter().copied().max().unwrap_or(KilowattHours::ZERO)
    }

    /// Fail on the first level outside `[-tolerance, capacity + tolerance]`.
    pub fn ensure_within(
        &self,
        capacity: KilowattHours,
        tolerance: KilowattHours,
    ) -> Result<(), Error> {
        for (slot, &level) in self.0.iter().enumerate() {
            if level > capacity + tolerance {
                return Err(Error::Overload { slot, level, capacity });
            }
            if level < -tolerance {
                return Err(Error::Underflow { slot, level });
            }
        }
        Ok(())
    }
}
