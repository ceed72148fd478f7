//! Heap-based greedy dispatcher.
//!
//! Every slot offers a charging opportunity: up to one slot's worth of charging at the slot's
//! buy rate plus the amortised cycling cost. Usage is covered from the cheapest earlier
//! opportunity as long as it beats buying at the slot itself and the battery has room
//! for the energy all the way from the origin to the slot.
//!
//! Served chronologically, a slot stops drawing at the first cheaper opportunity that is blocked.
//! Served by price, blocked opportunities are put aside and the next cheapest one is tried.

mod opportunity;

use std::{cmp::Reverse, collections::BinaryHeap};

use itertools::Itertools;

use self::opportunity::Opportunity;
use crate::{
    core::{
        Error,
        battery::Battery,
        day::Day,
        dispatch::{Dispatch, Dispatcher},
        trajectory::{NEGLIGIBLE, TOLERANCE, Trajectory},
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Order in which the slots are served.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Order {
    /// Slot by slot, each opportunity opens right before its slot is served.
    Chronological,

    /// All opportunities open upfront, the most expensive slots are served first.
    MostExpensiveFirst,
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Greedy {
    order: Order,
}

impl Greedy {
    pub const fn new(order: Order) -> Self {
        Self { order }
    }
}

impl Dispatcher for Greedy {
    #[instrument(skip_all, fields(order = ?self.order))]
    fn dispatch(&self, day: &Day, battery: &Battery) -> Result<Dispatch, Error> {
        let mut state = State::new(day, battery, self.order);
        match self.order {
            Order::Chronological => {
                for slot in 0..day.len() {
                    state.open(slot);
                    state.serve(slot);
                }
            }
            Order::MostExpensiveFirst => {
                (0..day.len()).for_each(|slot| state.open(slot));
                for slot in (0..day.len())
                    .sorted_by_key(|&slot| (Reverse(day.slots()[slot].buy_rate), slot))
                {
                    state.serve(slot);
                }
            }
        }
        let dispatch = state.dispatch;
        dispatch.trajectory().ensure_within(battery.effective_capacity(), TOLERANCE)?;
        debug!(
            charged = %dispatch.total_charged(),
            from_grid = %dispatch.grid_time.iter().copied().sum::<KilowattHours>(),
            "dispatched",
        );
        Ok(dispatch)
    }
}

struct State<'a> {
    day: &'a Day,
    battery: &'a Battery,
    order: Order,
    opportunities: BinaryHeap<Reverse<Opportunity>>,

    /// Running battery level, kept in sync with the dispatch.
    trajectory: Trajectory,

    dispatch: Dispatch,
}

impl<'a> State<'a> {
    fn new(day: &'a Day, battery: &'a Battery, order: Order) -> Self {
        Self {
            day,
            battery,
            order,
            opportunities: BinaryHeap::with_capacity(day.len()),
            trajectory: Trajectory::empty(day.len()),
            dispatch: Dispatch::idle(day.len()),
        }
    }

    fn open(&mut self, slot: usize) {
        self.opportunities.push(Reverse(Opportunity {
            remaining: self.battery.charging_per_segment(),
            cost: self.day.slots()[slot].buy_rate + self.battery.one_kwh_cost(),
            origin: slot,
        }));
    }

    /// Cover the slot's usage from the cheaper opportunities, and the rest from the grid.
    fn serve(&mut self, slot: usize) {
        let rate = self.day.slots()[slot].buy_rate;
        let mut needed = self.day.slots()[slot].usage;
        let mut blocked = Vec::new();

        while needed > NEGLIGIBLE {
            let Some(&Reverse(opportunity)) = self.opportunities.peek() else {
                break;
            };
            if opportunity.cost >= rate {
                break;
            }
            let headroom = if opportunity.origin < slot {
                self.battery.effective_capacity() - self.trajectory.peak(opportunity.origin..slot)
            } else {
                KilowattHours::ZERO
            };
            if headroom <= NEGLIGIBLE {
                match self.order {
                    Order::Chronological => break,
                    Order::MostExpensiveFirst => {
                        self.opportunities.pop();
                        blocked.push(opportunity);
                        continue;
                    }
                }
            }
            self.opportunities.pop();

            let energy = opportunity.remaining.min(needed).min(headroom);
            trace!(slot, origin = opportunity.origin, %energy, cost = %opportunity.cost, "drawing");
            needed -= energy;
            self.dispatch.battery_use_time[slot] += energy;
            self.dispatch.battery_load_time[opportunity.origin] += energy;
            self.trajectory.raise(opportunity.origin..slot, energy);
            if let Some(rest) = opportunity.drawn(energy) {
                self.opportunities.push(Reverse(rest));
            }
        }

        self.dispatch.grid_time[slot] += needed;
        self.opportunities.extend(blocked.into_iter().map(Reverse));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::core::{
        battery::fixtures::{battery, shallow_battery},
        benchmark::Benchmark,
        day::{SLOTS_PER_DAY, fixtures},
    };
    use crate::quantity::cost::Cost;

    const ORDERS: [Order; 2] = [Order::Chronological, Order::MostExpensiveFirst];

    #[test]
    fn test_flat_price_stays_on_grid() -> Result<(), Error> {
        let day = fixtures::flat_sell(&[1.0; SLOTS_PER_DAY], &[0.05; SLOTS_PER_DAY]);
        let battery = battery(5.0, 0.1);
        for order in ORDERS {
            let dispatch = Greedy::new(order).dispatch(&day, &battery)?;
            assert_eq!(dispatch.total_charged(), KilowattHours::ZERO);
            assert_eq!(dispatch.grid_time, [KilowattHours(0.05); SLOTS_PER_DAY]);
            let report =
                Benchmark::builder().day(&day).battery(&battery).build().evaluate(&dispatch)?;
            assert_abs_diff_eq!(report.cost.0, 96.0 * 0.05 * 1.0, epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_cheap_morning_covers_evening() -> Result<(), Error> {
        let mut buy_rates = [0.1; SLOTS_PER_DAY];
        buy_rates[48..].fill(1.0);
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[90] = 0.2;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = battery(5.0, 0.1);

        for order in ORDERS {
            let dispatch = Greedy::new(order).dispatch(&day, &battery)?;
            assert_abs_diff_eq!(dispatch.battery_use_time[90].0, 0.2, epsilon = 1e-12);
            assert_abs_diff_eq!(dispatch.total_charged().0, 0.2, epsilon = 1e-12);
            assert!(
                dispatch.battery_load_time[48..].iter().all(|energy| *energy == KilowattHours::ZERO)
            );
            assert_eq!(dispatch.grid_time[90], KilowattHours::ZERO);

            let report =
                Benchmark::builder().day(&day).battery(&battery).build().evaluate(&dispatch)?;
            assert_abs_diff_eq!(report.cost.0, 0.2 * (0.1 + 0.1), epsilon = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn test_ties_favour_earliest_origin() -> Result<(), Error> {
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[10] = 0.2;
        buy_rates[20] = 0.2;
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[30] = 0.5;
        let day = fixtures::flat_sell(&buy_rates, &usage);

        let dispatch = Greedy::new(Order::Chronological).dispatch(&day, &battery(5.0, 0.1))?;
        assert_abs_diff_eq!(dispatch.battery_load_time[10].0, 0.5, epsilon = 1e-12);
        assert_eq!(dispatch.battery_load_time[20], KilowattHours::ZERO);
        Ok(())
    }

    #[test]
    fn test_rate_limit_spreads_charging() -> Result<(), Error> {
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[..4].fill(0.2);
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[80] = 2.5;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = battery(5.0, 0.1);

        let dispatch = Greedy::new(Order::Chronological).dispatch(&day, &battery)?;
        for slot in 0..2 {
            assert_abs_diff_eq!(dispatch.battery_load_time[slot].0, 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(dispatch.battery_load_time[2].0, 0.5, epsilon = 1e-12);
        assert_eq!(dispatch.grid_time[80], KilowattHours::ZERO);
        Ok(())
    }

    #[test]
    fn test_capacity_caps_storage() -> Result<(), Error> {
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[..8].fill(0.2);
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[80] = 3.0;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = battery(2.0, 0.1);

        for order in ORDERS {
            let dispatch = Greedy::new(order).dispatch(&day, &battery)?;
            assert_abs_diff_eq!(dispatch.battery_use_time[80].0, 2.0, epsilon = 1e-12);
            assert_abs_diff_eq!(dispatch.grid_time[80].0, 1.0, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_blocked_opportunity_stops_chronological_drawing() -> Result<(), Error> {
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[0] = 0.1;
        buy_rates[10] = 0.5;
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[5] = 0.5;
        usage[20] = 0.5;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = battery(0.5, 0.1);

        // Slot 0 is the cheapest but the battery is full until slot 5, so slot 10 is never tried.
        let chronological = Greedy::new(Order::Chronological).dispatch(&day, &battery)?;
        assert_abs_diff_eq!(chronological.battery_load_time[0].0, 0.5, epsilon = 1e-12);
        assert_eq!(chronological.battery_load_time[10], KilowattHours::ZERO);
        assert_abs_diff_eq!(chronological.grid_time[20].0, 0.5, epsilon = 1e-12);

        // Served by price, the blocked slot 0 is put aside and slot 10 covers slot 20.
        let by_price = Greedy::new(Order::MostExpensiveFirst).dispatch(&day, &battery)?;
        assert_abs_diff_eq!(by_price.battery_load_time[0].0, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(by_price.battery_load_time[10].0, 0.5, epsilon = 1e-12);
        assert_eq!(by_price.grid_time[20], KilowattHours::ZERO);
        Ok(())
    }

    #[test]
    fn test_depth_of_discharge_caps_storage() -> Result<(), Error> {
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[..8].fill(0.2);
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[80] = 3.0;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = shallow_battery(4.0, 0.1, 0.5);

        for order in ORDERS {
            let dispatch = Greedy::new(order).dispatch(&day, &battery)?;
            assert_abs_diff_eq!(dispatch.battery_use_time[80].0, 2.0, epsilon = 1e-12);
            assert_abs_diff_eq!(dispatch.grid_time[80].0, 1.0, epsilon = 1e-12);
            Benchmark::builder().day(&day).battery(&battery).build().evaluate(&dispatch)?;
        }
        Ok(())
    }

    #[test]
    fn test_most_expensive_first_prioritises_peak() -> Result<(), Error> {
        // One cheap slot, then two consumers: the later one is pricier.
        let mut buy_rates = [1.0; SLOTS_PER_DAY];
        buy_rates[0] = 0.1;
        buy_rates[60] = 2.0;
        let mut usage = [0.0; SLOTS_PER_DAY];
        usage[40] = 1.0;
        usage[60] = 1.0;
        let day = fixtures::flat_sell(&buy_rates, &usage);
        let battery = battery(1.0, 0.1);

        let chronological = Greedy::new(Order::Chronological).dispatch(&day, &battery)?;
        assert_abs_diff_eq!(chronological.battery_use_time[40].0, 1.0, epsilon = 1e-12);

        let by_price = Greedy::new(Order::MostExpensiveFirst).dispatch(&day, &battery)?;
        assert_abs_diff_eq!(by_price.battery_use_time[60].0, 1.0, epsilon = 1e-12);
        assert_eq!(by_price.battery_use_time[40], KilowattHours::ZERO);
        Ok(())
    }

    #[test]
    fn test_pseudo_random_days_hold_invariants() -> Result<(), Error> {
        for seed in 0..20 {
            let day = fixtures::pseudo_random_day(seed);
            for capacity in [1.0, 5.0, 10.0] {
                let battery = battery(capacity, 0.05);
                let benchmark = Benchmark::builder().day(&day).battery(&battery).build();
                for order in ORDERS {
                    let dispatch = Greedy::new(order).dispatch(&day, &battery)?;
                    let report = benchmark.evaluate(&dispatch)?;
                    assert!(report.cost <= report.grid_only_cost + Cost(1e-9));
                }
            }
        }
        Ok(())
    }
}
