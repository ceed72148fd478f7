use serde::{Deserialize, Serialize};

use crate::{
    core::{
        Error,
        arbitrage,
        battery::Battery,
        day::Day,
        greedy::{Greedy, Order},
        linear::Linear,
        trajectory::Trajectory,
    },
    prelude::*,
    quantity::energy::KilowattHours,
};

/// Per-slot energy flows of a dispatched day.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    /// Energy charged into the battery to cover later usage.
    pub battery_load_time: Vec<KilowattHours>,

    /// Energy discharged to cover the slot's usage.
    pub battery_use_time: Vec<KilowattHours>,

    /// Usage served straight from the grid.
    pub grid_time: Vec<KilowattHours>,

    /// Energy bought for resale.
    pub buy_time: Vec<KilowattHours>,

    /// Energy sold back to the grid.
    pub sell_time: Vec<KilowattHours>,
}

impl Dispatch {
    pub fn idle(n_slots: usize) -> Self {
        Self {
            battery_load_time: vec![KilowattHours::ZERO; n_slots],
            battery_use_time: vec![KilowattHours::ZERO; n_slots],
            grid_time: vec![KilowattHours::ZERO; n_slots],
            buy_time: vec![KilowattHours::ZERO; n_slots],
            sell_time: vec![KilowattHours::ZERO; n_slots],
        }
    }

    pub const fn len(&self) -> usize {
        self.battery_load_time.len()
    }

    /// Battery level after each slot.
    pub fn trajectory(&self) -> Trajectory {
        Trajectory::from_flows(
            [self.battery_load_time.as_slice(), self.buy_time.as_slice()],
            [self.battery_use_time.as_slice(), self.sell_time.as_slice()],
            self.len(),
        )
    }

    /// Total energy that went into the battery.
    pub fn total_charged(&self) -> KilowattHours {
        self.battery_load_time.iter().chain(&self.buy_time).copied().sum()
    }

    pub fn total_sold(&self) -> KilowattHours {
        self.sell_time.iter().copied().sum()
    }
}

/// Decides the energy flows of a day.
pub trait Dispatcher {
    fn dispatch(&self, day: &Day, battery: &Battery) -> Result<Dispatch, Error>;
}

/// Selectable dispatch strategy.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Heap-based greedy dispatcher, slots served in time order.
    Greedy,

    /// Heap-based greedy dispatcher, the most expensive slots served first.
    GreedyByPrice,

    /// Mixed-integer linear program, falling back to the greedy dispatcher on a solver failure.
    Linear,
}

impl Strategy {
    #[instrument(skip_all, fields(strategy = ?self, load_to_sell = load_to_sell))]
    pub fn dispatch(
        self,
        day: &Day,
        battery: &Battery,
        load_to_sell: bool,
    ) -> Result<Dispatch, Error> {
        let mut dispatch = match self {
            Self::Greedy => Greedy::new(Order::Chronological).dispatch(day, battery)?,
            Self::GreedyByPrice => Greedy::new(Order::MostExpensiveFirst).dispatch(day, battery)?,
            Self::Linear => or_greedy(Linear.dispatch(day, battery), day, battery)?,
        };
        if load_to_sell {
            let profit = arbitrage::load_only_to_sell(day, battery, &mut dispatch);
            info!(%profit, sold = %dispatch.total_sold(), "arbitrage completed");
        }
        Ok(dispatch)
    }
}

/// Replace a solver failure with the chronological greedy dispatch, pass anything else through.
fn or_greedy(
    result: Result<Dispatch, Error>,
    day: &Day,
    battery: &Battery,
) -> Result<Dispatch, Error> {
    match result {
        Err(error) if error.is_solver_failure() => {
            warn!(%error, "falling back to the greedy dispatcher…");
            Greedy::new(Order::Chronological).dispatch(day, battery)
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use good_lp::ResolutionError;

    use super::*;
    use crate::core::{
        battery::fixtures::battery,
        day::{SLOTS_PER_DAY, fixtures},
    };

    #[test]
    fn test_idle_trajectory() {
        let dispatch = Dispatch::idle(SLOTS_PER_DAY);
        assert_eq!(dispatch.trajectory().levels(), [KilowattHours::ZERO; SLOTS_PER_DAY]);
        assert_eq!(dispatch.total_charged(), KilowattHours::ZERO);
    }

    #[test]
    fn test_strategies_are_deterministic() -> Result<(), Error> {
        let day = fixtures::pseudo_random_day(7);
        let battery = battery(5.0, 0.05);
        for strategy in [Strategy::Greedy, Strategy::GreedyByPrice] {
            for load_to_sell in [false, true] {
                assert_eq!(
                    strategy.dispatch(&day, &battery, load_to_sell)?,
                    strategy.dispatch(&day, &battery, load_to_sell)?,
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_arbitrage_only_when_asked() -> Result<(), Error> {
        let day = fixtures::pseudo_random_day(11);
        let battery = battery(5.0, 0.01);
        let dispatch = Strategy::Greedy.dispatch(&day, &battery, false)?;
        assert_eq!(dispatch.total_sold(), KilowattHours::ZERO);
        Ok(())
    }

    #[test]
    fn test_solver_failure_falls_back_to_greedy() -> Result<(), Error> {
        let day = fixtures::pseudo_random_day(3);
        let battery = battery(5.0, 0.05);
        let failure = Err(Error::Solver(ResolutionError::Infeasible));
        assert_eq!(
            or_greedy(failure, &day, &battery)?,
            Greedy::new(Order::Chronological).dispatch(&day, &battery)?,
        );
        Ok(())
    }

    #[test]
    fn test_other_errors_are_not_masked() {
        let day = fixtures::pseudo_random_day(3);
        let battery = battery(5.0, 0.05);
        let failure = Err(Error::Underflow { slot: 1, level: KilowattHours(-1.0) });
        let result = or_greedy(failure, &day, &battery);
        assert!(matches!(result, Err(Error::Underflow { slot: 1, .. })));
    }

    #[test]
    fn test_linear_strategy_dispatches() -> Result<(), Error> {
        let day = fixtures::pseudo_random_day(5);
        let battery = battery(5.0, 0.05);
        let dispatch = Strategy::Linear.dispatch(&day, &battery, true)?;
        assert_eq!(dispatch.len(), SLOTS_PER_DAY);
        Ok(())
    }
}
