//! Exact day optimisation as a mixed-integer linear program.

use bon::Builder;
use chrono::TimeDelta;
use good_lp::{
    Expression,
    ProblemVariables,
    Solution as _,
    SolverModel,
    Variable,
    constraint,
    microlp,
    variable,
};
use serde::Serialize;

use crate::{
    core::{
        Error,
        battery::Battery,
        day::Day,
        dispatch::{Dispatch, Dispatcher},
        trajectory::TOLERANCE,
    },
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, power::Kilowatts, rate::KilowattHourRate},
};

#[must_use]
#[derive(Builder)]
pub struct LinearProblem<'a> {
    prices: &'a [KilowattHourRate],
    demand: &'a [KilowattHours],

    #[builder(default = Day::slot_duration())]
    slot_duration: TimeDelta,

    capacity: KilowattHours,
    charging_power: Kilowatts,
    discharging_power: Kilowatts,

    #[builder(default = 1.0)]
    charging_efficiency: f64,

    #[builder(default = 1.0)]
    discharging_efficiency: f64,

    /// Battery level at the start and, again, at the end of the horizon.
    #[builder(default)]
    initial_level: KilowattHours,

    /// Cost of every kilowatt-hour charged, on top of the price.
    #[builder(default)]
    throughput_cost: KilowattHourRate,
}

/// Optimal flows within a single slot.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct ScheduleRow {
    pub price: KilowattHourRate,
    pub demand: KilowattHours,
    pub charge: KilowattHours,
    pub discharge: KilowattHours,
    pub grid: KilowattHours,

    /// Battery level at the end of the slot.
    pub level: KilowattHours,
}

#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct LinearSchedule {
    pub rows: Vec<ScheduleRow>,

    /// Objective value.
    pub total_cost: Cost,
}

impl LinearProblem<'_> {
    /// Build and solve the program.
    ///
    /// Per slot, the program decides the charge, discharge, and grid import, while a binary mode
    /// forbids charging and discharging in the same slot. The battery level follows the flows
    /// scaled by the efficiencies and returns to its initial value by the end of the horizon.
    #[instrument(skip_all, fields(n_slots = self.prices.len()))]
    pub fn solve(&self) -> Result<LinearSchedule, Error> {
        if self.prices.len() != self.demand.len() {
            return Err(Error::ShapeMismatch {
                left: "prices",
                left_len: self.prices.len(),
                right: "demand",
                right_len: self.demand.len(),
            });
        }
        for (slot, (price, demand)) in self.prices.iter().zip(self.demand).enumerate() {
            if !price.is_finite() {
                return Err(Error::NotFinite { series: "prices", slot });
            }
            if !demand.is_finite() {
                return Err(Error::NotFinite { series: "demand", slot });
            }
            if *demand < KilowattHours::ZERO {
                return Err(Error::NegativeUsage { slot, usage: *demand });
            }
        }

        let n_slots = self.prices.len();
        let max_charge = (self.charging_power * self.slot_duration).0;
        let max_discharge = (self.discharging_power * self.slot_duration).0;

        let mut variables = ProblemVariables::new();
        let charge: Vec<Variable> =
            variables.add_vector(variable().min(0.0).max(max_charge), n_slots);
        let discharge: Vec<Variable> =
            variables.add_vector(variable().min(0.0).max(max_discharge), n_slots);
        let grid: Vec<Variable> = variables.add_vector(variable().min(0.0), n_slots);
        let level: Vec<Variable> =
            variables.add_vector(variable().min(0.0).max(self.capacity.0), n_slots + 1);
        let is_charging: Vec<Variable> = variables.add_vector(variable().binary(), n_slots);

        let objective: Expression = (0..n_slots)
            .map(|slot| {
                (grid[slot] + charge[slot]) * self.prices[slot].0
                    + charge[slot] * self.throughput_cost.0
            })
            .sum();

        let mut model = variables.minimise(objective).using(microlp);
        model.add_constraint(constraint!(level[0] == self.initial_level.0));
        model.add_constraint(constraint!(level[n_slots] == self.initial_level.0));
        for slot in 0..n_slots {
            model.add_constraint(constraint!(
                level[slot + 1]
                    == level[slot] + charge[slot] * self.charging_efficiency
                        - discharge[slot] / self.discharging_efficiency
            ));
            model.add_constraint(constraint!(grid[slot] + discharge[slot] == self.demand[slot].0));
            model.add_constraint(constraint!(charge[slot] <= is_charging[slot] * max_charge));
            model.add_constraint(constraint!(
                discharge[slot] + is_charging[slot] * max_discharge <= max_discharge
            ));
        }

        let solution = model.solve()?;

        let rows: Vec<ScheduleRow> = (0..n_slots)
            .map(|slot| ScheduleRow {
                price: self.prices[slot],
                demand: self.demand[slot],
                charge: KilowattHours(solution.value(charge[slot]).max(0.0)),
                discharge: KilowattHours(solution.value(discharge[slot]).max(0.0)),
                grid: KilowattHours(solution.value(grid[slot]).max(0.0)),
                level: KilowattHours(solution.value(level[slot + 1]).max(0.0)),
            })
            .collect();
        let total_cost: Cost = rows
            .iter()
            .map(|row| (row.grid + row.charge) * row.price + row.charge * self.throughput_cost)
            .sum();
        info!(%total_cost, "solved");
        Ok(LinearSchedule { rows, total_cost })
    }
}

/// Lossless program over the day, with the same battery model as the greedy dispatcher.
#[derive(Copy, Clone, Debug)]
pub struct Linear;

impl Dispatcher for Linear {
    #[instrument(skip_all)]
    fn dispatch(&self, day: &Day, battery: &Battery) -> Result<Dispatch, Error> {
        let prices: Vec<KilowattHourRate> = day.buy_rates().collect();
        let demand: Vec<KilowattHours> = day.usage().collect();
        let schedule = LinearProblem::builder()
            .prices(&prices)
            .demand(&demand)
            .capacity(battery.effective_capacity())
            .charging_power(battery.charging_power())
            .discharging_power(battery.capacity() / Day::slot_duration())
            .throughput_cost(battery.one_kwh_cost())
            .build()
            .solve()?;
        debug!(total_cost = %schedule.total_cost, "optimal schedule found");

        let mut dispatch = Dispatch::idle(day.len());
        for (slot, row) in schedule.rows.iter().enumerate() {
            dispatch.battery_load_time[slot] = row.charge;
            dispatch.battery_use_time[slot] = row.discharge;
            dispatch.grid_time[slot] = row.grid;
        }
        dispatch.trajectory().ensure_within(battery.effective_capacity(), TOLERANCE)?;
        Ok(dispatch)
    }
}
