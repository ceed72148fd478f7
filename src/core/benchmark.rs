//! Cost accounting and schedule validation.

use bon::Builder;
use serde::Serialize;

use crate::{
    core::{
        Error,
        battery::Battery,
        day::Day,
        dispatch::Dispatch,
        trajectory::TOLERANCE,
    },
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours},
};

/// Months are counted as 30 days.
pub const DAYS_PER_MONTH: f64 = 30.0;

#[must_use]
#[derive(Builder)]
pub struct Benchmark<'a> {
    day: &'a Day,
    battery: &'a Battery,

    #[builder(default = TOLERANCE)]
    tolerance: KilowattHours,
}

impl Benchmark<'_> {
    /// Cost of serving the whole usage straight from the grid.
    pub fn grid_only_cost(&self) -> Cost {
        self.day.slots().iter().map(|slot| slot.usage * slot.buy_rate).sum()
    }

    /// Cost of the dispatched day, including the battery cycling and minus the sales.
    pub fn total_cost(&self, dispatch: &Dispatch) -> Cost {
        let one_kwh_cost = self.battery.one_kwh_cost();
        self.day
            .slots()
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                dispatch.grid_time[index] * slot.buy_rate
                    + (dispatch.battery_load_time[index] + dispatch.buy_time[index])
                        * (slot.buy_rate + one_kwh_cost)
                    - dispatch.sell_time[index] * slot.sell_rate
            })
            .sum()
    }

    /// Check the dispatch shape, energy conservation, the battery bounds, and the charge rate.
    pub fn validate(&self, dispatch: &Dispatch) -> Result<(), Error> {
        for (name, series) in [
            ("battery load time", &dispatch.battery_load_time),
            ("battery use time", &dispatch.battery_use_time),
            ("grid time", &dispatch.grid_time),
            ("buy time", &dispatch.buy_time),
            ("sell time", &dispatch.sell_time),
        ] {
            if series.len() != self.day.len() {
                return Err(Error::ShapeMismatch {
                    left: "day",
                    left_len: self.day.len(),
                    right: name,
                    right_len: series.len(),
                });
            }
        }

        let supplied: KilowattHours =
            dispatch.battery_load_time.iter().chain(&dispatch.grid_time).copied().sum();
        let consumed = self.day.total_usage();
        if (supplied - consumed).abs() > self.tolerance {
            return Err(Error::EnergyNotConserved { supplied, consumed });
        }

        dispatch.trajectory().ensure_within(self.battery.effective_capacity(), self.tolerance)?;

        let limit = self.battery.charging_per_segment();
        for (slot, (&loaded, &bought)) in
            dispatch.battery_load_time.iter().zip(&dispatch.buy_time).enumerate()
        {
            let charged = loaded + bought;
            if charged > limit + self.tolerance {
                return Err(Error::RateLimitExceeded { slot, charged, limit });
            }
        }

        Ok(())
    }

    /// Validate the dispatch and summarise it.
    #[instrument(skip_all)]
    pub fn evaluate(&self, dispatch: &Dispatch) -> Result<Report, Error> {
        self.validate(dispatch)?;
        let report = Report {
            cost: self.total_cost(dispatch),
            grid_only_cost: self.grid_only_cost(),
            charged: dispatch.total_charged(),
            sold: dispatch.total_sold(),
        };
        info!(cost = %report.cost, grid_only_cost = %report.grid_only_cost, "evaluated");
        Ok(report)
    }
}

/// Daily summary of a validated dispatch.
#[must_use]
#[derive(Copy, Clone, Debug, Serialize)]
pub struct Report {
    pub cost: Cost,
    pub grid_only_cost: Cost,

    /// Energy that went into the battery, for usage and for resale.
    pub charged: KilowattHours,

    pub sold: KilowattHours,
}

impl Report {
    pub fn savings(&self) -> Cost {
        self.grid_only_cost - self.cost
    }

    /// Put the day into the perspective of the battery purchase.
    pub fn summarise(self, battery: &Battery, monthly_fixed_cost: Cost) -> Summary {
        Summary {
            savings: self.savings(),
            daily_fixed_cost: monthly_fixed_cost / DAYS_PER_MONTH,
            equivalent_cycles: battery.full_cycles(self.charged),
            payback_months: self.payback_months(battery),
            lifetime_months: self.lifetime_months(battery),
            report: self,
        }
    }

    /// Months until the daily savings pay off the battery, if they ever do.
    pub fn payback_months(&self, battery: &Battery) -> Option<f64> {
        let savings = self.savings();
        (savings > Cost::ZERO).then(|| battery.real_price() / (savings * DAYS_PER_MONTH))
    }

    /// Months until the battery uses up its rated cycles at this daily pace.
    pub fn lifetime_months(&self, battery: &Battery) -> Option<f64> {
        let daily_cycles = battery.full_cycles(self.charged);
        (daily_cycles > 0.0)
            .then(|| f64::from(battery.life_cycles()) / (daily_cycles * DAYS_PER_MONTH))
    }
}

/// Report together with the battery economics.
#[must_use]
#[derive(Copy, Clone, Debug, Serialize)]
pub struct Summary {
    #[serde(flatten)]
    pub report: Report,

    pub savings: Cost,

    /// Provider's fixed fee, paid with or without the battery.
    pub daily_fixed_cost: Cost,

    /// Full battery cycles per day.
    pub equivalent_cycles: f64,

    pub payback_months: Option<f64>,
    pub lifetime_months: Option<f64>,
}
