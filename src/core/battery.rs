use bon::Builder;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::{
    core::day::SLOTS_PER_HOUR,
    quantity::{cost::Cost, energy::KilowattHours, power::Kilowatts, rate::KilowattHourRate},
};

/// Share of the purchase price covered by the subsidy.
const GRANT_SHARE: f64 = 0.5;

/// Maximum subsidy per installation.
const GRANT_CAP: Cost = Cost(16_000.0);

/// Standard single-phase household socket.
const SOCKET_AMPERES: f64 = 16.0;
const SOCKET_VOLTS: f64 = 230.0;

/// Home battery together with its purchase economics.
#[must_use]
#[derive(Clone, Debug, Builder, Serialize)]
pub struct Battery {
    /// Purchase price before any subsidy.
    price: Cost,

    /// Nominal energy capacity.
    capacity: KilowattHours,

    /// Share of the nominal capacity that may be cycled.
    depth_of_discharge: f64,

    /// Charging efficiency applied to the socket power.
    efficiency: f64,

    /// Rated number of full cycles.
    life_cycles: u32,

    socket_power_output: Kilowatts,

    #[builder(default)]
    grant_reduction: Cost,
}

impl Battery {
    /// Parametric battery, priced and rated after the reference catalog.
    pub fn with_capacity(capacity: KilowattHours) -> Self {
        let depth_of_discharge = if capacity.0 < 3.0 { 0.95 } else { 0.93 };
        let efficiency = 0.005f64.mul_add(-(capacity.0 - 8.0).max(0.0) / 8.0, 0.96);
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let extra_cycles = ((4.0 - capacity.0).max(0.0) * 500.0).ceil() as u32;
        Self::builder()
            .price(Cost(1270.0f64.mul_add(capacity.0, 1260.0)))
            .capacity(capacity)
            .depth_of_discharge(depth_of_discharge)
            .efficiency(efficiency)
            .life_cycles(6000 + extra_cycles)
            .socket_power_output(Kilowatts::from_socket(SOCKET_AMPERES, SOCKET_VOLTS))
            .build()
    }

    /// Apply or withdraw the purchase subsidy.
    pub fn set_grant(&mut self, is_applicable: bool) {
        self.grant_reduction =
            if is_applicable { (self.price * GRANT_SHARE).min(GRANT_CAP) } else { Cost::ZERO };
    }

    pub const fn price(&self) -> Cost {
        self.price
    }

    pub const fn capacity(&self) -> KilowattHours {
        self.capacity
    }

    pub const fn depth_of_discharge(&self) -> f64 {
        self.depth_of_discharge
    }

    /// Energy the battery may actually hold: the nominal capacity scaled by the depth of discharge.
    pub fn effective_capacity(&self) -> KilowattHours {
        self.capacity * self.depth_of_discharge
    }

    pub const fn efficiency(&self) -> f64 {
        self.efficiency
    }

    pub const fn life_cycles(&self) -> u32 {
        self.life_cycles
    }

    pub const fn socket_power_output(&self) -> Kilowatts {
        self.socket_power_output
    }

    pub const fn grant_reduction(&self) -> Cost {
        self.grant_reduction
    }

    /// Price after the subsidy.
    pub fn real_price(&self) -> Cost {
        self.price - self.grant_reduction
    }

    /// Effective power flowing into the cells.
    pub fn charging_power(&self) -> Kilowatts {
        self.socket_power_output * self.efficiency
    }

    /// Time to charge the battery from empty to full.
    pub fn charging_time(&self) -> TimeDelta {
        self.capacity / self.charging_power()
    }

    pub fn charging_per_hour(&self) -> KilowattHours {
        self.charging_power() * TimeDelta::hours(1)
    }

    /// Maximum energy charged within a single slot.
    #[expect(clippy::cast_precision_loss)]
    pub fn charging_per_segment(&self) -> KilowattHours {
        self.charging_per_hour() / SLOTS_PER_HOUR as f64
    }

    /// Amortised cost of one full cycle.
    pub fn cost_per_cycle(&self) -> Cost {
        self.real_price() / f64::from(self.life_cycles)
    }

    /// Amortised cost of cycling one kilowatt-hour through the battery.
    pub fn one_kwh_cost(&self) -> KilowattHourRate {
        (self.cost_per_cycle() / self.capacity).max(KilowattHourRate::ZERO)
    }

    /// Number of equivalent full cycles for the energy charged.
    pub fn full_cycles(&self, charged: KilowattHours) -> f64 {
        charged / self.capacity
    }
}

/// Reference battery models.
#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sku {
    /// 2.5 kWh wall unit.
    Compact,

    /// 5 kWh wall unit.
    Standard,

    /// 10 kWh floor unit.
    Large,
}

impl Sku {
    pub const ALL: [Self; 3] = [Self::Compact, Self::Standard, Self::Large];

    pub const fn capacity(self) -> KilowattHours {
        match self {
            Self::Compact => KilowattHours(2.5),
            Self::Standard => KilowattHours(5.0),
            Self::Large => KilowattHours(10.0),
        }
    }

    pub fn battery(self) -> Battery {
        Battery::with_capacity(self.capacity())
    }
}
