use std::ops::Div;

use chrono::TimeDelta;

use crate::quantity::{cost::Cost, power::Kilowatts, rate::KilowattHourRate};

quantity!(KilowattHours, suffix: "kWh", precision: 3);

implement_mul!(KilowattHours, KilowattHourRate, Cost);

impl KilowattHours {
    pub const ONE_WATT_HOUR: Self = Self(0.001);
}

impl Div<Kilowatts> for KilowattHours {
    type Output = TimeDelta;

    /// Time needed to transfer the energy at the given power.
    fn div(self, rhs: Kilowatts) -> Self::Output {
        #[expect(clippy::cast_possible_truncation)]
        let seconds = (self.0 / rhs.0 * 3600.0).round() as i64;
        TimeDelta::seconds(seconds)
    }
}

impl Div<TimeDelta> for KilowattHours {
    type Output = Kilowatts;

    fn div(self, rhs: TimeDelta) -> Self::Output {
        Kilowatts(self.0 * 3600.0 / rhs.as_seconds_f64())
    }
}
