use std::ops::Mul;

use chrono::TimeDelta;

use crate::quantity::energy::KilowattHours;

quantity!(Kilowatts, suffix: "kW", precision: 2);

impl Kilowatts {
    /// Electrical power drawn from a socket.
    pub fn from_socket(amperes: f64, volts: f64) -> Self {
        Self(amperes * volts / 1000.0)
    }
}

impl Mul<TimeDelta> for Kilowatts {
    type Output = KilowattHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        let hours = rhs.as_seconds_f64() / 3600.0;
        KilowattHours(self.0 * hours)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_from_socket() {
        assert_abs_diff_eq!(Kilowatts::from_socket(16.0, 230.0).0, 3.68);
    }

    #[test]
    fn test_mul_time_delta() {
        assert_abs_diff_eq!((Kilowatts(4.0) * TimeDelta::minutes(15)).0, 1.0);
    }
}
