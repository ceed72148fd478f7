use std::ops::Div;

use crate::quantity::{energy::KilowattHours, rate::KilowattHourRate};

quantity!(
    /// Amount of money in the tariff currency.
    Cost, suffix: "zł", precision: 2
);

impl Cost {
    pub const ONE_CENT: Self = Self(0.01);
}

impl Div<KilowattHours> for Cost {
    type Output = KilowattHourRate;

    fn div(self, rhs: KilowattHours) -> Self::Output {
        KilowattHourRate(self.0 / rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_div_energy() {
        assert_eq!(Cost(1.0) / KilowattHours(4.0), KilowattHourRate(0.25));
    }
}
