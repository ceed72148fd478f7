use serde::{Deserialize, Serialize};

use crate::{
    core::tariff::TariffConfig,
    quantity::{cost::Cost, rate::KilowattHourRate},
};

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// [ENEA](https://www.enea.pl).
    Enea,

    /// [ENERGA](https://www.energa.pl).
    Energa,

    /// [PGE](https://www.gkpge.pl).
    Pge,

    /// [TAURON](https://www.tauron.pl).
    Tauron,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tariff {
    /// Market price plus the provider's margin, taxed.
    Dynamic,

    /// Flat gross rate, with its own monthly fee.
    Static,
}

/// Rates a household pays and gets over a day.
#[must_use]
#[derive(Clone, Debug)]
pub struct Prices {
    pub buy_rates: Vec<KilowattHourRate>,
    pub sell_rates: Vec<KilowattHourRate>,
    pub monthly_fixed_cost: Cost,
}

impl Provider {
    pub fn prices(
        self,
        tariff: Tariff,
        config: &TariffConfig,
        market_rates: &[KilowattHourRate],
    ) -> Prices {
        let terms = config.terms(self);
        let (buy_rates, monthly_fixed_cost) = match tariff {
            Tariff::Dynamic => (
                market_rates.iter().map(|rate| config.dynamic_rate(self, *rate)).collect(),
                terms.monthly_fee,
            ),
            Tariff::Static => {
                (vec![terms.static_rate; market_rates.len()], terms.static_monthly_fee)
            }
        };
        Prices {
            buy_rates,
            sell_rates: market_rates.iter().map(|rate| config.export_rate(*rate)).collect(),
            monthly_fixed_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_static_prices() {
        let market_rates = [KilowattHourRate(0.3), KilowattHourRate(-0.1)];
        let prices =
            Provider::Tauron.prices(Tariff::Static, &TariffConfig::default(), &market_rates);
        assert_eq!(prices.buy_rates, [KilowattHourRate(0.77); 2]);
        assert_eq!(prices.sell_rates, [KilowattHourRate(0.3), KilowattHourRate::ZERO]);
        assert_eq!(prices.monthly_fixed_cost, Cost::ZERO);
    }

    #[test]
    fn test_static_tariff_drops_dynamic_fee() {
        let market_rates = [KilowattHourRate(0.3)];
        let config = TariffConfig::default();
        let prices = Provider::Pge.prices(Tariff::Static, &config, &market_rates);
        assert_eq!(prices.buy_rates, [KilowattHourRate(1.10)]);
        assert_eq!(prices.monthly_fixed_cost, Cost::ZERO);

        let prices = Provider::Enea.prices(Tariff::Dynamic, &config, &market_rates);
        assert_eq!(prices.monthly_fixed_cost, Cost(18.45));
    }

    #[test]
    fn test_dynamic_prices() {
        let market_rates = [KilowattHourRate(0.3)];
        let prices =
            Provider::Pge.prices(Tariff::Dynamic, &TariffConfig::default(), &market_rates);
        assert_abs_diff_eq!(
            prices.buy_rates[0].0,
            (0.3 + 0.005 + 0.0812) * 1.23,
            epsilon = 1e-12,
        );
        assert_eq!(prices.monthly_fixed_cost, Cost(49.90));
    }
}
