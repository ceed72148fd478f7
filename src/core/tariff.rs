use std::{fmt::Debug, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    core::provider::Provider,
    prelude::*,
    quantity::{cost::Cost, rate::KilowattHourRate},
};

/// Tariff coefficients of all the providers.
///
/// Every field is optional in the file and defaults to the built-in coefficients.
/// A provider table, when present, replaces the built-in one as a whole.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Excise duty, net of VAT.
    pub excise: KilowattHourRate,

    pub vat: f64,

    /// Share of the raw market price paid for the exported energy.
    pub export_ratio: f64,

    /// Pass negative market prices through to the export rate instead of clamping them at zero.
    pub allow_negative_export: bool,

    pub enea: ProviderTerms,
    pub energa: ProviderTerms,
    pub pge: ProviderTerms,
    pub tauron: ProviderTerms,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderTerms {
    /// Provider's net margin on top of the market price.
    pub margin: KilowattHourRate,

    /// Whether the dynamic rate carries the excise on top of the margin.
    pub includes_excise: bool,

    /// Fixed monthly charge of the dynamic tariff.
    pub monthly_fee: Cost,

    /// Gross flat rate of the static tariff.
    pub static_rate: KilowattHourRate,

    /// Fixed monthly charge of the static tariff.
    #[serde(default)]
    pub static_monthly_fee: Cost,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            excise: KilowattHourRate(0.005),
            vat: 0.23,
            export_ratio: 1.0,
            allow_negative_export: false,
            enea: ProviderTerms {
                margin: KilowattHourRate(0.095),
                includes_excise: true,
                monthly_fee: Cost(18.45),
                static_rate: KilowattHourRate(1.10),
                static_monthly_fee: Cost::ZERO,
            },
            energa: ProviderTerms {
                margin: KilowattHourRate(0.108),
                includes_excise: false,
                monthly_fee: Cost(9.99),
                static_rate: KilowattHourRate(0.76),
                static_monthly_fee: Cost::ZERO,
            },
            pge: ProviderTerms {
                margin: KilowattHourRate(0.0812),
                includes_excise: true,
                monthly_fee: Cost(49.90),
                static_rate: KilowattHourRate(1.10),
                static_monthly_fee: Cost::ZERO,
            },
            tauron: ProviderTerms {
                margin: KilowattHourRate(0.892),
                includes_excise: false,
                monthly_fee: Cost::ZERO,
                static_rate: KilowattHourRate(0.77),
                static_monthly_fee: Cost::ZERO,
            },
        }
    }
}

impl TariffConfig {
    #[instrument(name = "reading the tariffs…")]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = toml::from_slice(
            &fs::read(path).with_context(|| format!("failed to read `{}`", path.display()))?,
        )
        .with_context(|| format!("failed to parse `{}`", path.display()))?;
        Ok(config)
    }

    pub const fn terms(&self, provider: Provider) -> &ProviderTerms {
        match provider {
            Provider::Enea => &self.enea,
            Provider::Energa => &self.energa,
            Provider::Pge => &self.pge,
            Provider::Tauron => &self.tauron,
        }
    }

    /// Gross dynamic rate for the raw market price.
    pub fn dynamic_rate(
        &self,
        provider: Provider,
        market_rate: KilowattHourRate,
    ) -> KilowattHourRate {
        let terms = self.terms(provider);
        let excise = if terms.includes_excise { self.excise } else { KilowattHourRate::ZERO };
        (market_rate + excise + terms.margin) * (1.0 + self.vat)
    }

    /// Rate paid for the exported energy.
    pub fn export_rate(&self, market_rate: KilowattHourRate) -> KilowattHourRate {
        let rate = market_rate * self.export_ratio;
        if self.allow_negative_export { rate } else { rate.max(KilowattHourRate::ZERO) }
    }
}
