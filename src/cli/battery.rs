//! Battery selection arguments.

use clap::Parser;

use crate::{
    core::battery::{Battery, Sku},
    prelude::*,
    quantity::energy::KilowattHours,
};

#[must_use]
#[derive(Parser)]
pub struct BatteryArgs {
    /// Reference battery model.
    #[clap(long = "battery", default_value = "standard", env = "BATTERY")]
    pub sku: Sku,

    /// Usable capacity of a custom battery, takes precedence over `--battery`.
    #[clap(long = "capacity-kwh", env = "CAPACITY_KWH")]
    pub capacity: Option<KilowattHours>,

    /// Apply the purchase subsidy.
    #[clap(long = "grant", env = "GRANT")]
    pub grant: bool,
}

impl BatteryArgs {
    pub fn battery(&self) -> Result<Battery> {
        let mut battery = match self.capacity {
            Some(capacity) => {
                ensure!(
                    capacity.is_finite() && capacity > KilowattHours::ZERO,
                    "battery capacity must be positive, got {capacity}",
                );
                Battery::with_capacity(capacity)
            }
            None => self.sku.battery(),
        };
        battery.set_grant(self.grant);
        Ok(battery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_capacity() -> Result {
        let args = BatteryArgs::try_parse_from(["battery", "--capacity-kwh", "7.5", "--grant"])?;
        let battery = args.battery()?;
        assert_eq!(battery.capacity(), KilowattHours(7.5));
        assert!(battery.grant_reduction() > crate::quantity::cost::Cost::ZERO);
        Ok(())
    }

    #[test]
    fn test_sku() -> Result {
        let args = BatteryArgs::try_parse_from(["battery", "--battery", "large"])?;
        assert_eq!(args.battery()?.capacity(), KilowattHours(10.0));
        Ok(())
    }

    #[test]
    fn test_zero_capacity() -> Result {
        let args = BatteryArgs::try_parse_from(["battery", "--capacity-kwh", "0"])?;
        assert!(args.battery().is_err());
        Ok(())
    }
}
