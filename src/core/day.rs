use chrono::{NaiveTime, TimeDelta};
use serde::Serialize;

use crate::{
    core::Error,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
};

pub const SLOTS_PER_HOUR: usize = 4;
pub const SLOTS_PER_DAY: usize = 24 * SLOTS_PER_HOUR;

/// Single quarter-hour of a day.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub buy_rate: KilowattHourRate,

    /// Export rate, zero when selling is disabled.
    pub sell_rate: KilowattHourRate,

    /// Household demand within the slot.
    pub usage: KilowattHours,
}

/// Validated sequence of a day's quarter-hour slots.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Day(Vec<Slot>);

impl Day {
    pub fn try_new(
        buy_rates: &[KilowattHourRate],
        sell_rates: &[KilowattHourRate],
        usage: &[KilowattHours],
    ) -> Result<Self, Error> {
        check_length("buy rates", buy_rates.len())?;
        check_length("sell rates", sell_rates.len())?;
        check_length("usage", usage.len())?;

        let slots = buy_rates
            .iter()
            .zip(sell_rates)
            .zip(usage)
            .enumerate()
            .map(|(slot, ((&buy_rate, &sell_rate), &usage))| {
                if !buy_rate.is_finite() {
                    return Err(Error::NotFinite { series: "buy rates", slot });
                }
                if !sell_rate.is_finite() {
                    return Err(Error::NotFinite { series: "sell rates", slot });
                }
                if !usage.is_finite() {
                    return Err(Error::NotFinite { series: "usage", slot });
                }
                if usage < KilowattHours::ZERO {
                    return Err(Error::NegativeUsage { slot, usage });
                }
                Ok(Slot { buy_rate, sell_rate, usage })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(slots))
    }

    pub fn slots(&self) -> &[Slot] {
        &self.0
    }

    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn buy_rates(&self) -> impl Iterator<Item = KilowattHourRate> + '_ {
        self.0.iter().map(|slot| slot.buy_rate)
    }

    pub fn usage(&self) -> impl Iterator<Item = KilowattHours> + '_ {
        self.0.iter().map(|slot| slot.usage)
    }

    pub fn total_usage(&self) -> KilowattHours {
        self.usage().sum()
    }

    pub fn slot_duration() -> TimeDelta {
        TimeDelta::minutes(15)
    }

    /// Wall-clock start of the slot.
    pub fn slot_start(index: usize) -> NaiveTime {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let offset = Self::slot_duration() * (index % SLOTS_PER_DAY) as i32;
        NaiveTime::MIN + offset
    }
}

fn check_length(series: &'static str, actual: usize) -> Result<(), Error> {
    if actual == SLOTS_PER_DAY {
        Ok(())
    } else {
        Err(Error::SeriesLength { series, expected: SLOTS_PER_DAY, actual })
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn day(buy_rates: &[f64], sell_rates: &[f64], usage: &[f64]) -> Day {
        Day::try_new(
            &buy_rates.iter().copied().map(KilowattHourRate).collect::<Vec<_>>(),
            &sell_rates.iter().copied().map(KilowattHourRate).collect::<Vec<_>>(),
            &usage.iter().copied().map(KilowattHours).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    /// Day without selling.
    pub fn flat_sell(buy_rates: &[f64], usage: &[f64]) -> Day {
        day(buy_rates, &[0.0; SLOTS_PER_DAY], usage)
    }

    /// Linear congruential sequence in `[0, 1)`, stable across platforms.
    pub struct Lcg(u64);

    impl Lcg {
        pub const fn new(seed: u64) -> Self {
            Self(seed)
        }

        #[expect(clippy::cast_precision_loss)]
        pub fn sample(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 11) as f64 / (1_u64 << 53) as f64
        }
    }

    /// Day with an evening peak, a midday dip and spiky usage.
    pub fn pseudo_random_day(seed: u64) -> Day {
        let mut random = Lcg::new(seed);
        let mut buy_rates = Vec::with_capacity(SLOTS_PER_DAY);
        let mut sell_rates = Vec::with_capacity(SLOTS_PER_DAY);
        let mut usage = Vec::with_capacity(SLOTS_PER_DAY);
        for slot in 0..SLOTS_PER_DAY {
            let hour = slot / SLOTS_PER_HOUR;
            let base = match hour {
                0..=5 => 0.45,
                10..=14 => 0.3,
                17..=21 => 1.2,
                _ => 0.8,
            };
            let buy_rate = base + 0.4 * random.sample();
            buy_rates.push(buy_rate);
            sell_rates.push(0.25f64.mul_add(random.sample(), buy_rate * 0.6));
            let is_spike = random.sample() < 0.2;
            usage.push(if is_spike {
                0.3 + random.sample()
            } else {
                0.1f64.mul_add(random.sample(), 0.05)
            });
        }
        day(&buy_rates, &sell_rates, &usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_new_ok() {
        let day = fixtures::flat_sell(&[1.0; SLOTS_PER_DAY], &[0.05; SLOTS_PER_DAY]);
        assert_eq!(day.len(), SLOTS_PER_DAY);
        assert_eq!(day.slots()[0].sell_rate, KilowattHourRate::ZERO);
    }

    #[test]
    fn test_wrong_length() {
        let result = Day::try_new(
            &[KilowattHourRate(1.0); SLOTS_PER_DAY],
            &[KilowattHourRate(1.0); SLOTS_PER_DAY],
            &[KilowattHours(0.1); 95],
        );
        assert!(matches!(
            result,
            Err(Error::SeriesLength { series: "usage", expected: 96, actual: 95 }),
        ));
    }

    #[test]
    fn test_negative_usage() {
        let mut usage = [KilowattHours(0.1); SLOTS_PER_DAY];
        usage[7] = KilowattHours(-0.1);
        let result = Day::try_new(
            &[KilowattHourRate(1.0); SLOTS_PER_DAY],
            &[KilowattHourRate(1.0); SLOTS_PER_DAY],
            &usage,
        );
        assert!(matches!(result, Err(Error::NegativeUsage { slot: 7, .. })));
    }

    #[test]
    fn test_not_finite() {
        let mut sell_rates = [KilowattHourRate(1.0); SLOTS_PER_DAY];
        sell_rates[42] = KilowattHourRate(f64::NAN);
        let result = Day::try_new(
            &[KilowattHourRate(1.0); SLOTS_PER_DAY],
            &sell_rates,
            &[KilowattHours(0.1); SLOTS_PER_DAY],
        );
        assert!(matches!(result, Err(Error::NotFinite { series: "sell rates", slot: 42 })));
    }

    #[test]
    fn test_slot_start() {
        assert_eq!(Day::slot_start(0), NaiveTime::MIN);
        assert_eq!(Day::slot_start(37), NaiveTime::from_hms_opt(9, 15, 0).unwrap());
        assert_eq!(Day::slot_start(95), NaiveTime::from_hms_opt(23, 45, 0).unwrap());
    }

    #[test]
    fn test_pseudo_random_day_is_stable() {
        assert_eq!(fixtures::pseudo_random_day(42), fixtures::pseudo_random_day(42));
        assert_ne!(fixtures::pseudo_random_day(42), fixtures::pseudo_random_day(43));
    }
}
