//! Buying from the grid purely for resale near the sell-rate peaks.

use crate::{
    core::{
        battery::Battery,
        day::Day,
        dispatch::Dispatch,
        trajectory::NEGLIGIBLE,
    },
    prelude::*,
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

/// Sell rate relative to the remaining day's peak that is still worth selling at.
const PEAK_TOLERANCE: f64 = 0.95;

/// Pair cheap buy slots with later near-peak sell slots using the capacity left free
/// by the dispatch, and record the trades in the dispatch.
///
/// # Returns
///
/// Profit of the trades, net of the battery cycling cost.
#[instrument(skip_all, fields(n_slots = day.len()))]
pub fn load_only_to_sell(day: &Day, battery: &Battery, dispatch: &mut Dispatch) -> Cost {
    let slots = day.slots();
    let one_kwh_cost = battery.one_kwh_cost();
    let charging_per_segment = battery.charging_per_segment();

    let mut free_capacity: Vec<KilowattHours> = dispatch
        .trajectory()
        .levels()
        .iter()
        .map(|level| (battery.effective_capacity() - *level).max(KilowattHours::ZERO))
        .collect();
    let future_peaks = future_peaks(slots.iter().map(|slot| slot.sell_rate));

    let mut profit = Cost::ZERO;
    let mut search_from = 0;

    for (sell_index, sell_rate) in slots.iter().map(|slot| slot.sell_rate).enumerate() {
        if sell_rate < future_peaks[sell_index] * PEAK_TOLERANCE {
            continue;
        }
        let mut has_sold = false;

        // Cheapest buy slot that still accepts charging:
        while let Some(buy_index) = (search_from..sell_index)
            .filter(|&index| {
                charging_per_segment
                    - dispatch.battery_load_time[index]
                    - dispatch.buy_time[index]
                    > NEGLIGIBLE
            })
            .min_by_key(|&index| (slots[index].buy_rate, index))
        {
            let buy_cost = slots[buy_index].buy_rate + one_kwh_cost;
            if sell_rate <= buy_cost {
                break;
            }
            let charging_room = charging_per_segment
                - dispatch.battery_load_time[buy_index]
                - dispatch.buy_time[buy_index];
            let volume = free_capacity[buy_index..sell_index]
                .iter()
                .copied()
                .min()
                .unwrap_or(KilowattHours::ZERO)
                .min(charging_room);
            if volume <= NEGLIGIBLE {
                // The battery is full somewhere in between, try buying later.
                search_from = buy_index + 1;
                continue;
            }

            trace!(buy_index, sell_index, %volume, %buy_cost, %sell_rate, "trading");
            dispatch.buy_time[buy_index] += volume;
            dispatch.sell_time[sell_index] += volume;
            for free in &mut free_capacity[buy_index..sell_index] {
                *free -= volume;
            }
            profit += volume * (sell_rate - buy_cost);
            has_sold = true;
        }

        if has_sold {
            search_from = sell_index + 1;
        }
    }

    debug!(%profit, "arbitrage planned");
    profit
}

/// Highest rate from each slot until the end of the day.
fn future_peaks(
    rates: impl DoubleEndedIterator<Item = KilowattHourRate>,
) -> Vec<KilowattHourRate> {
    let mut peaks: Vec<_> = rates
        .rev()
        .scan(None, |peak: &mut Option<KilowattHourRate>, rate| {
            let new_peak = peak.map_or(rate, |peak| peak.max(rate));
            *peak = Some(new_peak);
            Some(new_peak)
        })
        .collect();
    peaks.reverse();
    peaks
}
