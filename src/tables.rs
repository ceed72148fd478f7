use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        battery::{Battery, Sku},
        benchmark::Summary,
        day::Day,
        dispatch::Dispatch,
    },
    quantity::{cost::Cost, energy::KilowattHours, rate::KilowattHourRate},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

/// Energy cell, dimmed when there is nothing to show.
fn energy_cell(energy: KilowattHours, color: Color) -> Cell {
    let cell = Cell::new(energy).set_alignment(CellAlignment::Right);
    if energy < KilowattHours::ONE_WATT_HOUR {
        cell.add_attribute(Attribute::Dim)
    } else {
        cell.fg(color)
    }
}

#[expect(clippy::cast_precision_loss)]
pub fn build_dispatch_table(day: &Day, dispatch: &Dispatch) -> Table {
    let mean_rate = if day.is_empty() {
        KilowattHourRate::ZERO
    } else {
        day.buy_rates().sum::<KilowattHourRate>() / day.len() as f64
    };
    let trajectory = dispatch.trajectory();

    let mut table = new_table();
    table.set_header(vec![
        "Start", "Buy", "Sell", "Usage", "Grid", "Charge", "Discharge", "Bought", "Sold", "Level",
    ]);
    for (index, slot) in day.slots().iter().enumerate() {
        table.add_row(vec![
            Cell::new(Day::slot_start(index).format("%H:%M")),
            Cell::new(slot.buy_rate)
                .fg(if slot.buy_rate >= mean_rate { Color::Red } else { Color::Green }),
            Cell::new(slot.sell_rate).add_attribute(Attribute::Dim),
            energy_cell(slot.usage, Color::Reset),
            energy_cell(dispatch.grid_time[index], Color::Red),
            energy_cell(dispatch.battery_load_time[index], Color::Green),
            energy_cell(dispatch.battery_use_time[index], Color::DarkYellow),
            energy_cell(dispatch.buy_time[index], Color::Blue),
            energy_cell(dispatch.sell_time[index], Color::Magenta),
            Cell::new(trajectory.levels()[index]).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

fn optional_months(months: Option<f64>) -> Cell {
    match months {
        Some(months) => Cell::new(format!("{months:.1} months")),
        None => Cell::new("never").fg(Color::Red),
    }
}

pub fn build_summary_table(summary: &Summary, battery: &Battery) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec![Cell::new("Capacity"), Cell::new(battery.capacity())]);
    table.add_row(vec![Cell::new("Real price"), Cell::new(battery.real_price())]);
    table.add_row(vec![Cell::new("Cycling cost"), Cell::new(battery.one_kwh_cost())]);
    table.add_row(vec![Cell::new("Grid-only cost"), Cell::new(summary.report.grid_only_cost)]);
    table.add_row(vec![Cell::new("Dispatched cost"), Cell::new(summary.report.cost)]);
    table.add_row(vec![
        Cell::new("Savings").add_attribute(Attribute::Bold),
        Cell::new(summary.savings).fg(if summary.savings >= Cost::ONE_CENT {
            Color::Green
        } else {
            Color::Red
        }),
    ]);
    table.add_row(vec![
        Cell::new("Fixed fee").add_attribute(Attribute::Dim),
        Cell::new(summary.daily_fixed_cost).add_attribute(Attribute::Dim),
    ]);
    table.add_row(vec![Cell::new("Charged"), Cell::new(summary.report.charged)]);
    table.add_row(vec![Cell::new("Sold"), Cell::new(summary.report.sold)]);
    table.add_row(vec![
        Cell::new("Cycles"),
        Cell::new(format!("{:.2}", summary.equivalent_cycles)),
    ]);
    table.add_row(vec![
        Cell::new("Payback").add_attribute(Attribute::Bold),
        optional_months(summary.payback_months),
    ]);
    table.add_row(vec![Cell::new("Lifetime"), optional_months(summary.lifetime_months)]);
    table
}

pub fn build_catalog_table(batteries: &[(Sku, Battery)]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Model",
        "Capacity",
        "Price",
        "Grant",
        "DoD",
        "Efficiency",
        "Socket",
        "Cycles",
        "Charging",
        "Per slot",
        "Cycling cost",
    ]);
    for (sku, battery) in batteries {
        table.add_row(vec![
            Cell::new(format!("{sku:?}")).add_attribute(Attribute::Bold),
            Cell::new(battery.capacity()).set_alignment(CellAlignment::Right),
            Cell::new(battery.price()).set_alignment(CellAlignment::Right),
            Cell::new(battery.grant_reduction())
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(format!("{:.0}%", battery.depth_of_discharge() * 100.0)),
            Cell::new(format!("{:.1}%", battery.efficiency() * 100.0)),
            Cell::new(battery.socket_power_output()).set_alignment(CellAlignment::Right),
            Cell::new(battery.life_cycles()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1} h", battery.charging_time().as_seconds_f64() / 3600.0)),
            Cell::new(battery.charging_per_segment()).set_alignment(CellAlignment::Right),
            Cell::new(battery.one_kwh_cost()).fg(Color::DarkYellow),
        ]);
    }
    table
}
