use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Parser;
use serde::Serialize;

use crate::{
    cli::battery::BatteryArgs,
    core::{
        benchmark::{Benchmark, Summary},
        day::{Day, Slot},
        dispatch::{Dispatch, Strategy},
        provider::{Provider, Tariff},
        tariff::TariffConfig,
    },
    prelude::*,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
    tables::{build_dispatch_table, build_summary_table},
};

#[derive(Parser)]
pub struct DispatchArgs {
    /// Raw market prices for the day, one value per quarter-hour.
    #[clap(long = "prices", env = "PRICES_PATH")]
    pub prices_path: PathBuf,

    /// Household usage in kilowatt-hours, one value per quarter-hour.
    #[clap(long = "usage", env = "USAGE_PATH")]
    pub usage_path: PathBuf,

    /// Export rates, one value per quarter-hour, overriding the ones derived from the market.
    #[clap(long = "sell-prices", env = "SELL_PRICES_PATH")]
    pub sell_prices_path: Option<PathBuf>,

    #[clap(long = "provider", default_value = "enea", env = "PROVIDER")]
    pub provider: Provider,

    #[clap(long = "tariff", default_value = "dynamic", env = "TARIFF")]
    pub tariff: Tariff,

    /// TOML file overriding the built-in tariff coefficients.
    #[clap(long = "tariffs", env = "TARIFFS_PATH")]
    pub tariffs_path: Option<PathBuf>,

    #[clap(long = "strategy", default_value = "greedy", env = "STRATEGY")]
    pub strategy: Strategy,

    /// Additionally buy energy purely for resale.
    #[clap(long = "load-to-sell", env = "LOAD_TO_SELL")]
    pub load_to_sell: bool,

    /// Print JSON instead of the tables.
    #[clap(long = "json")]
    pub json: bool,

    #[clap(flatten)]
    pub battery: BatteryArgs,
}

#[derive(Serialize)]
struct Output<'a> {
    summary: &'a Summary,
    slots: &'a [Slot],
    dispatch: &'a Dispatch,
}

#[instrument(skip_all, fields(provider = ?args.provider, tariff = ?args.tariff))]
pub fn dispatch(args: &DispatchArgs) -> Result {
    let tariffs = match &args.tariffs_path {
        Some(path) => TariffConfig::read_from(path)?,
        None => TariffConfig::default(),
    };
    let market_rates: Vec<KilowattHourRate> =
        read_series(&args.prices_path)?.into_iter().map(KilowattHourRate).collect();
    let usage: Vec<KilowattHours> =
        read_series(&args.usage_path)?.into_iter().map(KilowattHours).collect();

    let mut prices = args.provider.prices(args.tariff, &tariffs, &market_rates);
    if let Some(path) = &args.sell_prices_path {
        prices.sell_rates = read_series(path)?.into_iter().map(KilowattHourRate).collect();
    }
    let day = Day::try_new(&prices.buy_rates, &prices.sell_rates, &usage)?;

    let battery = args.battery.battery()?;
    info!(
        capacity = %battery.capacity(),
        one_kwh_cost = %battery.one_kwh_cost(),
        strategy = ?args.strategy,
        "dispatching…",
    );
    let dispatch = args.strategy.dispatch(&day, &battery, args.load_to_sell)?;
    let summary = Benchmark::builder()
        .day(&day)
        .battery(&battery)
        .build()
        .evaluate(&dispatch)?
        .summarise(&battery, prices.monthly_fixed_cost);

    if args.json {
        let output = Output { summary: &summary, slots: day.slots(), dispatch: &dispatch };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", build_dispatch_table(&day, &dispatch));
        println!("{}", build_summary_table(&summary, &battery));
    }
    Ok(())
}

#[instrument(skip_all, fields(path = %path.display()))]
fn read_series(path: &Path) -> Result<Vec<f64>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))?;
    let series =
        parse_series(&text).with_context(|| format!("failed to parse `{}`", path.display()))?;
    debug!(len = series.len(), "read");
    Ok(series)
}

/// Parse one value per line, skipping blank lines and a leading header.
fn parse_series(text: &str) -> Result<Vec<f64>> {
    let mut series = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<f64>() {
            Ok(value) => series.push(value),
            Err(_) if index == 0 => {}
            Err(error) => {
                return Err(error).with_context(|| format!("line #{}: `{line}`", index + 1));
            }
        }
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_series() -> Result {
        assert_eq!(parse_series("price\n0.5\n\n-0.25\n1e-1\n")?, [0.5, -0.25, 0.1]);
        assert_eq!(parse_series("1\n2")?, [1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn test_parse_series_garbage() {
        let error = parse_series("0.5\nN/A\n").unwrap_err();
        assert_eq!(error.to_string(), "line #2: `N/A`");
    }

    #[test]
    fn test_parse_args() -> Result {
        let args = DispatchArgs::try_parse_from([
            "dispatch",
            "--prices",
            "prices.txt",
            "--usage",
            "usage.txt",
            "--provider",
            "tauron",
            "--strategy",
            "greedy-by-price",
            "--load-to-sell",
        ])?;
        assert_eq!(args.provider, Provider::Tauron);
        assert_eq!(args.strategy, Strategy::GreedyByPrice);
        assert_eq!(args.tariff, Tariff::Dynamic);
        assert!(args.load_to_sell);
        assert!(args.sell_prices_path.is_none());
        Ok(())
    }
}
