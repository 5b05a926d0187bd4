/* Copyright © 2024-2025 Adam Train <adam@trainrelay.net>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */
use crate::errors::Error;
use crate::sim::result::{
	DailySeriesPoint, Kpis, ScheduledBuy, SimulationResult,
};
use crate::sim::schedule::{generate_schedule, Frequency};
use crate::sim::series::{closest_prior, RateSeries, MAX_LOOKBACK_DAYS};
use crate::sources::binance::{price_by_day, DailyPrice};
use crate::util::date::Date;
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::fmt;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Currency {
	Usd,
	Idr,
}

impl fmt::Display for Currency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Currency::Usd => write!(f, "USD"),
			Currency::Idr => write!(f, "IDR"),
		}
	}
}

/// Everything one simulation run needs to know. The engine holds no state
/// of its own: identical configs against identical source responses give
/// identical results.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
	/// Recurring investment per scheduled buy, in amount_currency
	pub amount: f64,
	pub amount_currency: Currency,
	pub display_currency: Currency,
	pub frequency: Frequency,
	pub begin: Date,
	pub end: Date,
}

impl SimulationConfig {
	pub fn validate(&self) -> Result<(), Error> {
		if !self.amount.is_finite() || self.amount <= 0.0 {
			return Err(Error::Validation(
				"amount must be greater than zero".to_string(),
			));
		}

		if self.begin > self.end {
			return Err(Error::Validation(
				"begin date must not be after end date".to_string(),
			));
		}

		Ok(())
	}

	/// Exchange rates only matter when either side of the run is IDR.
	fn needs_fx(&self) -> bool {
		self.amount_currency == Currency::Idr
			|| self.display_currency == Currency::Idr
	}
}

/// Daily close history over a UTC millisecond window, end exclusive.
pub trait PriceSource {
	fn daily_closes(
		&self,
		start_ms: i64,
		end_ms: i64,
	) -> Result<Vec<DailyPrice>, Error>;
}

/// Daily USD/IDR rates over a calendar day range, both ends inclusive.
pub trait RateSource {
	fn rate_series(&self, start: Date, end: Date) -> Result<RateSeries, Error>;
}

/// Runs one full simulation: fetch history, execute the schedule, derive
/// the daily series and headline figures.
pub fn run(
	config: &SimulationConfig,
	prices: &dyn PriceSource,
	rates: &dyn RateSource,
) -> Result<SimulationResult, Error> {
	config.validate()?;

	let start_ms = config
		.begin
		.to_epoch_ms()
		.map_err(|e| Error::Validation(e.to_string()))?;

	// extend the window one day so the final day's close is inside it
	let end_ms = config
		.end
		.add_days(1)
		.to_epoch_ms()
		.map_err(|e| Error::Validation(e.to_string()))?;

	let closes = prices.daily_closes(start_ms, end_ms)?;
	if closes.is_empty() {
		return Err(Error::DataUnavailable(
			"no BTC price history in range".to_string(),
		));
	}
	let prices_by_day = price_by_day(&closes);

	let fx = if config.needs_fx() {
		let series = rates.rate_series(config.begin, config.end)?;
		if series.is_empty() {
			return Err(Error::DataUnavailable(
				"no USD/IDR rates in range".to_string(),
			));
		}
		Some(series)
	} else {
		None
	};

	let buys = execute_schedule(config, &prices_by_day, fx.as_ref());
	if buys.is_empty() {
		return Err(Error::NoTransactions);
	}

	let series = derive_series(config, &buys, &prices_by_day, fx.as_ref());
	let kpis = derive_kpis(
		&buys,
		&series,
		&prices_by_day,
		fx.as_ref().is_some_and(|s| s.is_fallback_single_rate()),
	);

	Ok(SimulationResult { buys, series, kpis })
}

/// Walks the schedule and produces a buy for every date whose price, and
/// rate where one is needed, resolve within the lookback window. A date
/// that does not resolve is dropped, never zero-filled.
fn execute_schedule(
	config: &SimulationConfig,
	prices_by_day: &BTreeMap<Date, f64>,
	fx: Option<&RateSeries>,
) -> Vec<ScheduledBuy> {
	let mut buys = Vec::new();

	for day in generate_schedule(config.begin, config.end, config.frequency) {
		let Some(price_usd) =
			closest_prior(prices_by_day, day, MAX_LOOKBACK_DAYS)
		else {
			continue;
		};

		let (usd_spent, idr_spent) = match (config.amount_currency, fx) {
			(Currency::Usd, None) => (config.amount, 0.0),
			(Currency::Usd, Some(fx)) => {
				let Some(rate) = fx.resolve(day) else {
					continue;
				};
				(config.amount, config.amount * rate)
			},
			(Currency::Idr, Some(fx)) => {
				let Some(rate) = fx.resolve(day) else {
					continue;
				};
				(config.amount / rate, config.amount)
			},
			// run() always fetches rates for an IDR amount
			(Currency::Idr, None) => continue,
		};

		buys.push(ScheduledBuy {
			date: day,
			price_usd,
			usd_spent,
			idr_spent,
			btc_bought: usd_spent / price_usd,
		});
	}

	buys
}

/// Walks every priced day from the first buy through the end of the
/// range, carrying running totals. Cost in each currency accumulates
/// from the amounts fixed at each buy's own date, so the conversion is
/// locked in at transaction time rather than recomputed at the end.
fn derive_series(
	config: &SimulationConfig,
	buys: &[ScheduledBuy],
	prices_by_day: &BTreeMap<Date, f64>,
	fx: Option<&RateSeries>,
) -> Vec<DailySeriesPoint> {
	let buy_by_day: BTreeMap<Date, &ScheduledBuy> =
		buys.iter().map(|b| (b.date, b)).collect();

	let mut cum_btc = 0.0;
	let mut cum_usd = 0.0;
	let mut cum_idr = 0.0;
	let mut points = Vec::new();

	for (&day, &price_usd) in prices_by_day.range(buys[0].date..=config.end) {
		if let Some(buy) = buy_by_day.get(&day) {
			cum_btc += buy.btc_bought;
			cum_usd += buy.usd_spent;
			cum_idr += buy.idr_spent;
		}

		let value_usd = cum_btc * price_usd;
		let (portfolio_value, cumulative_cost) = match config.display_currency
		{
			Currency::Usd => (value_usd, cum_usd),
			Currency::Idr => {
				let rate = fx.and_then(|s| s.resolve(day)).unwrap_or(0.0);
				(value_usd * rate, cum_idr)
			},
		};

		points.push(DailySeriesPoint {
			date: day,
			cumulative_btc: cum_btc,
			cumulative_cost,
			portfolio_value,
		});
	}

	points
}

fn derive_kpis(
	buys: &[ScheduledBuy],
	series: &[DailySeriesPoint],
	prices_by_day: &BTreeMap<Date, f64>,
	fallback_rate_warning: bool,
) -> Kpis {
	let (last_portfolio_value, last_cumulative_cost) = series
		.last()
		.map(|p| (p.portfolio_value, p.cumulative_cost))
		.unwrap_or((0.0, 0.0));

	let profit_loss = last_portfolio_value - last_cumulative_cost;
	let profit_loss_percent = if last_cumulative_cost > 0.0 {
		profit_loss / last_cumulative_cost * 100.0
	} else {
		0.0
	};

	Kpis {
		last_portfolio_value,
		last_cumulative_cost,
		profit_loss,
		profit_loss_percent,
		total_btc: buys.iter().map(|b| b.btc_bought).sum(),
		last_price_usd: series
			.last()
			.and_then(|p| prices_by_day.get(&p.date))
			.copied()
			.unwrap_or(0.0),
		fallback_rate_warning,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(s: &str) -> Date {
		Date::from_str(s).unwrap()
	}

	/// Price fixture: ignores the window and hands back canned candles.
	struct FixedPrices(Vec<DailyPrice>);

	impl PriceSource for FixedPrices {
		fn daily_closes(
			&self,
			_start_ms: i64,
			_end_ms: i64,
		) -> Result<Vec<DailyPrice>, Error> {
			Ok(self.0.clone())
		}
	}

	struct FixedRates(RateSeries);

	impl RateSource for FixedRates {
		fn rate_series(
			&self,
			_start: Date,
			_end: Date,
		) -> Result<RateSeries, Error> {
			Ok(self.0.clone())
		}
	}

	/// A run that never involves IDR must not consult this at all.
	struct NoRates;

	impl RateSource for NoRates {
		fn rate_series(
			&self,
			_start: Date,
			_end: Date,
		) -> Result<RateSeries, Error> {
			Err(Error::RateFetch("rate source consulted".to_string()))
		}
	}

	fn constant_prices(start: &str, days: i64, close: f64) -> FixedPrices {
		let start = date(start);
		let mut out = Vec::new();
		for i in 0..days {
			let d = start.add_days(i);
			out.push(DailyPrice {
				date: d,
				open_time_ms: d.to_epoch_ms().unwrap(),
				close_usd: close,
			});
		}
		FixedPrices(out)
	}

	fn constant_rates(start: &str, end: &str, rate: f64) -> FixedRates {
		let mut by_day = BTreeMap::new();
		let mut d = date(start);
		while d <= date(end) {
			by_day.insert(d, rate);
			d = d.add_days(1);
		}
		FixedRates(RateSeries::from_daily(by_day))
	}

	fn base_config() -> SimulationConfig {
		SimulationConfig {
			amount: 100.0,
			amount_currency: Currency::Usd,
			display_currency: Currency::Idr,
			frequency: Frequency::Daily,
			begin: date("2024-01-01"),
			end: date("2024-01-10"),
		}
	}

	#[test]
	fn test_validation_rejects_bad_amounts() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);

		let mut config = base_config();
		config.amount = 0.0;
		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::Validation(_))
		));

		config.amount = -5.0;
		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::Validation(_))
		));

		config.amount = f64::NAN;
		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::Validation(_))
		));
	}

	#[test]
	fn test_validation_rejects_inverted_range() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);

		let mut config = base_config();
		config.begin = date("2024-01-10");
		config.end = date("2024-01-01");
		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::Validation(_))
		));
	}

	#[test]
	fn test_constant_price_and_rate_arithmetic() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);
		let rates = constant_rates("2024-01-01", "2024-01-10", 15000.0);
		let config = base_config();

		let result = run(&config, &prices, &rates).unwrap();

		assert_eq!(result.buys.len(), 10);
		assert_eq!(result.series.len(), 10);

		// 10 buys of 100 USD at 50k USD/BTC
		assert!((result.kpis.total_btc - 10.0 * (100.0 / 50000.0)).abs()
			< 1e-12);

		// cost in IDR accrues at each day's rate
		assert_eq!(
			result.kpis.last_cumulative_cost,
			10.0 * 100.0 * 15000.0
		);

		// flat price: the portfolio is worth exactly what it cost
		assert!(
			(result.kpis.last_portfolio_value
				- result.kpis.last_cumulative_cost)
				.abs() < 1e-3
		);
		assert_eq!(result.kpis.last_price_usd, 50000.0);
		assert!(!result.kpis.fallback_rate_warning);
	}

	#[test]
	fn test_cost_conversion_locks_at_transaction_time() {
		let prices = constant_prices("2024-01-01", 2, 50000.0);
		let mut by_day = BTreeMap::new();
		by_day.insert(date("2024-01-01"), 15000.0);
		by_day.insert(date("2024-01-02"), 16000.0);
		let rates = FixedRates(RateSeries::from_daily(by_day));

		let mut config = base_config();
		config.end = date("2024-01-02");

		let result = run(&config, &prices, &rates).unwrap();

		// 100 at 15000 plus 100 at 16000, not 200 at the final rate
		assert_eq!(result.kpis.last_cumulative_cost, 3_100_000.0);
	}

	#[test]
	fn test_usd_only_run_never_consults_rates() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);

		let mut config = base_config();
		config.display_currency = Currency::Usd;

		let result = run(&config, &prices, &NoRates).unwrap();
		assert_eq!(result.buys.len(), 10);
		assert!(result.buys.iter().all(|b| b.idr_spent == 0.0));
		assert_eq!(result.kpis.last_cumulative_cost, 1000.0);
	}

	#[test]
	fn test_idr_amount_derives_usd_spend() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);
		let rates = constant_rates("2024-01-01", "2024-01-10", 15000.0);

		let mut config = base_config();
		config.amount = 1_500_000.0;
		config.amount_currency = Currency::Idr;

		let result = run(&config, &prices, &rates).unwrap();
		let buy = &result.buys[0];
		assert_eq!(buy.idr_spent, 1_500_000.0);
		assert_eq!(buy.usd_spent, 100.0);
		assert!((buy.btc_bought - 100.0 / 50000.0).abs() < 1e-15);
	}

	#[test]
	fn test_idempotent_across_runs() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);
		let rates = constant_rates("2024-01-01", "2024-01-10", 15000.0);
		let config = base_config();

		let a = run(&config, &prices, &rates).unwrap();
		let b = run(&config, &prices, &rates).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_empty_price_history_is_data_unavailable() {
		let prices = FixedPrices(Vec::new());
		let config = base_config();

		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::DataUnavailable(_))
		));
	}

	#[test]
	fn test_all_days_unresolvable_is_no_transactions() {
		// price history starts long after the schedule ends, so every
		// scheduled day exhausts its lookback
		let prices = constant_prices("2024-02-01", 5, 50000.0);

		let mut config = base_config();
		config.display_currency = Currency::Usd;
		config.end = date("2024-01-05");

		assert!(matches!(
			run(&config, &prices, &NoRates),
			Err(Error::NoTransactions)
		));
	}

	#[test]
	fn test_rate_gap_skips_days() {
		let prices = constant_prices("2024-01-01", 15, 50000.0);
		// rates exist only on day one; lookback carries them 7 days
		let rates = constant_rates("2024-01-01", "2024-01-01", 15000.0);

		let mut config = base_config();
		config.end = date("2024-01-15");

		let result = run(&config, &prices, &rates).unwrap();
		assert_eq!(result.buys.len(), 8);
		assert_eq!(result.buys.last().unwrap().date, date("2024-01-08"));
	}

	#[test]
	fn test_price_gap_buy_uses_prior_close() {
		let start = date("2024-01-01");
		let mut candles = Vec::new();
		for (i, close) in
			[(0i64, 50000.0), (1, 51000.0), (2, 52000.0), (4, 54000.0)]
		{
			let d = start.add_days(i);
			candles.push(DailyPrice {
				date: d,
				open_time_ms: d.to_epoch_ms().unwrap(),
				close_usd: close,
			});
		}
		let prices = FixedPrices(candles);

		let mut config = base_config();
		config.display_currency = Currency::Usd;
		config.end = date("2024-01-05");

		let result = run(&config, &prices, &NoRates).unwrap();

		// Jan 4 has no candle; its buy resolves to the Jan 3 close
		assert_eq!(result.buys.len(), 5);
		assert_eq!(result.buys[3].date, date("2024-01-04"));
		assert_eq!(result.buys[3].price_usd, 52000.0);

		// the derived series only visits priced days
		assert_eq!(result.series.len(), 4);
		assert!(result.kpis.total_btc
			> result.series.last().unwrap().cumulative_btc);
	}

	#[test]
	fn test_fallback_rate_flag_is_surfaced() {
		let prices = constant_prices("2024-01-01", 10, 50000.0);
		let rates = FixedRates(RateSeries::from_single_rate(
			date("2024-01-01"),
			date("2024-01-10"),
			16000.0,
		));

		let result = run(&base_config(), &prices, &rates).unwrap();
		assert!(result.kpis.fallback_rate_warning);
		assert_eq!(
			result.kpis.last_cumulative_cost,
			10.0 * 100.0 * 16000.0
		);
	}
}
