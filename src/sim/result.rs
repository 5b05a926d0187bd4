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
use crate::util::date::Date;

/// One executed buy on the schedule. Both spent amounts are populated:
/// one is the configured recurring amount, the other is derived through
/// the exchange rate resolved for that date (zero when the run never
/// touched IDR).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledBuy {
	pub date: Date,
	pub price_usd: f64,
	pub usd_spent: f64,
	pub idr_spent: f64,
	pub btc_bought: f64,
}

/// One day of the derived series, in the display currency. BTC and cost
/// only ever grow; value moves with the price.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailySeriesPoint {
	pub date: Date,
	pub cumulative_btc: f64,
	pub cumulative_cost: f64,
	pub portfolio_value: f64,
}

/// Headline figures for the whole run, in the display currency except
/// where named otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Kpis {
	pub last_portfolio_value: f64,
	pub last_cumulative_cost: f64,
	pub profit_loss: f64,
	pub profit_loss_percent: f64,
	pub total_btc: f64,
	pub last_price_usd: f64,

	/// True when USD/IDR resolution degraded to one current rate applied
	/// to every day in range.
	pub fallback_rate_warning: bool,
}

/// Everything a single simulation run produces. Built fresh per run and
/// owned by the caller; the engine keeps nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationResult {
	pub buys: Vec<ScheduledBuy>,
	pub series: Vec<DailySeriesPoint>,
	pub kpis: Kpis,
}
