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
use crate::reports::table::Table;
use crate::sim::engine::{Currency, SimulationConfig};
use crate::sim::result::SimulationResult;
use std::collections::BTreeMap;

/// Prints a completed run: the headline figures, the full buys listing,
/// and the degraded-rates banner when it applies. Display rounding
/// happens here and only here; the underlying result keeps every digit.
pub struct SimReporter {
	result: SimulationResult,
	config: SimulationConfig,
	precision: u32,
}

impl SimReporter {
	pub fn new(
		result: SimulationResult,
		config: SimulationConfig,
		precision: Option<u32>,
	) -> Self {
		Self {
			result,
			config,
			precision: precision.unwrap_or(u32::MAX),
		}
	}

	pub fn print_report(&self) {
		self.print_kpis();
		self.print_buys();

		if self.result.kpis.fallback_rate_warning {
			println!();
			println!(
				"[warning] USD/IDR rates used one current value for every day (historical rates unavailable)"
			);
		}
	}

	fn print_kpis(&self) {
		let k = &self.result.kpis;
		let disp = self.config.display_currency;

		let mut table = Table::new(2);
		table.right_align(vec![1]);

		table.add_row(vec![
			"Portfolio value".to_string(),
			self.money(k.last_portfolio_value, disp),
		]);
		table.add_row(vec![
			"Total cost".to_string(),
			self.money(k.last_cumulative_cost, disp),
		]);
		table.add_row(vec![
			"Profit/loss".to_string(),
			format!(
				"{} ({:.2}%)",
				self.money(k.profit_loss, disp),
				k.profit_loss_percent
			),
		]);
		table.add_row(vec![
			"BTC acquired".to_string(),
			self.btc(k.total_btc),
		]);
		table.add_row(vec![
			"Last BTC price".to_string(),
			self.money(k.last_price_usd, Currency::Usd),
		]);

		table.print();
	}

	fn print_buys(&self) {
		let disp = self.config.display_currency;

		let mut cost_by_day = BTreeMap::new();
		let mut value_by_day = BTreeMap::new();
		for p in &self.result.series {
			cost_by_day.insert(p.date, p.cumulative_cost);
			value_by_day.insert(p.date, p.portfolio_value);
		}

		let mut table = Table::new(7);
		table.right_align(vec![1, 2, 3, 4, 5, 6]);

		let cost_header = format!("Cum Cost ({})", disp);
		let value_header = format!("Value ({})", disp);
		table.add_header(vec![
			"Date",
			"Price USD",
			"Spent USD",
			"Spent IDR",
			"BTC Bought",
			cost_header.as_str(),
			value_header.as_str(),
		]);
		table.add_separator();

		for b in &self.result.buys {
			table.add_row(vec![
				b.date.to_string(),
				self.money(b.price_usd, Currency::Usd),
				self.money(b.usd_spent, Currency::Usd),
				self.money(b.idr_spent, Currency::Idr),
				self.btc(b.btc_bought),
				self.money(
					cost_by_day.get(&b.date).copied().unwrap_or(0.0),
					disp,
				),
				self.money(
					value_by_day.get(&b.date).copied().unwrap_or(0.0),
					disp,
				),
			]);
		}

		table.print();
	}

	fn money(&self, value: f64, currency: Currency) -> String {
		let decimals = match currency {
			Currency::Usd => 2,
			Currency::Idr => 0,
		}
		.min(self.precision) as usize;

		format!("{:.decimals$} {}", value, currency)
	}

	fn btc(&self, value: f64) -> String {
		let decimals = 8.min(self.precision) as usize;
		format!("{:.decimals$} BTC", value)
	}
}
