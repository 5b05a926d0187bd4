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
use crate::sim::result::{ScheduledBuy, SimulationResult};
use crate::util::date::Date;
use anyhow::{bail, Error};
use std::collections::BTreeMap;

pub const HEADER: [&str; 7] = [
	"Date",
	"Price USD",
	"Spent USD",
	"Spent IDR",
	"BTC Bought",
	"Cumulative Cost (display)",
	"Portfolio Value (display)",
];

/// Renders one row per buy, every field quoted, embedded quotes doubled.
/// Numbers print in Rust's shortest round-trip form, so a parse of the
/// output reconstructs them exactly.
pub fn render(result: &SimulationResult) -> String {
	let mut cost_by_day = BTreeMap::new();
	let mut value_by_day = BTreeMap::new();
	for p in &result.series {
		cost_by_day.insert(p.date, p.cumulative_cost);
		value_by_day.insert(p.date, p.portfolio_value);
	}

	let mut lines = Vec::with_capacity(result.buys.len() + 1);
	lines.push(to_line(&HEADER.map(|s| s.to_string())));

	for b in &result.buys {
		lines.push(to_line(&[
			b.date.to_string(),
			b.price_usd.to_string(),
			b.usd_spent.to_string(),
			b.idr_spent.to_string(),
			b.btc_bought.to_string(),
			cost_by_day.get(&b.date).copied().unwrap_or(0.0).to_string(),
			value_by_day.get(&b.date).copied().unwrap_or(0.0).to_string(),
		]));
	}

	lines.join("\n")
}

/// Reads the buy fields back out of an export. The two cumulative columns
/// are display-currency context, not part of the buy itself.
pub fn parse_buys(data: &str) -> Result<Vec<ScheduledBuy>, Error> {
	let mut out = Vec::new();

	for (i, line) in data.lines().enumerate() {
		if i == 0 || line.is_empty() {
			continue;
		}

		let fields = split_line(line)?;
		if fields.len() != HEADER.len() {
			bail!(
				"row {}: expected {} fields, found {}",
				i + 1,
				HEADER.len(),
				fields.len()
			);
		}

		out.push(ScheduledBuy {
			date: Date::from_str(&fields[0])?,
			price_usd: fields[1].parse()?,
			usd_spent: fields[2].parse()?,
			idr_spent: fields[3].parse()?,
			btc_bought: fields[4].parse()?,
		});
	}

	Ok(out)
}

fn to_line(fields: &[String]) -> String {
	fields
		.iter()
		.map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
		.collect::<Vec<_>>()
		.join(",")
}

fn split_line(line: &str) -> Result<Vec<String>, Error> {
	let mut fields = Vec::new();
	let mut field = String::new();
	let mut chars = line.chars().peekable();

	loop {
		if chars.next() != Some('"') {
			bail!("expected a quoted field");
		}

		loop {
			match chars.next() {
				Some('"') => {
					// a doubled quote is a literal one
					if chars.peek() == Some(&'"') {
						chars.next();
						field.push('"');
					} else {
						break;
					}
				},
				Some(c) => field.push(c),
				None => bail!("unterminated field"),
			}
		}

		fields.push(std::mem::take(&mut field));

		match chars.next() {
			Some(',') => continue,
			None => break,
			Some(c) => bail!("unexpected character after field: {}", c),
		}
	}

	Ok(fields)
}
