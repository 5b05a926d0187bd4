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
use std::collections::BTreeMap;

/// How many days backward a lookup will search before giving up. Rate and
/// price series have weekend and holiday gaps; this tolerates short gaps
/// without inventing data for long ones.
pub const MAX_LOOKBACK_DAYS: u32 = 7;

/// Resolves a value for the given day from a sparse date-keyed series: an
/// exact entry wins, otherwise the search steps backward one day at a time,
/// at most max_lookback_days times. Entries that are zero, negative, or
/// non-finite are treated as absent; callers divide and multiply by what
/// this returns.
pub fn closest_prior(
	series: &BTreeMap<Date, f64>,
	day: Date,
	max_lookback_days: u32,
) -> Option<f64> {
	let mut d = day;

	for _ in 0..=max_lookback_days {
		if let Some(&v) = series.get(&d) {
			if v.is_finite() && v > 0.0 {
				return Some(v);
			}
		}
		d = d.add_days(-1);
	}

	None
}

/// A daily USD-to-IDR rate series. When every historical provider came up
/// empty and the series was synthesized from one current rate, the flag
/// records that so the run can warn about it.
#[derive(Clone, Debug, PartialEq)]
pub struct RateSeries {
	by_day: BTreeMap<Date, f64>,
	fallback_single_rate: bool,
}

impl RateSeries {
	pub fn from_daily(by_day: BTreeMap<Date, f64>) -> Self {
		Self {
			by_day,
			fallback_single_rate: false,
		}
	}

	/// Synthesizes a series that covers every day in [start, end] with a
	/// single rate, marking itself as degraded.
	pub fn from_single_rate(start: Date, end: Date, rate: f64) -> Self {
		let mut by_day = BTreeMap::new();
		let mut d = start;
		while d <= end {
			by_day.insert(d, rate);
			d = d.add_days(1);
		}

		Self {
			by_day,
			fallback_single_rate: true,
		}
	}

	pub fn is_empty(&self) -> bool {
		self.by_day.is_empty()
	}

	pub fn is_fallback_single_rate(&self) -> bool {
		self.fallback_single_rate
	}

	/// Rate for the given day, via closest-prior resolution.
	pub fn resolve(&self, day: Date) -> Option<f64> {
		closest_prior(&self.by_day, day, MAX_LOOKBACK_DAYS)
	}
}
