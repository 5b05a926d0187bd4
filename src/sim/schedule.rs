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
use clap::ValueEnum;
use std::fmt;

/// How often a recurring buy happens.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
	Daily,
	Weekly,
	Monthly,
}

impl fmt::Display for Frequency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Frequency::Daily => write!(f, "daily"),
			Frequency::Weekly => write!(f, "weekly"),
			Frequency::Monthly => write!(f, "monthly"),
		}
	}
}

/// Generates the ordered list of buy dates: begins at start (inclusive),
/// steps by one day, seven days, or one calendar month, and includes every
/// stepped date up to and including end.
///
/// Monthly steps apply to the previously emitted date, so a schedule that
/// starts on Jan 31 continues on the last day of February and then stays
/// on the 28th/29th from there on.
pub fn generate_schedule(
	start: Date,
	end: Date,
	frequency: Frequency,
) -> Vec<Date> {
	let mut schedule = Vec::new();
	let mut d = start;

	while d <= end {
		schedule.push(d);
		d = match frequency {
			Frequency::Daily => d.add_days(1),
			Frequency::Weekly => d.add_days(7),
			Frequency::Monthly => d.add_months(1),
		};
	}

	schedule
}
