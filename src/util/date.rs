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

use anyhow::{bail, Error};
use chrono::{DateTime, Datelike, NaiveDate};
use std::cmp::Ordering;
use std::fmt;

/// A UTC calendar day. Time of day is never represented; instants coming
/// from providers are truncated to their UTC date on the way in.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct Date {
	year: u32,
	month: u8,
	day: u8,
}

impl Date {
	/// Constructor to parse a string in the "YYYY-mm-dd" format
	pub fn from_str(date_str: &str) -> Result<Date, Error> {
		let parts: Vec<&str> = date_str.split('-').collect();
		if parts.len() != 3 {
			bail!("Date format must be YYYY-MM-DD");
		}

		let year = parts[0].parse::<u32>()?;
		let month = parts[1].parse::<u8>()?;
		let day = parts[2].parse::<u8>()?;

		// Validate the date
		if !Date::is_valid_date(year, month, day) {
			bail!("Invalid date");
		}

		Ok(Date { year, month, day })
	}

	/// Truncates a UTC millisecond timestamp to its calendar day.
	pub fn from_epoch_ms(ms: i64) -> Result<Date, Error> {
		let Some(instant) = DateTime::from_timestamp_millis(ms) else {
			bail!("timestamp out of range: {}", ms);
		};

		let d = instant.date_naive();
		Ok(Date {
			year: d.year() as u32,
			month: d.month() as u8,
			day: d.day() as u8,
		})
	}

	/// Midnight UTC on this day, in epoch milliseconds.
	pub fn to_epoch_ms(&self) -> Result<i64, Error> {
		let Some(d) = NaiveDate::from_ymd_opt(
			self.year as i32,
			self.month as u32,
			self.day as u32,
		) else {
			bail!("date out of range: {}", self);
		};

		let Some(midnight) = d.and_hms_opt(0, 0, 0) else {
			bail!("date out of range: {}", self);
		};

		Ok(midnight.and_utc().timestamp_millis())
	}

	/// Steps forward (or, with a negative argument, backward) by whole days.
	pub fn add_days(&self, n: i64) -> Date {
		let mut year = self.year;
		let mut month = self.month;
		let mut day = self.day as i64 + n;

		loop {
			if day < 1 {
				if month == 1 {
					year -= 1;
					month = 12;
				} else {
					month -= 1;
				}
				day += Date::days_in_month(year, month) as i64;
			} else {
				let dim = Date::days_in_month(year, month) as i64;
				if day <= dim {
					break;
				}
				day -= dim;
				if month == 12 {
					year += 1;
					month = 1;
				} else {
					month += 1;
				}
			}
		}

		Date {
			year,
			month,
			day: day as u8,
		}
	}

	/// Steps by whole calendar months, clamping to the last valid day of
	/// the target month when the source day-of-month does not exist there
	/// (Jan 31 + 1 -> Feb 28, or Feb 29 in a leap year).
	pub fn add_months(&self, n: i32) -> Date {
		let total = self.year as i32 * 12 + (self.month as i32 - 1) + n;
		let year = total.div_euclid(12) as u32;
		let month = (total.rem_euclid(12) + 1) as u8;
		let day = self.day.min(Date::days_in_month(year, month));

		Date { year, month, day }
	}

	fn is_leap_year(year: u32) -> bool {
		(year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
	}

	fn days_in_month(year: u32, month: u8) -> u8 {
		match month {
			1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
			4 | 6 | 9 | 11 => 30,
			2 => {
				if Date::is_leap_year(year) {
					29
				} else {
					28
				}
			},
			_ => 0, // Invalid month
		}
	}

	fn is_valid_date(year: u32, month: u8, day: u8) -> bool {
		if !(1..=12).contains(&month) {
			return false;
		}
		if day < 1 || day > Date::days_in_month(year, month) {
			return false;
		}
		true
	}
}

impl PartialOrd for Date {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Date {
	fn cmp(&self, other: &Self) -> Ordering {
		(self.year, self.month, self.day).cmp(&(
			other.year,
			other.month,
			other.day,
		))
	}
}

impl fmt::Display for Date {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_and_display() {
		let date = Date::from_str("2024-11-15").unwrap();
		assert_eq!(date.to_string(), "2024-11-15");

		assert!(Date::from_str("2024-02-30").is_err());
		assert!(Date::from_str("2024-13-01").is_err());
		assert!(Date::from_str("not-a-date").is_err());
		assert!(Date::from_str("2024-11").is_err());
	}

	#[test]
	fn test_add_days_within_month() {
		let date = Date::from_str("2024-11-15").unwrap();
		assert_eq!(date.add_days(1).to_string(), "2024-11-16");
		assert_eq!(date.add_days(-1).to_string(), "2024-11-14");
	}

	#[test]
	fn test_add_days_across_month_and_year() {
		let date = Date::from_str("2023-12-30").unwrap();
		assert_eq!(date.add_days(3).to_string(), "2024-01-02");
		assert_eq!(
			Date::from_str("2024-03-01")
				.unwrap()
				.add_days(-2)
				.to_string(),
			"2024-02-28"
		);
	}

	#[test]
	fn test_add_days_leap_year() {
		let date = Date::from_str("2024-02-28").unwrap();
		assert_eq!(date.add_days(1).to_string(), "2024-02-29");
		assert_eq!(date.add_days(2).to_string(), "2024-03-01");
	}

	#[test]
	fn test_add_days_long_span() {
		let date = Date::from_str("2024-01-01").unwrap();
		assert_eq!(date.add_days(366).to_string(), "2025-01-01");
	}

	#[test]
	fn test_add_months_simple() {
		let date = Date::from_str("2024-03-15").unwrap();
		assert_eq!(date.add_months(1).to_string(), "2024-04-15");
		assert_eq!(date.add_months(12).to_string(), "2025-03-15");
	}

	#[test]
	fn test_add_months_end_of_month_clamp() {
		let date = Date::from_str("2024-01-31").unwrap();
		assert_eq!(date.add_months(1).to_string(), "2024-02-29");

		let date = Date::from_str("2023-01-31").unwrap();
		assert_eq!(date.add_months(1).to_string(), "2023-02-28");

		let date = Date::from_str("2024-10-31").unwrap();
		assert_eq!(date.add_months(1).to_string(), "2024-11-30");
	}

	#[test]
	fn test_add_months_across_year() {
		let date = Date::from_str("2024-11-30").unwrap();
		assert_eq!(date.add_months(2).to_string(), "2025-01-30");
	}

	#[test]
	fn test_epoch_ms_round_trip() {
		let date = Date::from_str("2024-06-01").unwrap();
		let ms = date.to_epoch_ms().unwrap();
		assert_eq!(Date::from_epoch_ms(ms).unwrap(), date);

		// any instant within the day truncates to the same day
		let late = ms + 23 * 3600 * 1000 + 59 * 60 * 1000;
		assert_eq!(Date::from_epoch_ms(late).unwrap(), date);
	}

	#[test]
	fn test_ordering() {
		let a = Date::from_str("2024-01-31").unwrap();
		let b = Date::from_str("2024-02-01").unwrap();
		assert!(a < b);
		assert!(b > a);
	}
}
