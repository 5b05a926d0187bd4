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
use crate::sim::engine::PriceSource;
use crate::sources::http::Client;
use crate::util::date::Date;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";

const SYMBOL: &str = "BTCUSDT";
const INTERVAL: &str = "1d";

/// The provider's per-request row cap. A page shorter than this is the
/// last one.
const PAGE_LIMIT: usize = 1000;

/// One daily candle close, keyed by its UTC calendar day.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyPrice {
	pub date: Date,
	pub open_time_ms: i64,
	pub close_usd: f64,
}

// -------------
// -- SENDING --
// -------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KlinesParams {
	symbol: &'static str,
	interval: &'static str,
	start_time: i64,
	end_time: i64,
	limit: usize,
}

// ---------------
// -- RECEIVING --
// ---------------

/// The fields this tool reads out of a kline row. The provider sends each
/// row as a positional JSON array mixing integers and decimal strings:
/// open time at 0, close price at 4, close time at 6.
struct Kline {
	open_time_ms: i64,
	close_usd: f64,
	close_time_ms: i64,
}

impl Kline {
	fn from_row(row: &[Value]) -> Result<Kline, Error> {
		let open_time_ms = row
			.first()
			.and_then(Value::as_i64)
			.ok_or_else(|| malformed("open time"))?;

		let close_usd = row
			.get(4)
			.and_then(Value::as_str)
			.ok_or_else(|| malformed("close price"))?
			.parse::<f64>()
			.map_err(|_| malformed("close price"))?;

		let close_time_ms = row
			.get(6)
			.and_then(Value::as_i64)
			.ok_or_else(|| malformed("close time"))?;

		Ok(Kline {
			open_time_ms,
			close_usd,
			close_time_ms,
		})
	}
}

fn malformed(field: &str) -> Error {
	Error::PriceFetch(format!("malformed kline row: bad {}", field))
}

/// Builds the date-keyed close map the engine works from. Provider pages
/// are sequential and non-overlapping, so on a duplicate date the last
/// write wins.
pub fn price_by_day(prices: &[DailyPrice]) -> BTreeMap<Date, f64> {
	let mut map = BTreeMap::new();
	for p in prices {
		map.insert(p.date, p.close_usd);
	}
	map
}

/// Daily BTCUSDT close history from a Binance-compatible endpoint.
pub struct BinanceSource {
	http: Client,
}

impl BinanceSource {
	pub fn new(base_url: Option<&str>) -> Result<Self, anyhow::Error> {
		Ok(BinanceSource {
			http: Client::new(base_url.unwrap_or(BINANCE_API_URL))?,
		})
	}

	/// Pages through [start_ms, end_ms), advancing the window start to one
	/// millisecond past the last row's close time, and stopping on a short
	/// or empty page. A failed request at any page fails the whole call;
	/// nothing partial is returned.
	fn fetch_all(
		&self,
		start_ms: i64,
		end_ms: i64,
	) -> Result<Vec<DailyPrice>, Error> {
		let mut out = Vec::new();
		let mut cursor = start_ms;

		while cursor < end_ms {
			let page: Vec<Vec<Value>> = self
				.http
				.get(
					"klines",
					Some(KlinesParams {
						symbol: SYMBOL,
						interval: INTERVAL,
						start_time: cursor,
						end_time: end_ms,
						limit: PAGE_LIMIT,
					}),
				)
				.map_err(|e| Error::PriceFetch(e.to_string()))?;

			if page.is_empty() {
				break;
			}

			let mut last_close_time = 0;
			for row in &page {
				let kline = Kline::from_row(row)?;
				out.push(DailyPrice {
					date: Date::from_epoch_ms(kline.open_time_ms)
						.map_err(|e| Error::PriceFetch(e.to_string()))?,
					open_time_ms: kline.open_time_ms,
					close_usd: kline.close_usd,
				});
				last_close_time = kline.close_time_ms;
			}

			cursor = last_close_time + 1;

			if page.len() < PAGE_LIMIT {
				break;
			}
		}

		Ok(out)
	}
}

impl PriceSource for BinanceSource {
	fn daily_closes(
		&self,
		start_ms: i64,
		end_ms: i64,
	) -> Result<Vec<DailyPrice>, Error> {
		self.fetch_all(start_ms, end_ms)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn row(open_ms: i64, close: &str, close_ms: i64) -> Vec<Value> {
		json!([
			open_ms, "42000.1", "43100.0", "41200.5", close, "1234.5",
			close_ms, "52000000.0", 98765, "600.1", "25000000.0", "0"
		])
		.as_array()
		.unwrap()
		.clone()
	}

	#[test]
	fn test_kline_from_row() {
		// 2024-06-01T00:00:00Z .. 2024-06-01T23:59:59.999Z
		let k =
			Kline::from_row(&row(1717200000000, "67500.25", 1717286399999))
				.unwrap();
		assert_eq!(k.open_time_ms, 1717200000000);
		assert_eq!(k.close_usd, 67500.25);
		assert_eq!(k.close_time_ms, 1717286399999);
	}

	#[test]
	fn test_kline_from_malformed_row() {
		assert!(Kline::from_row(&[]).is_err());

		// close price must be a decimal string
		let bad = json!([1717200000000_i64, "1", "2", "3", 67500.25, "5",
			1717286399999_i64])
		.as_array()
		.unwrap()
		.clone();
		assert!(Kline::from_row(&bad).is_err());

		let unparseable = json!([1717200000000_i64, "1", "2", "3", "not-a-number",
			"5", 1717286399999_i64])
		.as_array()
		.unwrap()
		.clone();
		assert!(Kline::from_row(&unparseable).is_err());
	}

	#[test]
	fn test_price_by_day_last_write_wins() {
		let date = Date::from_str("2024-06-01").unwrap();
		let prices = vec![
			DailyPrice {
				date,
				open_time_ms: 1717200000000,
				close_usd: 67000.0,
			},
			DailyPrice {
				date,
				open_time_ms: 1717200000000,
				close_usd: 67500.0,
			},
		];

		let map = price_by_day(&prices);
		assert_eq!(map.len(), 1);
		assert_eq!(map.get(&date), Some(&67500.0));
	}
}
