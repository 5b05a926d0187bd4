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
use crate::sim::engine::RateSource;
use crate::sim::series::RateSeries;
use crate::sources::http::Client;
use crate::util::date::Date;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FRANKFURTER_API_URL: &str = "https://api.frankfurter.app";
const EXCHANGERATE_HOST_API_URL: &str = "https://api.exchangerate.host";

// -------------
// -- SENDING --
// -------------

#[derive(Debug, Serialize)]
struct FrankfurterParams {
	from: &'static str,
	to: &'static str,
}

#[derive(Debug, Serialize)]
struct TimeseriesParams {
	start_date: String,
	end_date: String,
	base: &'static str,
	symbols: &'static str,
}

#[derive(Debug, Serialize)]
struct LatestParams {
	base: &'static str,
	symbols: &'static str,
}

// ---------------
// -- RECEIVING --
// ---------------

/// Both providers answer time-series queries with the same shape: a map
/// of ISO date to a per-symbol rate object.
#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
	#[serde(default)]
	rates: BTreeMap<String, DayRates>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
	#[serde(default)]
	rates: Option<DayRates>,
}

#[derive(Debug, Default, Deserialize)]
struct DayRates {
	#[serde(rename = "IDR")]
	idr: Option<f64>,
}

impl TimeSeriesResponse {
	/// Days without an IDR entry are dropped, not zero-filled.
	fn into_daily(self) -> Result<BTreeMap<Date, f64>, anyhow::Error> {
		let mut out = BTreeMap::new();
		for (date_str, day) in self.rates {
			if let Some(rate) = day.idr {
				out.insert(Date::from_str(&date_str)?, rate);
			}
		}
		Ok(out)
	}
}

impl LatestResponse {
	fn into_rate(self) -> Result<f64, anyhow::Error> {
		match self.rates.unwrap_or_default().idr {
			Some(rate) if rate > 0.0 => Ok(rate),
			_ => bail!("no IDR rate in response"),
		}
	}
}

/// One historical USD/IDR source: a time-series query over a date range,
/// plus a latest-rate query used only in degraded fallback.
pub trait RateProvider {
	fn name(&self) -> &'static str;

	fn time_series(
		&self,
		start: Date,
		end: Date,
	) -> Result<BTreeMap<Date, f64>, anyhow::Error>;

	fn latest(&self) -> Result<f64, anyhow::Error>;
}

pub struct FrankfurterSource {
	http: Client,
}

impl FrankfurterSource {
	pub fn new(base_url: Option<&str>) -> Result<Self, anyhow::Error> {
		Ok(FrankfurterSource {
			http: Client::new(base_url.unwrap_or(FRANKFURTER_API_URL))?,
		})
	}
}

impl RateProvider for FrankfurterSource {
	fn name(&self) -> &'static str {
		"frankfurter"
	}

	fn time_series(
		&self,
		start: Date,
		end: Date,
	) -> Result<BTreeMap<Date, f64>, anyhow::Error> {
		// range goes in the path for this provider: /2024-01-01..2024-02-01
		let resp: TimeSeriesResponse = self.http.get(
			&format!("{}..{}", start, end),
			Some(FrankfurterParams {
				from: "USD",
				to: "IDR",
			}),
		)?;

		resp.into_daily()
	}

	fn latest(&self) -> Result<f64, anyhow::Error> {
		let resp: LatestResponse = self.http.get(
			"latest",
			Some(FrankfurterParams {
				from: "USD",
				to: "IDR",
			}),
		)?;

		resp.into_rate()
	}
}

pub struct ExchangerateHostSource {
	http: Client,
}

impl ExchangerateHostSource {
	pub fn new(base_url: Option<&str>) -> Result<Self, anyhow::Error> {
		Ok(ExchangerateHostSource {
			http: Client::new(base_url.unwrap_or(EXCHANGERATE_HOST_API_URL))?,
		})
	}
}

impl RateProvider for ExchangerateHostSource {
	fn name(&self) -> &'static str {
		"exchangerate.host"
	}

	fn time_series(
		&self,
		start: Date,
		end: Date,
	) -> Result<BTreeMap<Date, f64>, anyhow::Error> {
		let resp: TimeSeriesResponse = self.http.get(
			"timeseries",
			Some(TimeseriesParams {
				start_date: start.to_string(),
				end_date: end.to_string(),
				base: "USD",
				symbols: "IDR",
			}),
		)?;

		resp.into_daily()
	}

	fn latest(&self) -> Result<f64, anyhow::Error> {
		let resp: LatestResponse = self.http.get(
			"latest",
			Some(LatestParams {
				base: "USD",
				symbols: "IDR",
			}),
		)?;

		resp.into_rate()
	}
}

/// Resolves a rate series by walking an ordered list of providers: first
/// each provider's historical time series, then, with history exhausted,
/// the first obtainable current rate replicated across the whole range.
/// Individual failures are warned about and swallowed; only running out
/// of every option is an error.
pub struct TieredRateSource {
	providers: Vec<Box<dyn RateProvider>>,
}

impl TieredRateSource {
	pub fn new(
		frankfurter_url: Option<&str>,
		exchangerate_host_url: Option<&str>,
	) -> Result<Self, anyhow::Error> {
		Ok(TieredRateSource {
			providers: vec![
				Box::new(FrankfurterSource::new(frankfurter_url)?),
				Box::new(ExchangerateHostSource::new(exchangerate_host_url)?),
			],
		})
	}
}

impl RateSource for TieredRateSource {
	fn rate_series(&self, start: Date, end: Date) -> Result<RateSeries, Error> {
		for provider in &self.providers {
			match provider.time_series(start, end) {
				Ok(daily) if !daily.is_empty() => {
					return Ok(RateSeries::from_daily(daily))
				},
				Ok(_) => {
					println!(
						"[rates] {} returned an empty series for {}..{}",
						provider.name(),
						start,
						end
					);
				},
				Err(e) => {
					println!(
						"[rates] {} time series unavailable: {}",
						provider.name(),
						e
					);
				},
			}
		}

		for provider in &self.providers {
			match provider.latest() {
				Ok(rate) => {
					println!(
						"[rates] using a single current rate from {} for every day in range",
						provider.name()
					);
					return Ok(RateSeries::from_single_rate(start, end, rate));
				},
				Err(e) => {
					println!(
						"[rates] {} latest rate unavailable: {}",
						provider.name(),
						e
					);
				},
			}
		}

		Err(Error::RateFetch(format!(
			"every provider failed for {}..{}",
			start, end
		)))
	}
}
