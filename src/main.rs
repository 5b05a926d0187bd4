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
use crate::config::config_file::Config;
use crate::reports::csv;
use crate::reports::sim_reporter::SimReporter;
use crate::sim::engine::{Currency, SimulationConfig};
use crate::sim::result::SimulationResult;
use crate::sim::schedule::{generate_schedule, Frequency};
use crate::sources::binance::BinanceSource;
use crate::sources::rates::TieredRateSource;
use crate::util::date::Date;
use anyhow::{bail, Error};
use chrono::Utc;
use clap::{Parser, ValueEnum};
use std::fs;

mod config;
mod errors;
mod reports;
mod sim;
mod sources;
mod util;

/// The first day with BTCUSDT history on the default price provider.
const DEFAULT_BEGIN: &str = "2017-08-17";

#[derive(Parser)]
#[command(
	name = "dcasim",
	version = "1.0",
	about = "Bitcoin DCA backtesting tool"
)]
struct Cli {
	// ----------------
	// -- POSITIONAL --
	// ----------------
	/// The command to execute
	command: Directive,

	/// Output file for the Export command (default: dca-buys.csv)
	#[arg(required = false)]
	out: Option<String>,

	// -----------
	// -- FLAGS --
	// -----------
	/// Recurring investment amount, denominated in --amount-currency
	#[arg(short, long)]
	amount: Option<f64>,

	/// Currency the recurring amount is denominated in
	#[arg(long, value_enum, default_value_t = Currency::Usd)]
	amount_currency: Currency,

	/// Currency that cost and portfolio value are reported in
	#[arg(short, long, value_enum, default_value_t = Currency::Usd)]
	currency: Currency,

	/// How often a buy happens
	#[arg(short, long, value_enum, default_value_t = Frequency::Monthly)]
	frequency: Frequency,

	/// First day of the backtest (YYYY-MM-DD)
	#[arg(short, long)]
	begin: Option<String>,

	/// Last day of the backtest (YYYY-MM-DD, default today)
	#[arg(short, long)]
	end: Option<String>,

	/// Custom config file location (default: ~/.config/dcasim/config.toml)
	#[arg(long)]
	config: Option<String>,

	/// Maximum amount of decimal places to show for any amounts
	#[arg(short, long)]
	precision: Option<u32>,
}

impl Cli {
	/// The point is that this number exceeds what anyone wants; it's just to
	/// stop the program from printing e.g. millions of zeroes by accident
	const MAX_PRECISION: u32 = 50;

	/// Extra validations on top of what clap does
	fn validate(&self) -> Result<(), Error> {
		if let Some(prec) = self.precision {
			if prec > Cli::MAX_PRECISION {
				bail!("Maximum precision is {}", Cli::MAX_PRECISION);
			}
		}

		Ok(())
	}
}

#[derive(ValueEnum, Clone, PartialEq)]
enum Directive {
	Run,      // simulate and print the report
	Export,   // simulate and write the buys as CSV
	Schedule, // print the buy dates without touching the network
}

fn main() -> Result<(), Error> {
	let args = Cli::parse();
	args.validate()?;

	let (begin, end) = get_range(&args)?;

	match args.command {
		Directive::Schedule => {
			for day in generate_schedule(begin, end, args.frequency) {
				println!("{}", day);
			}
		},
		Directive::Run => {
			let config = simulation_config(&args, begin, end)?;
			let result = execute(&args, &config)?;
			SimReporter::new(result, config, args.precision).print_report();
		},
		Directive::Export => {
			let config = simulation_config(&args, begin, end)?;
			let result = execute(&args, &config)?;

			let path = args
				.out
				.clone()
				.unwrap_or_else(|| "dca-buys.csv".to_string());
			fs::write(&path, csv::render(&result) + "\n")?;
			println!("Wrote {} buys to {}", result.buys.len(), path);
		},
	}

	Ok(())
}

fn simulation_config(
	args: &Cli,
	begin: Date,
	end: Date,
) -> Result<SimulationConfig, Error> {
	let Some(amount) = args.amount else {
		bail!("No amount specified");
	};

	Ok(SimulationConfig {
		amount,
		amount_currency: args.amount_currency,
		display_currency: args.currency,
		frequency: args.frequency,
		begin,
		end,
	})
}

/// Wires the production data sources to the engine. Provider endpoints
/// can be redirected through the config file.
fn execute(
	args: &Cli,
	config: &SimulationConfig,
) -> Result<SimulationResult, Error> {
	let file_config = Config::load(args.config.as_ref())?;
	let providers = file_config.providers.unwrap_or_default();

	let prices = BinanceSource::new(providers.binance_url.as_deref())?;
	let rates = TieredRateSource::new(
		providers.frankfurter_url.as_deref(),
		providers.exchangerate_host_url.as_deref(),
	)?;

	Ok(sim::engine::run(config, &prices, &rates)?)
}

fn get_range(args: &Cli) -> Result<(Date, Date), Error> {
	let begin = Date::from_str(args.begin.as_deref().unwrap_or(DEFAULT_BEGIN))
		.map_err(|e| errors::Error::Validation(e.to_string()))?;

	let end = match &args.end {
		Some(e) => Date::from_str(e)
			.map_err(|e| errors::Error::Validation(e.to_string()))?,
		None => today(),
	};

	Ok((begin, end))
}

fn today() -> Date {
	Date::from_str(&Utc::now().date_naive().to_string()).unwrap()
}
