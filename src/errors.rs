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
use thiserror::Error;

/// Every way a simulation run can fail. All of these are terminal for the
/// current run; they bubble up to main and print as a single message.
/// Recoverable conditions (an individual rate provider failing, the
/// single-rate fallback engaging) are warned about on stdout instead.
#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid input: {0}")]
	Validation(String),

	#[error("BTC price fetch failed: {0}")]
	PriceFetch(String),

	#[error("USD/IDR rate fetch failed: {0}")]
	RateFetch(String),

	#[error("no data available: {0}")]
	DataUnavailable(String),

	#[error("no transactions in the requested range")]
	NoTransactions,
}
