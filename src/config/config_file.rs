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
use anyhow::{anyhow, Error};
use dirs::home_dir;
use serde::Deserialize;
use std::fs;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
	pub providers: Option<Providers>,
}

/// Endpoint overrides, mostly useful for pointing the tool at mirrors or
/// a local stub while testing. Absent keys mean the production hosts.
#[derive(Debug, Default, Deserialize)]
pub struct Providers {
	pub binance_url: Option<String>,
	pub frankfurter_url: Option<String>,
	pub exchangerate_host_url: Option<String>,
}

impl Config {
	/// Fetches the config from the given path, or the default path if
	/// none. A missing default config is created empty; a missing custom
	/// path is an error.
	pub fn load(custom_config_path: Option<&String>) -> Result<Config, Error> {
		let config_path = match &custom_config_path {
			None => {
				let home_dir = home_dir().ok_or_else(|| {
					anyhow!("Unable to determine home directory")
				})?;
				home_dir.join(".config/dcasim/config.toml")
			},
			Some(p) => PathBuf::from(p),
		};

		// create empty config file if it doesn't exist
		if !config_path.exists() && custom_config_path.is_none() {
			if let Some(parent) = config_path.parent() {
				fs::create_dir_all(parent)?;
			}
			File::create(config_path.clone())?;
		}

		let content = fs::read_to_string(config_path)?;
		let config: Config = toml::from_str(&content)
			.map_err(|e| anyhow!("failed to parse config: {}", e))?;

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_provider_overrides() {
		let content = r#"
			[providers]
			binance_url = "http://localhost:9000"
			frankfurter_url = "http://localhost:9001"
		"#;

		let config: Config = toml::from_str(content).unwrap();
		let providers = config.providers.unwrap();
		assert_eq!(
			providers.binance_url.as_deref(),
			Some("http://localhost:9000")
		);
		assert_eq!(
			providers.frankfurter_url.as_deref(),
			Some("http://localhost:9001")
		);
		assert!(providers.exchangerate_host_url.is_none());
	}

	#[test]
	fn test_empty_config_is_valid() {
		let config: Config = toml::from_str("").unwrap();
		assert!(config.providers.is_none());
	}
}
