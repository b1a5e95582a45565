//! `config.json` loading and flag overrides.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use autoclick::config::{DEFAULT_FALLBACK_PORT, DEFAULT_PORT};
use autoclick::matcher::DEFAULT_PANEL_MARKERS;
use autoclick::target::{DEFAULT_EXCLUDED_URLS, DEFAULT_TARGET_KINDS};
use autoclick::{ManagerConfig, MatcherConfig, TargetFilter};
use serde::{Deserialize, Serialize};

use crate::cli::Overrides;
use crate::error::{CliError, Result};

/// On-disk settings. Absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
	pub port: u16,
	pub fallback_port: u16,
	pub custom_phrases: Vec<String>,
	pub panel_markers: Vec<String>,
	pub target_types: Vec<String>,
	/// Glob patterns; matching target URLs are never attached.
	pub exclude_urls: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub request_timeout_ms: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub heartbeat_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reconnect_secs: Option<u64>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			port: DEFAULT_PORT,
			fallback_port: DEFAULT_FALLBACK_PORT,
			custom_phrases: Vec::new(),
			panel_markers: to_strings(DEFAULT_PANEL_MARKERS),
			target_types: to_strings(DEFAULT_TARGET_KINDS),
			exclude_urls: to_strings(DEFAULT_EXCLUDED_URLS),
			request_timeout_ms: None,
			heartbeat_secs: None,
			reconnect_secs: None,
		}
	}
}

fn to_strings(values: &[&str]) -> Vec<String> {
	values.iter().map(|v| v.to_string()).collect()
}

impl Config {
	/// `<config dir>/autoclick/config.json`, if the platform has a config dir.
	pub fn default_path() -> Option<PathBuf> {
		dirs::config_dir().map(|dir| dir.join("autoclick").join("config.json"))
	}

	/// Loads `explicit`, or the default path when `None`.
	///
	/// A missing default file yields defaults; a missing explicit file is an error.
	pub fn load(explicit: Option<&Path>) -> Result<Self> {
		match explicit {
			Some(path) => Self::read(path)?.ok_or_else(|| CliError::ConfigRead {
				path: path.to_path_buf(),
				source: ErrorKind::NotFound.into(),
			}),
			None => match Self::default_path() {
				Some(path) => Ok(Self::read(&path)?.unwrap_or_default()),
				None => Ok(Self::default()),
			},
		}
	}

	fn read(path: &Path) -> Result<Option<Self>> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(source) => {
				return Err(CliError::ConfigRead {
					path: path.to_path_buf(),
					source,
				});
			}
		};
		serde_json::from_str(&content)
			.map(Some)
			.map_err(|source| CliError::ConfigParse {
				path: path.to_path_buf(),
				source,
			})
	}

	/// Applies command-line overrides on top of file values.
	pub fn apply(&mut self, overrides: &Overrides) {
		if let Some(port) = overrides.port {
			self.port = port;
		}
		if let Some(port) = overrides.fallback_port {
			self.fallback_port = port;
		}
		self.custom_phrases.extend(overrides.phrases.iter().cloned());
		if overrides.no_markers {
			self.panel_markers.clear();
		} else if !overrides.markers.is_empty() {
			self.panel_markers = overrides.markers.clone();
		}
	}

	/// Validates markers and URL patterns and builds the manager settings.
	pub fn to_manager_config(&self) -> Result<ManagerConfig> {
		let matcher = MatcherConfig::from_strings(self.custom_phrases.iter().cloned(), &self.panel_markers)
			.map_err(|source| CliError::ConfigValue {
				field: "panelMarkers",
				source,
			})?;
		let targets = TargetFilter::from_patterns(self.target_types.iter().cloned(), &self.exclude_urls).map_err(
			|source| CliError::ConfigValue {
				field: "excludeUrls",
				source,
			},
		)?;

		let mut config = ManagerConfig::default()
			.with_port(self.port)
			.with_fallback_port(self.fallback_port)
			.with_matcher(matcher)
			.with_targets(targets);
		if let Some(ms) = self.request_timeout_ms {
			config = config.with_request_timeout(Duration::from_millis(ms));
		}
		if let Some(secs) = self.heartbeat_secs {
			config = config.with_heartbeat_interval(Duration::from_secs(secs));
		}
		if let Some(secs) = self.reconnect_secs {
			config = config.with_reconnect_delay(Duration::from_secs(secs));
		}
		config.validate().map_err(|source| CliError::ConfigValue {
			field: file_key(&source),
			source,
		})?;
		Ok(config)
	}
}

/// Config file key for a validation failure.
fn file_key(error: &autoclick::Error) -> &'static str {
	match error {
		autoclick::Error::InvalidConfig { field, .. } => match *field {
			"request_timeout" => "requestTimeoutMs",
			"heartbeat_interval" => "heartbeatSecs",
			"reconnect_delay" => "reconnectSecs",
			other => other,
		},
		_ => "config",
	}
}
