//! Configuration management for the spifi CLI.
//!
//! Precedence, highest first: command-line flags > `SPIFI_*` environment
//! variables > config file > built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use spifi_core::{FieldToggles, SessionConfig, TimeFormat};

/// Locations searched when no `--config` is given.
pub const DEFAULT_LOCATIONS: &[&str] = &["spifi.toml", "/etc/spifi/spifi.toml"];

/// Longest accepted report interval (one week).
pub const MAX_REPORT_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpifiConfig {
    /// Timestamp format: `epoch` (alias `unix`) or `iso`.
    pub time: TimeFormat,
    /// Detail log location.
    pub output: PathBuf,
    /// Summary report log location.
    pub report_output: PathBuf,
    /// Output field delimiter.
    pub delimiter: String,
    /// Include the MAC address manufacturer.
    pub mac_info: bool,
    /// Include the probed SSID.
    pub ssid: bool,
    /// Include the RSSI.
    pub rssi: bool,
    /// Mirror both logs to stdout as a scrolling live view.
    pub log: bool,
    /// Seconds between reports.
    pub report_interval: u64,
    /// IEEE OUI registry used for manufacturer lookup.
    pub oui_file: Option<PathBuf>,
}

/// On-disk layout: all keys live under a `[spifi]` table.
#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    spifi: SpifiConfig,
}

impl Default for SpifiConfig {
    fn default() -> Self {
        Self {
            time: TimeFormat::Epoch,
            output: PathBuf::from("spifi.log"),
            report_output: PathBuf::from("spifi_reports.log"),
            delimiter: ",".to_owned(),
            mac_info: false,
            ssid: false,
            rssi: false,
            log: false,
            report_interval: 60,
            oui_file: None,
        }
    }
}

impl SpifiConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Failed to parse config file")?;
        Ok(file.spifi)
    }

    /// Load configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load the file layer (explicit path or first default location found),
    /// then apply environment overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::try_default_locations().unwrap_or_default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Try loading from default locations.
    fn try_default_locations() -> Option<Self> {
        DEFAULT_LOCATIONS.iter().find_map(|path| {
            if !Path::new(path).exists() {
                return None;
            }
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::debug!(path, "loaded config file");
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!(path, error = %format!("{e:#}"), "ignoring unreadable config file");
                    None
                }
            }
        })
    }

    /// Apply `SPIFI_*` overrides read through `var`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("SPIFI_TIME") {
            self.time = v.parse().map_err(anyhow::Error::msg).context("Invalid SPIFI_TIME")?;
        }
        if let Some(v) = var("SPIFI_OUTPUT") {
            self.output = PathBuf::from(v);
        }
        if let Some(v) = var("SPIFI_REPORT_OUTPUT") {
            self.report_output = PathBuf::from(v);
        }
        if let Some(v) = var("SPIFI_DELIMITER") {
            self.delimiter = v;
        }
        if let Some(v) = var("SPIFI_MAC_INFO") {
            self.mac_info = parse_switch(&v).context("Invalid SPIFI_MAC_INFO")?;
        }
        if let Some(v) = var("SPIFI_SSID") {
            self.ssid = parse_switch(&v).context("Invalid SPIFI_SSID")?;
        }
        if let Some(v) = var("SPIFI_RSSI") {
            self.rssi = parse_switch(&v).context("Invalid SPIFI_RSSI")?;
        }
        if let Some(v) = var("SPIFI_LOG") {
            self.log = parse_switch(&v).context("Invalid SPIFI_LOG")?;
        }
        if let Some(v) = var("SPIFI_REPORT_INTERVAL") {
            self.report_interval = v.trim().parse().context("Invalid SPIFI_REPORT_INTERVAL")?;
        }
        if let Some(v) = var("SPIFI_OUI_FILE") {
            self.oui_file = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Reject settings the core cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.report_interval == 0 {
            bail!("report_interval must be at least 1 second");
        }
        if self.report_interval > MAX_REPORT_INTERVAL_SECS {
            bail!(
                "report_interval must be at most {MAX_REPORT_INTERVAL_SECS} seconds, got {}",
                self.report_interval
            );
        }
        if self.delimiter.is_empty() {
            bail!("delimiter must not be empty");
        }
        Ok(())
    }

    /// Optional detail columns.
    pub fn fields(&self) -> FieldToggles {
        FieldToggles {
            manufacturer: self.mac_info,
            ssid: self.ssid,
            rssi: self.rssi,
        }
    }

    /// Settings handed to the reporting session.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            time_format: self.time,
            delimiter: self.delimiter.clone(),
            fields: self.fields(),
            report_interval: Duration::from_secs(self.report_interval),
        }
    }

    /// Serialize to TOML (under `[spifi]`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&ConfigFile {
            spifi: self.clone(),
        })
        .context("Failed to serialize config")
    }
}

/// Parse a yes/no style switch value.
pub fn parse_switch(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean (true/false, yes/no, on/off, 1/0), got '{other}'"),
    }
}
