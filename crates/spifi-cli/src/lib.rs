//! spifi CLI
//!
//! Logs the number of unique 802.11 devices in an area over time.
//!
//! Decoded frames are read as JSON lines from a file or stdin (see
//! [`spifi_core::JsonLinesSource`]); every first probe request from a device
//! in an interval is written to the detail log, and the interval's device count
//! to the report log.
//!
//! # Usage
//!
//! ```bash
//! # Replay a capture, 5 minute reports, with vendor/SSID/RSSI columns
//! dissector --json wlan0mon | spifi -I 300 -f -s -r --oui-file /usr/share/ieee-data/oui.txt
//!
//! # Process a recorded file once and exit
//! spifi --input frames.jsonl --exit-on-eof -l
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use spifi_core::TimeFormat;

pub mod app;
pub mod config;
pub mod sinks;

pub use app::run;
pub use config::SpifiConfig;

/// spifi command line interface
#[derive(Parser, Debug)]
#[command(name = "spifi")]
#[command(author, version, about = "A tool for logging the number of unique 802.11 devices in an area over time")]
pub struct Cli {
    /// Config file (default: first of spifi.toml, /etc/spifi/spifi.toml)
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Decoded frame stream, one JSON frame per line ("-" for stdin)
    #[arg(short = 'i', long, value_name = "PATH", default_value = "-")]
    pub input: String,

    /// Output time format (epoch/unix, iso)
    #[arg(short = 't', long)]
    pub time: Option<TimeFormat>,

    /// Logging output location
    #[arg(short = 'o', long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Report output location
    #[arg(short = 'O', long, value_name = "PATH")]
    pub report_output: Option<PathBuf>,

    /// Output field delimiter
    #[arg(short = 'd', long)]
    pub delimiter: Option<String>,

    /// Include MAC address manufacturer
    #[arg(short = 'f', long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", value_parser = switch)]
    pub mac_info: Option<bool>,

    /// Include probe SSID in output
    #[arg(short = 's', long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", value_parser = switch)]
    pub ssid: Option<bool>,

    /// Include RSSI in output
    #[arg(short = 'r', long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", value_parser = switch)]
    pub rssi: Option<bool>,

    /// Enable scrolling live view of the logfile
    #[arg(short = 'l', long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", value_parser = switch)]
    pub log: Option<bool>,

    /// Time in seconds between reports
    #[arg(short = 'I', long, value_name = "SECS")]
    pub report_interval: Option<u64>,

    /// IEEE OUI registry file for manufacturer lookup
    #[arg(long, value_name = "PATH")]
    pub oui_file: Option<PathBuf>,

    /// Emit a final partial report and exit when the input ends
    #[arg(long)]
    pub exit_on_eof: bool,
}

fn switch(value: &str) -> Result<bool, String> {
    config::parse_switch(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Resolve the effective configuration: flags over env over file over
    /// defaults.
    pub fn resolve_config(&self) -> Result<SpifiConfig> {
        let mut config = SpifiConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overlay the flags that were given on the command line.
    pub fn apply(&self, config: &mut SpifiConfig) {
        if let Some(time) = self.time {
            config.time = time;
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(report_output) = &self.report_output {
            config.report_output = report_output.clone();
        }
        if let Some(delimiter) = &self.delimiter {
            config.delimiter = delimiter.clone();
        }
        if let Some(mac_info) = self.mac_info {
            config.mac_info = mac_info;
        }
        if let Some(ssid) = self.ssid {
            config.ssid = ssid;
        }
        if let Some(rssi) = self.rssi {
            config.rssi = rssi;
        }
        if let Some(log) = self.log {
            config.log = log;
        }
        if let Some(interval) = self.report_interval {
            config.report_interval = interval;
        }
        if let Some(oui_file) = &self.oui_file {
            config.oui_file = Some(oui_file.clone());
        }
    }
}
