//! Wiring: sinks, vendor table, session, timer and the capture thread.

use std::io::{self, BufReader};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use spifi_core::{
    FrameSource, JsonLinesSource, OuiTable, ProbeMonitor, ReportingSession, RunExit, SpifiResult,
    VendorLookup,
};
use tracing::{error, info, warn};

use crate::config::SpifiConfig;
use crate::sinks::open_log;
use crate::Cli;

enum Event {
    Interrupted,
    CaptureEnded(SpifiResult<RunExit>),
}

/// Run the census until interrupted (or until the input ends with
/// `--exit-on-eof`).
pub fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    info!(
        time = %config.time,
        interval_secs = config.report_interval,
        detail = %config.output.display(),
        reports = %config.report_output.display(),
        "spifi starting"
    );

    let monitor = Arc::new(build_monitor(&config)?);
    let (tx, rx) = mpsc::channel();

    {
        let tx = tx.clone();
        ctrlc::set_handler(move || {
            let _ = tx.send(Event::Interrupted);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let mut source = open_source(&cli.input)?;
    monitor.start()?;

    {
        let monitor = Arc::clone(&monitor);
        thread::Builder::new()
            .name("spifi-capture".into())
            .spawn(move || {
                let result = monitor.run(source.as_mut());
                let _ = tx.send(Event::CaptureEnded(result));
            })
            .context("Failed to spawn capture thread")?;
    }

    loop {
        match rx.recv() {
            Ok(Event::Interrupted) | Err(_) => {
                info!("interrupt received, shutting down");
                monitor.shutdown(false)?;
                break;
            }
            Ok(Event::CaptureEnded(Ok(_))) if cli.exit_on_eof => {
                if let Some(report) = monitor.shutdown(true)? {
                    info!(devices = report.device_count, "input ended, final partial report written");
                }
                break;
            }
            Ok(Event::CaptureEnded(Ok(_))) => {
                info!("input ended; reports continue until interrupted");
            }
            Ok(Event::CaptureEnded(Err(e))) => {
                error!(error = %e, "capture stream failed");
                monitor.shutdown(false)?;
                return Err(e).context("Capture stream failed");
            }
        }
    }

    let metrics = monitor.session().metrics();
    info!(
        frames = metrics.frames_seen,
        recorded = metrics.sightings_recorded,
        duplicates = metrics.duplicates,
        dropped = metrics.sightings_dropped,
        reports = metrics.reports_emitted,
        "spifi stopped"
    );
    Ok(())
}

/// Build the session and monitor described by `config`.
pub fn build_monitor(config: &SpifiConfig) -> Result<ProbeMonitor> {
    let vendor = load_vendor_table(config)?;
    let detail = open_log(&config.output, config.log)
        .with_context(|| format!("Failed to open detail log {}", config.output.display()))?;
    let summary = open_log(&config.report_output, config.log).with_context(|| {
        format!("Failed to open report log {}", config.report_output.display())
    })?;

    let session_config = config.session_config();
    let session = ReportingSession::new(&session_config, vendor, detail, summary);
    let monitor = ProbeMonitor::new(Arc::new(session), session_config.report_interval)?;
    Ok(monitor)
}

fn load_vendor_table(config: &SpifiConfig) -> Result<Arc<dyn VendorLookup>> {
    match &config.oui_file {
        Some(path) => {
            let table = OuiTable::load(path)
                .with_context(|| format!("Failed to load OUI registry {}", path.display()))?;
            info!(entries = table.len(), "vendor registry loaded");
            Ok(Arc::new(table))
        }
        None => {
            if config.mac_info {
                warn!("no OUI registry configured, every manufacturer will read UNKNOWN");
            }
            Ok(Arc::new(OuiTable::default()))
        }
    }
}

fn open_source(input: &str) -> Result<Box<dyn FrameSource>> {
    if input == "-" {
        info!("reading decoded frames from stdin");
        return Ok(Box::new(JsonLinesSource::new(BufReader::new(io::stdin()))));
    }
    let source = JsonLinesSource::open(Path::new(input))
        .with_context(|| format!("Failed to open frame input {input}"))?;
    Ok(Box::new(source))
}

/// Convenience for embedding: drain `source` through a fresh monitor built
/// from `config`, then write one final report.
pub fn replay<S>(config: &SpifiConfig, source: &mut S) -> Result<usize>
where
    S: FrameSource + ?Sized,
{
    config.validate()?;
    let monitor = build_monitor(config)?;
    monitor.start()?;
    let exit = monitor.run(source)?;
    if exit == RunExit::Cancelled {
        warn!("replay cancelled before the input ended");
    }
    let report = monitor.shutdown(true)?;
    Ok(report.map_or(0, |r| r.device_count))
}
