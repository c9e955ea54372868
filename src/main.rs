// src/main.rs
//! GPS Status - serial NMEA monitor with a periodic status report

use anyhow::Context;
use clap::Parser;
use gps_status::{
    config::GpsStatusConfig,
    display::{ReportFormat, StatusReporter},
    monitor::{self, GpsMonitor, GpsSource},
    NmeaParser,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gps-status", version, about = "Report GPS receiver status from NMEA sentences")]
struct Cli {
    /// Serial port of the GPS receiver (e.g. /dev/ttyUSB0)
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Replay a recorded NMEA log instead of a serial port ("-" for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "port")]
    replay: Option<PathBuf>,

    /// Hours added to receiver UTC time
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Seconds between status reports
    #[arg(long)]
    interval: Option<u64>,

    /// Ignore sentences whose checksum does not match
    #[arg(long)]
    verify_checksum: bool,

    /// Print one JSON object per report
    #[arg(long)]
    json: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Persist the effective settings to the config file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply_to(&self, config: &mut GpsStatusConfig) {
        if let Some(port) = &self.port {
            config.serial_port = Some(port.clone());
        }
        if let Some(baud) = self.baud {
            config.baudrate = baud;
        }
        if let Some(offset) = self.utc_offset {
            config.utc_offset_hours = offset;
        }
        if let Some(interval) = self.interval {
            config.report_interval_secs = interval;
        }
        if self.verify_checksum {
            config.verify_checksum = true;
        }
    }

    fn source(&self, config: &GpsStatusConfig) -> anyhow::Result<GpsSource> {
        if let Some(path) = &self.replay {
            let path = (path.as_os_str() != "-").then(|| path.clone());
            return Ok(GpsSource::Replay { path });
        }

        let port = config
            .serial_port
            .clone()
            .context("No serial port given; use --port, --replay, or set serial_port in the config file")?;
        Ok(GpsSource::Serial {
            port,
            baudrate: config.baudrate,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.list_ports {
        monitor::list_serial_ports()?;
        return Ok(());
    }

    let mut config = GpsStatusConfig::load().unwrap_or_else(|e| {
        log::warn!("{}; using defaults", e);
        GpsStatusConfig::default()
    });
    cli.apply_to(&mut config);
    config.validate()?;

    if cli.save_config {
        config.save().context("Failed to save config")?;
    }

    let source = cli.source(&config)?;
    log::info!("Starting GPS status monitor ({})", source.describe());

    let gps = GpsMonitor::new(NmeaParser::new(config.utc_offset_hours, config.verify_checksum));
    let reader = gps.start(source).await?;

    let format = if cli.json { ReportFormat::Json } else { ReportFormat::Text };
    let reporter = StatusReporter::new(config.report_interval(), format);
    reporter.run(gps.shared_fix(), gps.running_flag()).await?;

    gps.stop();
    reader.abort();
    Ok(())
}
