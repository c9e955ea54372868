// src/display/report.rs
//! Periodic status report of the current fix

use crate::{
    error::{GpsError, Result},
    gps::PositionFix,
    monitor::write_fix,
};
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    tty::IsTty,
};
use serde::Serialize;
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};
use tokio::time::sleep;

const RULE_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// One report: the fix as it was when the window closed
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub searching: bool,
    pub local_time: Option<String>,
    pub signal: &'static str,
    #[serde(flatten)]
    pub fix: PositionFix,
}

impl StatusReport {
    pub fn from_fix(fix: PositionFix) -> Self {
        Self {
            searching: !fix.has_satellites(),
            local_time: fix.local_time().map(|t| t.format("%H:%M:%S").to_string()),
            signal: fix.signal_rating().label(),
            fix,
        }
    }
}

/// Close the current reporting window.
///
/// With satellites in view the fix is copied and its SNR maximum reset;
/// otherwise the record is left untouched.
pub fn take_report(fix: &RwLock<PositionFix>) -> StatusReport {
    let mut guard = write_fix(fix);
    let snapshot = if guard.has_satellites() {
        guard.take_snapshot()
    } else {
        guard.clone()
    };
    StatusReport::from_fix(snapshot)
}

/// Render a report as plain text lines
pub fn render_text(report: &StatusReport) -> Vec<String> {
    if report.searching {
        return vec!["Searching for satellites... (give the antenna a view of the sky)".to_string()];
    }

    let fix = &report.fix;
    vec![
        format!(" Time:       {}", report.local_time.as_deref().unwrap_or("--:--:--")),
        format!(" Position:   lat {:.6} / lon {:.6}", fix.latitude, fix.longitude),
        format!(" Satellites: {}", fix.satellite_count),
        format!(" Fix:        {}", fix.fix_quality.description()),
        format!(" Best SNR:   {} dB ({})", fix.max_snr, report.signal),
    ]
}

/// Prints a [`StatusReport`] on a fixed interval
pub struct StatusReporter {
    interval: Duration,
    format: ReportFormat,
    color: bool,
}

impl StatusReporter {
    /// Text reports are coloured when stdout, where `run` writes, is a terminal
    pub fn new(interval: Duration, format: ReportFormat) -> Self {
        Self {
            interval,
            format,
            color: io::stdout().is_tty(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Report every interval. The report closing the window in which
    /// `running` clears is the last one.
    pub async fn run(&self, fix: Arc<RwLock<PositionFix>>, running: Arc<AtomicBool>) -> Result<()> {
        // Ctrl+C stops the monitor
        let running_clone = Arc::clone(&running);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                running_clone.store(false, Ordering::Relaxed);
            }
        });

        let mut stdout = io::stdout();
        while running.load(Ordering::Relaxed) {
            sleep(self.interval).await;
            self.emit(&mut stdout, take_report(&fix))?;
        }

        println!("Shutting down...");
        Ok(())
    }

    pub fn emit(&self, out: &mut impl Write, report: StatusReport) -> Result<()> {
        match self.format {
            ReportFormat::Json => {
                serde_json::to_writer(&mut *out, &report)?;
                writeln!(out)?;
            }
            ReportFormat::Text if report.searching => {
                log::warn!("{}", render_text(&report).join(" "));
            }
            ReportFormat::Text => self.write_text(out, &report)?,
        }
        out.flush()?;
        Ok(())
    }

    fn write_text(&self, out: &mut impl Write, report: &StatusReport) -> Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        if self.color {
            execute!(
                out,
                SetForegroundColor(Color::Green),
                Print(format!("{}\n GPS status\n{}\n", rule, rule)),
                ResetColor
            )
            .map_err(GpsError::Io)?;
        } else {
            writeln!(out, "{}\n GPS status\n{}", rule, rule)?;
        }

        let signal_color = match report.fix.max_snr {
            40.. => Color::Green,
            30..=39 => Color::Yellow,
            20..=29 => Color::DarkYellow,
            _ => Color::Red,
        };

        let lines = render_text(report);
        let last = lines.len().saturating_sub(1);
        for (i, line) in lines.into_iter().enumerate() {
            if self.color && i == last {
                execute!(out, SetForegroundColor(signal_color), Print(line), ResetColor, Print("\n"))
                    .map_err(GpsError::Io)?;
            } else {
                writeln!(out, "{}", line)?;
            }
        }
        writeln!(out, "{}", rule)?;
        Ok(())
    }
}
