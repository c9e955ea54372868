// src/monitor.rs
//! Reader task coordination: owns the shared fix and feeds it from a source

use crate::{
    error::{GpsError, Result},
    gps::{line::LineBuffer, NmeaParser, PositionFix},
};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinHandle,
};
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, StopBits};

const READ_CHUNK: usize = 256;

/// Where NMEA sentences come from
#[derive(Debug, Clone)]
pub enum GpsSource {
    Serial { port: String, baudrate: u32 },
    /// Recorded NMEA log; stdin when `path` is `None`
    Replay { path: Option<PathBuf> },
}

impl GpsSource {
    pub fn describe(&self) -> String {
        match self {
            GpsSource::Serial { port, baudrate } => format!("serial {} @ {} baud", port, baudrate),
            GpsSource::Replay { path: Some(path) } => format!("replay {}", path.display()),
            GpsSource::Replay { path: None } => "replay stdin".to_string(),
        }
    }
}

/// Lock the fix for reading, recovering from a poisoned lock
pub fn read_fix(fix: &RwLock<PositionFix>) -> RwLockReadGuard<'_, PositionFix> {
    fix.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Lock the fix for writing, recovering from a poisoned lock
pub fn write_fix(fix: &RwLock<PositionFix>) -> RwLockWriteGuard<'_, PositionFix> {
    fix.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owns the shared [`PositionFix`] and the reader task that updates it
pub struct GpsMonitor {
    fix: Arc<RwLock<PositionFix>>,
    running: Arc<AtomicBool>,
    parser: NmeaParser,
}

impl GpsMonitor {
    pub fn new(parser: NmeaParser) -> Self {
        Self {
            fix: Arc::new(RwLock::new(PositionFix::new())),
            running: Arc::new(AtomicBool::new(true)),
            parser,
        }
    }

    pub fn shared_fix(&self) -> Arc<RwLock<PositionFix>> {
        Arc::clone(&self.fix)
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Open the source and spawn the reader task
    pub async fn start(&self, source: GpsSource) -> Result<JoinHandle<()>> {
        match source {
            GpsSource::Serial { port, baudrate } => self.connect_serial(&port, baudrate).await,
            GpsSource::Replay { path } => self.open_replay(path).await,
        }
    }

    /// Connect to a GPS receiver via serial port (8N1, no flow control)
    async fn connect_serial(&self, port: &str, baudrate: u32) -> Result<JoinHandle<()>> {
        log::info!("Connecting to GPS on {} at {} baud...", port, baudrate);

        let serial = tokio_serial::new(port, baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(20))
            .open_native_async()?;

        log::info!("Connected to {}", port);
        Ok(self.spawn_reader(serial, "serial port"))
    }

    async fn open_replay(&self, path: Option<PathBuf>) -> Result<JoinHandle<()>> {
        match path {
            Some(path) => {
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    GpsError::Connection(format!("Failed to open replay file {}: {}", path.display(), e))
                })?;
                log::info!("Replaying {}", path.display());
                Ok(self.spawn_reader(file, "replay file"))
            }
            None => {
                log::info!("Replaying NMEA from stdin");
                Ok(self.spawn_reader(tokio::io::stdin(), "stdin"))
            }
        }
    }

    fn spawn_reader<R>(&self, reader: R, label: &'static str) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let fix = Arc::clone(&self.fix);
        let running = Arc::clone(&self.running);
        let parser = self.parser;

        tokio::spawn(async move {
            match pump_sentences(reader, &fix, &parser, &running).await {
                Ok(count) => log::info!("End of {} after {} sentences", label, count),
                Err(e) => log::error!("Error reading from {}: {}", label, e),
            }
            running.store(false, Ordering::Relaxed);
        })
    }

    /// Stop the monitor
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Get a copy of the current fix without touching the SNR window
    pub fn snapshot(&self) -> PositionFix {
        read_fix(&self.fix).clone()
    }
}

impl Default for GpsMonitor {
    fn default() -> Self {
        Self::new(NmeaParser::default())
    }
}

/// Read `reader` to EOF (or until `running` clears), applying each complete
/// sentence to `fix`. Returns the number of recognised sentences.
pub async fn pump_sentences<R>(
    mut reader: R,
    fix: &RwLock<PositionFix>,
    parser: &NmeaParser,
    running: &AtomicBool,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut applied = 0u64;

    while running.load(Ordering::Relaxed) {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break, // EOF
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => return Err(e.into()),
        };

        for line in lines.extend(&chunk[..n]) {
            let mut guard = write_fix(fix);
            match parser.apply(&mut guard, &line) {
                Some(kind) => {
                    applied += 1;
                    log::trace!("{:?}: {}", kind, line);
                }
                None => log::debug!("Ignored sentence: {}", line),
            }
        }
    }

    Ok(applied)
}

/// List available serial ports
pub fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
