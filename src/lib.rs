// src/lib.rs
//! GPS Status Library
//!
//! Parses the NMEA sentences of a serial GPS receiver into a small status
//! record (position, local time, satellites, fix quality, best signal) and
//! reports it on a fixed interval.

pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod monitor;

// Re-export main types for convenience
pub use error::{GpsError, Result};
pub use gps::{FixQuality, NmeaParser, PositionFix};
pub use monitor::{GpsMonitor, GpsSource};
