// src/gps/mod.rs
//! GPS data handling and parsing

pub mod fix;
pub mod line;
pub mod nmea;
pub mod token;

pub use fix::{FixQuality, PositionFix, SignalRating};
pub use nmea::{NmeaParser, SentenceKind};
