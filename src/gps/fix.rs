// src/gps/fix.rs
//! The position/status record updated by the NMEA parser

use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;

/// Position solution quality reported in GGA field 6
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FixQuality {
    #[default]
    NoFix,
    GpsFix,
    DgpsFix,
    /// Any other code (RTK, estimated, ...) passed through verbatim
    Other(u8),
}

impl FixQuality {
    /// Map the raw GGA integer. Out-of-range values count as no fix.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => FixQuality::NoFix,
            1 => FixQuality::GpsFix,
            2 => FixQuality::DgpsFix,
            3..=255 => FixQuality::Other(raw as u8),
            _ => FixQuality::NoFix,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            FixQuality::NoFix => 0,
            FixQuality::GpsFix => 1,
            FixQuality::DgpsFix => 2,
            FixQuality::Other(code) => *code,
        }
    }

    pub fn description(&self) -> String {
        match self {
            FixQuality::NoFix => "No fix".to_string(),
            FixQuality::GpsFix => "GPS".to_string(),
            FixQuality::DgpsFix => "DGPS".to_string(),
            FixQuality::Other(code) => format!("Other ({})", code),
        }
    }
}

/// Coarse rating of the best signal-to-noise ratio seen in a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SignalRating {
    pub fn from_snr(snr: u8) -> Self {
        match snr {
            40.. => SignalRating::Excellent,
            30..=39 => SignalRating::Good,
            20..=29 => SignalRating::Fair,
            _ => SignalRating::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SignalRating::Excellent => "Excellent",
            SignalRating::Good => "Good",
            SignalRating::Fair => "Fair",
            SignalRating::Poor => "Poor",
        }
    }
}

/// Latest known receiver state.
///
/// Each sentence type updates its own fields, so a copy may mix values from
/// different update cycles. Position is retained when the receiver loses
/// its fix.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Local time, already shifted by the configured UTC offset
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub satellite_count: u8,
    /// Running maximum since the last [`PositionFix::take_snapshot`]
    pub max_snr: u8,
    pub fix_quality: FixQuality,
    pub last_update: Option<DateTime<Utc>>,
    pub sentences: u64,
}

impl PositionFix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the running SNR maximum if `snr` exceeds it
    pub fn record_snr(&mut self, snr: u8) {
        if snr > self.max_snr {
            self.max_snr = snr;
        }
    }

    pub fn reset_max_snr(&mut self) {
        self.max_snr = 0;
    }

    /// Copy the record and start a new SNR window.
    pub fn take_snapshot(&mut self) -> PositionFix {
        let snapshot = self.clone();
        self.reset_max_snr();
        snapshot
    }

    pub fn has_satellites(&self) -> bool {
        self.satellite_count > 0
    }

    pub fn local_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour.into(), self.minute.into(), self.second.into())
    }

    pub fn signal_rating(&self) -> SignalRating {
        SignalRating::from_snr(self.max_snr)
    }

    /// Mark the record as touched by a recognised sentence
    pub fn touch(&mut self) {
        self.last_update = Some(Utc::now());
        self.sentences += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_quality_mapping() {
        assert_eq!(FixQuality::from_raw(0), FixQuality::NoFix);
        assert_eq!(FixQuality::from_raw(1), FixQuality::GpsFix);
        assert_eq!(FixQuality::from_raw(2), FixQuality::DgpsFix);
        assert_eq!(FixQuality::from_raw(4), FixQuality::Other(4));
        assert_eq!(FixQuality::from_raw(-3), FixQuality::NoFix);
        assert_eq!(FixQuality::from_raw(4).code(), 4);
        assert_eq!(FixQuality::DgpsFix.description(), "DGPS");
    }

    #[test]
    fn test_signal_rating_thresholds() {
        assert_eq!(SignalRating::from_snr(45), SignalRating::Excellent);
        assert_eq!(SignalRating::from_snr(40), SignalRating::Excellent);
        assert_eq!(SignalRating::from_snr(39), SignalRating::Good);
        assert_eq!(SignalRating::from_snr(30), SignalRating::Good);
        assert_eq!(SignalRating::from_snr(20), SignalRating::Fair);
        assert_eq!(SignalRating::from_snr(19), SignalRating::Poor);
        assert_eq!(SignalRating::from_snr(0), SignalRating::Poor);
    }

    #[test]
    fn test_take_snapshot_resets_snr_window() {
        let mut fix = PositionFix::new();
        fix.satellite_count = 7;
        fix.record_snr(38);
        fix.record_snr(22);

        let snapshot = fix.take_snapshot();
        assert_eq!(snapshot.max_snr, 38);
        assert_eq!(snapshot.satellite_count, 7);
        assert_eq!(fix.max_snr, 0);
        assert_eq!(fix.satellite_count, 7);
    }

    #[test]
    fn test_local_time() {
        let mut fix = PositionFix::new();
        fix.hour = 21;
        fix.minute = 35;
        fix.second = 19;
        assert_eq!(fix.local_time(), NaiveTime::from_hms_opt(21, 35, 19));

        fix.second = 75;
        assert_eq!(fix.local_time(), None);
    }
}
