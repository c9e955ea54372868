// src/gps/nmea.rs
//! NMEA sentence classification and parsing

use super::fix::{FixQuality, PositionFix};
use super::token::field;

/// Default shift applied to receiver UTC time (KST)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

/// GSV field offsets carrying the SNR of up to four satellites
const GSV_SNR_FIELDS: [usize; 4] = [7, 11, 15, 19];

/// Sentence types the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceKind {
    /// Recommended minimum data: time and position
    Rmc,
    /// Fix data: quality and satellites in use
    Gga,
    /// Satellites in view: per-satellite signal strength
    Gsv,
}

impl SentenceKind {
    /// Classify by the `$TTSSS` prefix. Unknown talkers or types yield `None`.
    pub fn classify(sentence: &str) -> Option<Self> {
        let header = sentence.get(..6)?;
        if !header.starts_with('$') || !header.is_ascii() {
            return None;
        }

        let talker = &header[1..3];
        match (talker, &header[3..6]) {
            ("GP" | "GN", "RMC") => Some(SentenceKind::Rmc),
            ("GP" | "GN", "GGA") => Some(SentenceKind::Gga),
            ("GP" | "GN" | "GL" | "GA" | "GB", "GSV") => Some(SentenceKind::Gsv),
            _ => None,
        }
    }
}

/// Applies sentences to a [`PositionFix`]
#[derive(Debug, Clone, Copy)]
pub struct NmeaParser {
    utc_offset_hours: i32,
    verify_checksum: bool,
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_HOURS, false)
    }
}

impl NmeaParser {
    pub fn new(utc_offset_hours: i32, verify_checksum: bool) -> Self {
        Self {
            utc_offset_hours,
            verify_checksum,
        }
    }

    /// Parse one sentence into `fix`.
    ///
    /// Bytes before the first `$` (line noise after a receiver reset) are
    /// skipped. Returns the kind of sentence applied, or `None` when it was
    /// ignored (no `$`, unknown type, or a checksum mismatch with
    /// verification enabled).
    pub fn apply(&self, fix: &mut PositionFix, line: &str) -> Option<SentenceKind> {
        let sentence = &line[line.find('$')?..];
        let kind = SentenceKind::classify(sentence)?;

        if self.verify_checksum && checksum_matches(sentence) == Some(false) {
            log::debug!("Checksum mismatch, ignoring: {}", sentence);
            return None;
        }

        match kind {
            SentenceKind::Rmc => self.parse_rmc(fix, sentence),
            SentenceKind::Gga => parse_gga(fix, sentence),
            SentenceKind::Gsv => parse_gsv(fix, sentence),
        }
        fix.touch();
        Some(kind)
    }

    /// Parse RMC (Recommended Minimum) sentence
    fn parse_rmc(&self, fix: &mut PositionFix, sentence: &str) {
        // Time (field 1)
        let time = field(sentence, 1);
        if !time.is_empty() {
            let (hour, minute, second) = split_hhmmss(parse_float(time));
            fix.hour = shift_hour(hour, self.utc_offset_hours);
            fix.minute = minute;
            fix.second = second;
        }

        // Latitude (field 3, hemisphere in 4)
        let lat = field(sentence, 3);
        if !lat.is_empty() {
            let latitude = degrees_minutes_to_decimal(parse_float(lat));
            fix.latitude = apply_hemisphere(latitude, field(sentence, 4));
        }

        // Longitude (field 5, hemisphere in 6)
        let lon = field(sentence, 5);
        if !lon.is_empty() {
            let longitude = degrees_minutes_to_decimal(parse_float(lon));
            fix.longitude = apply_hemisphere(longitude, field(sentence, 6));
        }
    }
}

/// Parse a sentence with the default parser settings
pub fn parse_nmea_sentence(fix: &mut PositionFix, sentence: &str) -> Option<SentenceKind> {
    NmeaParser::default().apply(fix, sentence)
}

/// Parse GGA (Fix Data) sentence
fn parse_gga(fix: &mut PositionFix, sentence: &str) {
    // Fix quality (field 6) and satellite count (field 7); empty reads as 0
    fix.fix_quality = FixQuality::from_raw(parse_int(field(sentence, 6)));
    fix.satellite_count = u8::try_from(parse_int(field(sentence, 7))).unwrap_or(0);
}

/// Parse GSV (Satellites in View) sentence
fn parse_gsv(fix: &mut PositionFix, sentence: &str) {
    for index in GSV_SNR_FIELDS {
        let snr = parse_int(field(sentence, index));
        fix.record_snr(u8::try_from(snr).unwrap_or(0));
    }
}

/// Convert NMEA `dddmm.mmmm` to decimal degrees
pub fn degrees_minutes_to_decimal(value: f64) -> f64 {
    let degrees = (value / 100.0).trunc();
    let minutes = value - degrees * 100.0;
    degrees + minutes / 60.0
}

/// Split a `hhmmss.sss` time into whole hours, minutes and seconds
///
/// The hour is left unwrapped; it can exceed 23 on garbage input.
pub fn split_hhmmss(value: f64) -> (u32, u8, u8) {
    let whole = value.max(0.0) as u32;
    let hour = whole / 10000;
    let minute = (whole / 100) % 100;
    let second = whole % 100;
    (hour, minute as u8, second as u8)
}

/// Shift an hour by a UTC offset, wrapping modulo 24
pub fn shift_hour(hour: u32, offset_hours: i32) -> u8 {
    (i64::from(hour) + i64::from(offset_hours)).rem_euclid(24) as u8
}

fn apply_hemisphere(value: f64, indicator: &str) -> f64 {
    match indicator {
        "S" | "W" => -value,
        _ => value,
    }
}

/// Verify the `*HH` checksum. `None` when the sentence carries no checksum.
pub fn checksum_matches(sentence: &str) -> Option<bool> {
    let body = sentence.strip_prefix('$')?;
    let (payload, checksum) = body.split_once('*')?;
    let expected = u8::from_str_radix(checksum.get(..2)?, 16).ok()?;
    let actual = payload.bytes().fold(0u8, |acc, b| acc ^ b);
    Some(actual == expected)
}

/// Leading-integer conversion: `"08"` -> 8, `"12abc"` -> 12, `"abc"` -> 0
pub fn parse_int(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = split_sign(text);
    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    if negative {
        -value
    } else {
        value
    }
}

/// Leading-decimal conversion: `"4807.038,N"` -> 4807.038, `"x"` -> 0.0
pub fn parse_float(text: &str) -> f64 {
    let text = text.trim_start();
    let (negative, rest) = split_sign(text);

    let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    let mut end = int_len;
    if rest.as_bytes().get(int_len) == Some(&b'.') {
        end += 1 + rest[int_len + 1..].bytes().take_while(u8::is_ascii_digit).count();
    }

    let value = match &rest[..end] {
        "" | "." => 0.0,
        number => number.parse::<f64>().unwrap_or(0.0),
    };
    if negative {
        -value
    } else {
        value
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else {
        (false, text.strip_prefix('+').unwrap_or(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_parser() -> NmeaParser {
        NmeaParser::new(0, false)
    }

    #[test]
    fn test_rmc_parsing() {
        let mut fix = PositionFix::new();
        let rmc = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

        let kind = parse_nmea_sentence(&mut fix, rmc);

        assert_eq!(kind, Some(SentenceKind::Rmc));
        assert_eq!((fix.hour, fix.minute, fix.second), (21, 35, 19));
        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        assert!((fix.longitude - 11.516_666).abs() < 1e-4);
        assert_eq!(fix.sentences, 1);
        assert!(fix.last_update.is_some());
    }

    #[test]
    fn test_rmc_southern_western_hemisphere() {
        let mut fix = PositionFix::new();
        let rmc = "$GNRMC,001500.00,A,3351.600,S,15112.600,W,0.0,,010124,,,A";

        utc_parser().apply(&mut fix, rmc);

        assert!((fix.latitude + 33.86).abs() < 1e-6);
        assert!((fix.longitude + 151.21).abs() < 1e-6);
        assert_eq!((fix.hour, fix.minute, fix.second), (0, 15, 0));
    }

    #[test]
    fn test_rmc_empty_fields_keep_last_position() {
        let mut fix = PositionFix::new();
        let parser = utc_parser();
        parser.apply(&mut fix, "$GPRMC,123519,A,4807.038,N,01131.000,E,,,230394,,");
        parser.apply(&mut fix, "$GPRMC,,V,,,,,,,,,,N*53");

        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        assert!((fix.longitude - 11.516_666).abs() < 1e-4);
        assert_eq!((fix.hour, fix.minute, fix.second), (12, 35, 19));
    }

    #[test]
    fn test_gga_parsing() {
        let mut fix = PositionFix::new();
        let gga = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

        let kind = parse_nmea_sentence(&mut fix, gga);

        assert_eq!(kind, Some(SentenceKind::Gga));
        assert_eq!(fix.fix_quality, FixQuality::GpsFix);
        assert_eq!(fix.satellite_count, 8);
        // GGA does not carry position into the record
        assert_eq!(fix.latitude, 0.0);
    }

    #[test]
    fn test_gga_without_fix_reads_zero() {
        let mut fix = PositionFix::new();
        fix.satellite_count = 9;
        fix.fix_quality = FixQuality::DgpsFix;

        parse_nmea_sentence(&mut fix, "$GPGGA,,,,,,,,,,,,,,*66");

        assert_eq!(fix.fix_quality, FixQuality::NoFix);
        assert_eq!(fix.satellite_count, 0);
    }

    #[test]
    fn test_gsv_running_max_across_sentences() {
        let mut fix = PositionFix::new();
        parse_nmea_sentence(
            &mut fix,
            "$GPGSV,2,1,08,01,40,083,20,02,17,308,35,12,07,344,12,14,22,228,41*70",
        );
        assert_eq!(fix.max_snr, 41);
        parse_nmea_sentence(
            &mut fix,
            "$GPGSV,2,2,08,15,40,083,05,17,17,308,08,19,07,344,44,22,22,228,09*7A",
        );
        assert_eq!(fix.max_snr, 44);

        // Lower values in a later cycle do not lower the maximum
        parse_nmea_sentence(
            &mut fix,
            "$GPGSV,1,1,02,01,40,083,10,02,17,308,,,,,,,,,*4C",
        );
        assert_eq!(fix.max_snr, 44);

        fix.reset_max_snr();
        parse_nmea_sentence(
            &mut fix,
            "$GLGSV,1,1,02,65,40,083,31,66,17,308,,,,,,,,,*4C",
        );
        assert_eq!(fix.max_snr, 31);
    }

    #[test]
    fn test_unknown_sentences_are_ignored() {
        let mut fix = PositionFix::new();
        for line in ["$INVALID,123,456", "$GPVTG,054.7,T,034.4,M", "GPRMC,123519", "$GP", ""] {
            assert_eq!(parse_nmea_sentence(&mut fix, line), None);
        }
        assert_eq!(fix, PositionFix::new());
    }

    #[test]
    fn test_classify() {
        assert_eq!(SentenceKind::classify("$GNGGA,1"), Some(SentenceKind::Gga));
        assert_eq!(SentenceKind::classify("$GBGSV,1"), Some(SentenceKind::Gsv));
        assert_eq!(SentenceKind::classify("$GLRMC,1"), None);
        assert_eq!(SentenceKind::classify("$GPRM"), None);
    }

    #[test]
    fn test_degrees_minutes_conversion() {
        assert!((degrees_minutes_to_decimal(4807.038) - 48.1173).abs() < 1e-4);
        assert!((degrees_minutes_to_decimal(12700.0) - 127.0).abs() < 1e-9);
        assert!((degrees_minutes_to_decimal(30.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_time_split_and_shift() {
        assert_eq!(split_hhmmss(123519.0), (12, 35, 19));
        assert_eq!(split_hhmmss(235959.999), (23, 59, 59));
        assert_eq!(shift_hour(12, 9), 21);
        assert_eq!(shift_hour(20, 9), 5);
        assert_eq!(shift_hour(2, -5), 21);
        assert_eq!(shift_hour(12, 0), 12);

        // Out-of-range hours wrap once, after the shift
        assert_eq!(split_hhmmss(3_000_000.0), (300, 0, 0));
        assert_eq!(shift_hour(300, 9), 21);

        let mut fix = PositionFix::new();
        parse_nmea_sentence(&mut fix, "$GPRMC,3001520,A,,,,");
        assert_eq!((fix.hour, fix.minute, fix.second), (21, 15, 20));
    }

    #[test]
    fn test_leading_noise_before_dollar_is_skipped() {
        let mut fix = PositionFix::new();
        let line = "\0\u{ff}$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

        assert_eq!(parse_nmea_sentence(&mut fix, line), Some(SentenceKind::Gga));
        assert_eq!(fix.satellite_count, 8);

        let strict = NmeaParser::new(0, true);
        let mut fix = PositionFix::new();
        assert_eq!(strict.apply(&mut fix, line), Some(SentenceKind::Gga));
        assert_eq!(strict.apply(&mut fix, "garbage without a start marker"), None);
    }

    #[test]
    fn test_lenient_numbers() {
        assert_eq!(parse_int("08"), 8);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-3"), -3);
        assert_eq!(parse_float("4807.038"), 4807.038);
        assert_eq!(parse_float("123519.00"), 123519.0);
        assert_eq!(parse_float("12."), 12.0);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("N"), 0.0);
    }

    #[test]
    fn test_checksum_verification() {
        let good = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
        let bad = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*00";
        assert_eq!(checksum_matches(good), Some(true));
        assert_eq!(checksum_matches(bad), Some(false));
        assert_eq!(checksum_matches("$GPGGA,1,08"), None);

        let strict = NmeaParser::new(0, true);
        let mut fix = PositionFix::new();
        assert_eq!(strict.apply(&mut fix, bad), None);
        assert_eq!(fix.satellite_count, 0);
        assert_eq!(strict.apply(&mut fix, good), Some(SentenceKind::Gga));
        assert_eq!(fix.satellite_count, 8);

        // Without verification the mismatch is still applied
        assert_eq!(utc_parser().apply(&mut fix, bad), Some(SentenceKind::Gga));
    }
}
