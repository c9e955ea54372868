// src/gps/token.rs
//! Comma-delimited field extraction for NMEA sentences
//!
//! Receivers routinely leave fields empty when there is no fix
//! (`$GPRMC,123519,V,,,,,,,230394,,*hh`), so a field index always counts
//! delimiters literally: `,,` is one empty field, never skipped.

const DELIMITER: char = ',';
const CHECKSUM_MARKER: char = '*';

/// Return the field at `index` as a view into `sentence`.
///
/// Field 0 is the talker/sentence identifier (`$GPRMC`). The field ends at
/// the next `,`, at the checksum marker `*`, or at the end of the string.
/// An index beyond the last delimiter yields `""`.
pub fn field(sentence: &str, index: usize) -> &str {
    let mut rest = sentence;
    for _ in 0..index {
        match rest.find(DELIMITER) {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }

    let end = rest
        .find(|c: char| c == DELIMITER || c == CHECKSUM_MARKER)
        .unwrap_or(rest.len());
    &rest[..end]
}

/// Copy the field at `index` into a fixed-capacity, NUL-terminated buffer.
///
/// At most `dest.len() - 1` bytes are copied and a NUL is written after
/// them. Returns the number of field bytes copied. A zero-length `dest` is
/// left untouched.
pub fn copy_field(sentence: &str, index: usize, dest: &mut [u8]) -> usize {
    if dest.is_empty() {
        return 0;
    }

    let value = field(sentence, index).as_bytes();
    let len = value.len().min(dest.len() - 1);
    dest[..len].copy_from_slice(&value[..len]);
    dest[len] = 0;
    len
}

/// Number of delimiters in the sentence, i.e. the highest valid field index.
pub fn field_count(sentence: &str) -> usize {
    sentence.matches(DELIMITER).count()
}
