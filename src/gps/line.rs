// src/gps/line.rs
//! Splits a raw serial byte stream into NMEA lines

/// Longest line kept, in bytes. Anything past it is dropped until the
/// next line terminator.
pub const MAX_LINE_LEN: usize = 255;

/// Accumulates bytes until `\r` or `\n`
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(MAX_LINE_LEN),
        }
    }

    /// Feed one byte. Returns a completed, non-empty line on a terminator.
    pub fn push(&mut self, byte: u8) -> Option<String> {
        match byte {
            b'\r' | b'\n' => {
                if self.buf.is_empty() {
                    return None;
                }
                let line = String::from_utf8_lossy(&self.buf).into_owned();
                self.buf.clear();
                Some(line)
            }
            _ => {
                if self.buf.len() < MAX_LINE_LEN {
                    self.buf.push(byte);
                }
                None
            }
        }
    }

    /// Feed a chunk, collecting every line it completes
    pub fn extend(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Bytes held for the line in progress
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
