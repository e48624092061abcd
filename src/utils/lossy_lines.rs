//! Line reading that tolerates bytes which are not UTF-8

use log::warn;
use std::io::{self, BufRead};

/// Iterator over the lines of a reader, decoding each line lossily.
///
/// Invalid bytes become U+FFFD and a warning is logged; only reader failures end up as errors.
/// Trailing `\n` and `\r\n` are stripped.
pub struct LossyLines<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new() }
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&self.buf);
                if let std::borrow::Cow::Owned(_) = line {
                    warn!("Line contained invalid UTF-8, decoded lossily");
                }
                Some(Ok(line.into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
