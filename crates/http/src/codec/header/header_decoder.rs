//! Resumable decoder for the header block of a request or response
//!
//! The block is a sequence of `Name: value` lines terminated by an empty line. Each line
//! is read in two steps (the name up to `:`, then the value up to CRLF), and either step
//! may stop in the middle of its field when the input runs out. The partial field is kept
//! in an accumulator and the next call resumes from the same step.
//!
//! # Limits
//!
//! - Maximum length of a header name or value: [`DecoderLimits::max_field_len`]
//! - Maximum number of header lines: [`DecoderLimits::max_headers`]

use std::mem;

use bytes::BytesMut;
use http::header::Entry;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::codec::{Decoder, DecoderLimits, read_field};
use crate::ensure;
use crate::protocol::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderState {
    Name,
    Value,
}

/// Decoder for a header block implementing [`Decoder`].
///
/// Produces the headers once the terminating blank line has been read. Repeated header
/// names keep their first value.
#[derive(Debug)]
pub struct HeaderDecoder {
    state: HeaderState,
    name: BytesMut,
    value: BytesMut,
    headers: HeaderMap,
    count: usize,
    limits: DecoderLimits,
}

impl HeaderDecoder {
    pub fn new(limits: DecoderLimits) -> Self {
        Self {
            state: HeaderState::Name,
            name: BytesMut::new(),
            value: BytesMut::new(),
            headers: HeaderMap::new(),
            count: 0,
            limits,
        }
    }

    /// Drops any partially decoded block.
    pub fn reset(&mut self) {
        self.state = HeaderState::Name;
        self.name.clear();
        self.value.clear();
        self.headers.clear();
        self.count = 0;
    }

    fn finish_line(&mut self) -> Result<(), ParseError> {
        let name = HeaderName::from_bytes(&self.name).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_bytes(self.value.trim_ascii_start()).map_err(ParseError::invalid_header)?;

        trace!(header_name = %name, "decoded header line");
        self.count += 1;
        if let Entry::Vacant(entry) = self.headers.entry(name) {
            entry.insert(value);
        }

        self.name.clear();
        self.value.clear();
        self.state = HeaderState::Name;
        Ok(())
    }
}

impl Default for HeaderDecoder {
    fn default() -> Self {
        Self::new(DecoderLimits::default())
    }
}

impl Decoder for HeaderDecoder {
    type Item = HeaderMap;
    type Error = ParseError;

    /// Attempts to decode the rest of a header block from `src`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(headers))` once the blank line ending the block has been consumed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if a field is too long, there are too many headers, or a name
    ///   or value contains invalid bytes
    fn decode(&mut self, src: &mut ByteBuffer) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                HeaderState::Name => {
                    // a blank line can only start where a header name would start
                    if self.name.is_empty() {
                        if src.peek(2) == b"\r\n" {
                            src.consume(2);
                            self.count = 0;
                            return Ok(Some(mem::take(&mut self.headers)));
                        }
                        if matches!(src.peek(2), b"" | b"\r") {
                            return Ok(None);
                        }
                    }

                    let found = read_field(src, b":", &mut self.name, self.limits.max_field_len, "header name")?;
                    ensure!(!self.name.contains(&b'\n'), ParseError::invalid_header("header line without a colon"));
                    if !found {
                        return Ok(None);
                    }

                    ensure!(self.count < self.limits.max_headers, ParseError::too_many_headers(self.limits.max_headers));
                    self.state = HeaderState::Value;
                }

                HeaderState::Value => {
                    if !read_field(src, b"\r\n", &mut self.value, self.limits.max_field_len, "header value")? {
                        return Ok(None);
                    }
                    self.finish_line()?;
                }
            }
        }
    }
}
