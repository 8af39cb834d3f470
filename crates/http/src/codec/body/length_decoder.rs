//! Body of a declared size, see
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use bytes::{Bytes, BytesMut};

use crate::buffer::{ByteBuffer, DEFAULT_CAPACITY};
use crate::codec::Decoder;
use crate::protocol::ParseError;

/// Collects exactly `Content-Length` bytes, across as many calls as it takes.
///
/// Every call moves what the buffer holds into the decoder, so a body larger than the
/// socket buffer never has to fit in it at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    remaining: usize,
    body: BytesMut,
}

impl LengthDecoder {
    pub fn new(length: usize) -> Self {
        // the declared length is untrusted until the bytes arrive
        Self { remaining: length, body: BytesMut::with_capacity(length.min(DEFAULT_CAPACITY)) }
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = ParseError;

    fn decode(&mut self, src: &mut ByteBuffer) -> Result<Option<Self::Item>, Self::Error> {
        let bytes = src.read(self.remaining);
        self.remaining -= bytes.len();
        self.body.extend_from_slice(bytes);

        if self.remaining > 0 {
            return Ok(None);
        }

        Ok(Some(self.body.split().freeze()))
    }
}
