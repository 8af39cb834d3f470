//! Header block encoder shared by the request and response encoders
//!
//! Writes every header as `Name: value` followed by CRLF, then the blank line that ends the
//! block. Content-Length is not touched here: messages compute it before they are encoded.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::HeaderMap;
use tokio_util::codec::Encoder;

use crate::protocol::SendError;

/// Encoder for a header block implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl Encoder<&HeaderMap> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, headers: &HeaderMap, dst: &mut BytesMut) -> Result<(), Self::Error> {
        for (header_name, header_value) in headers {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// Lets the start line be written with `write!` directly into the destination buffer.
pub struct FastWrite<'a>(pub &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
