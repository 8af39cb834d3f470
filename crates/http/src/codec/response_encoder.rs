use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::header::{FastWrite, HeaderEncoder};
use crate::protocol::{HttpMessage, Response, SendError};

/// Initial buffer size reserved for the status line and headers
const INIT_HEAD_SIZE: usize = 4 * 1024;

/// Serializes a [`Response`] as `HTTP/1.1 CODE REASON`, headers, blank line, body.
///
/// Headers are written as they are; the server adds `Content-Length` and the other
/// mandatory headers before encoding.
#[derive(Debug, Default)]
pub struct ResponseEncoder {
    header_encoder: HeaderEncoder,
}

impl ResponseEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Encoder<&Response> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: &Response, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE + response.body().len());
        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", response.status().as_str(), response.reason())?;
        self.header_encoder.encode(response.headers(), dst)?;
        dst.put_slice(response.body());
        Ok(())
    }
}
