use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::codec::header::{FastWrite, HeaderEncoder};
use crate::protocol::{HttpMessage, Request, SendError};

/// Initial buffer size reserved for the request line and headers
const INIT_HEAD_SIZE: usize = 4 * 1024;

/// Serializes a [`Request`] as `METHOD RESOURCE[?QUERY] HTTP/1.1`, headers, blank line, body.
///
/// Query arguments are percent encoded again on the way out.
#[derive(Debug, Default)]
pub struct RequestEncoder {
    header_encoder: HeaderEncoder,
}

impl RequestEncoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Encoder<&Request> for RequestEncoder {
    type Error = SendError;

    fn encode(&mut self, request: &Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEAD_SIZE + request.body().len());
        write!(FastWrite(dst), "{} {}{} HTTP/1.1\r\n", request.method(), request.resource(), request.args())?;
        self.header_encoder.encode(request.headers(), dst)?;
        dst.put_slice(request.body());
        Ok(())
    }
}
