//! HTTP codec module for encoding and decoding HTTP messages
//!
//! Decoding is resumable: a decoder keeps an explicit state plus accumulators for the
//! field it is reading, so a message delivered in arbitrary fragments across many
//! non-blocking reads decodes exactly like the same bytes delivered at once.
//!
//! # Architecture
//!
//! - Request handling:
//!   - [`RequestDecoder`]: request line, then headers, then body
//!   - [`RequestEncoder`]: serializes a [`Request`](crate::protocol::Request)
//!
//! - Response handling:
//!   - [`ResponseDecoder`]: status line, then headers, then body
//!   - [`ResponseEncoder`]: serializes a [`Response`](crate::protocol::Response)
//!
//! Both decoders compose the same header block decoder and a length delimited body
//! decoder. Decoders read from a [`ByteBuffer`]; encoders implement
//! [`tokio_util::codec::Encoder`] and write into a `BytesMut`.
//!
//! # Example
//!
//! ```
//! use ulocal_http::buffer::ByteBuffer;
//! use ulocal_http::codec::{Decoder, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = ByteBuffer::from("GET /a?x=1 HTTP/1.1\r\n");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.write(b"\r\n").unwrap();
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.resource(), "/a");
//! assert_eq!(request.arg("x"), Some("1"));
//! ```

use bytes::BytesMut;
use http::HeaderMap;
use http::header::CONTENT_LENGTH;

use crate::buffer::ByteBuffer;
use crate::ensure;
use crate::protocol::ParseError;

mod body;
mod header;
mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
pub use response_encoder::ResponseEncoder;

/// Default maximum length of a single field: method, resource, version, header name or value.
pub const DEFAULT_MAX_FIELD_LEN: usize = 8 * 1024;

/// Default maximum number of header lines in a message.
pub const DEFAULT_MAX_HEADERS: usize = 64;

/// Default maximum declared body length.
pub const DEFAULT_MAX_BODY_LEN: u64 = 8 * 1024 * 1024;

/// Decoding of a frame from a [`ByteBuffer`].
///
/// `Ok(None)` means more input is needed. The decoder keeps what it has consumed so far,
/// so the next call continues where this one stopped.
pub trait Decoder {
    type Item;
    type Error;

    fn decode(&mut self, src: &mut ByteBuffer) -> Result<Option<Self::Item>, Self::Error>;
}

/// Bounds applied while decoding a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderLimits {
    pub max_field_len: usize,
    pub max_headers: usize,
    pub max_body_len: u64,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self { max_field_len: DEFAULT_MAX_FIELD_LEN, max_headers: DEFAULT_MAX_HEADERS, max_body_len: DEFAULT_MAX_BODY_LEN }
    }
}

/// Appends the bytes before `delimiter` to `field`. Returns whether the field is complete.
fn read_field(
    src: &mut ByteBuffer,
    delimiter: &[u8],
    field: &mut BytesMut,
    limit: usize,
    name: &'static str,
) -> Result<bool, ParseError> {
    let (bytes, found) = src.read_until(delimiter);
    ensure!(field.len() + bytes.len() <= limit, ParseError::field_too_long(name, limit));
    field.extend_from_slice(bytes);
    Ok(found)
}

/// Body length declared by `Content-Length`, zero when the header is missing.
fn body_length(headers: &HeaderMap, max_body_len: u64) -> Result<usize, ParseError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(0);
    };

    let str = value.to_str().map_err(ParseError::invalid_content_length)?;
    let length = str.trim().parse::<u64>().map_err(|e| ParseError::invalid_content_length(format!("value {str} is not u64: {e}")))?;
    ensure!(length <= max_body_len, ParseError::too_large_body(length, max_body_len));

    usize::try_from(length).map_err(ParseError::invalid_content_length)
}

/// Accepts only `HTTP/1.0` and `HTTP/1.1`.
fn check_version(version: &[u8]) -> Result<(), ParseError> {
    match version {
        b"HTTP/1.0" | b"HTTP/1.1" => Ok(()),
        other => Err(ParseError::invalid_version(other)),
    }
}
