//! HTTP response decoder, used by the client
//!
//! ```text
//! Version(' ') -> Status(' ') -> Reason(CRLF) -> Headers(blank line) -> Body -> emit
//! ```

use bytes::BytesMut;
use http::{HeaderMap, StatusCode};
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::codec::body::LengthDecoder;
use crate::codec::header::HeaderDecoder;
use crate::codec::{Decoder, DecoderLimits, body_length, check_version, read_field};
use crate::protocol::{HttpMessage, ParseError, Response, reason_phrase};

#[derive(Debug)]
enum ResponseState {
    Version,
    Status,
    Reason,
    Headers,
    Body(LengthDecoder),
}

/// A decoder for complete HTTP responses.
///
/// A reason phrase that differs from the standard phrase of the status code is kept as the
/// response's explicit reason.
#[derive(Debug)]
pub struct ResponseDecoder {
    state: ResponseState,
    field: BytesMut,
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    header_decoder: HeaderDecoder,
    limits: DecoderLimits,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            state: ResponseState::Version,
            field: BytesMut::new(),
            status: StatusCode::OK,
            reason: None,
            headers: HeaderMap::new(),
            header_decoder: HeaderDecoder::new(limits),
            limits,
        }
    }

    pub fn reset(&mut self) {
        self.state = ResponseState::Version;
        self.field.clear();
        self.reason = None;
        self.headers.clear();
        self.header_decoder.reset();
    }

    fn decode_response(&mut self, src: &mut ByteBuffer) -> Result<Option<Response>, ParseError> {
        let max_field_len = self.limits.max_field_len;
        loop {
            match &mut self.state {
                ResponseState::Version => {
                    if !read_field(src, b" ", &mut self.field, max_field_len, "version")? {
                        return Ok(None);
                    }
                    check_version(&self.field)?;
                    self.field.clear();
                    self.state = ResponseState::Status;
                }

                ResponseState::Status => {
                    if !read_field(src, b" ", &mut self.field, max_field_len, "status code")? {
                        return Ok(None);
                    }
                    self.status = StatusCode::from_bytes(&self.field).map_err(|_| ParseError::invalid_status_code(&self.field))?;
                    self.field.clear();
                    self.state = ResponseState::Reason;
                }

                ResponseState::Reason => {
                    if !read_field(src, b"\r\n", &mut self.field, max_field_len, "reason")? {
                        return Ok(None);
                    }
                    let reason = String::from_utf8_lossy(&self.field);
                    let standard = reason_phrase(self.status.as_u16());
                    if !reason.is_empty() && standard != Some(&*reason) {
                        self.reason = Some(reason.into_owned());
                    }
                    self.field.clear();
                    self.state = ResponseState::Headers;
                }

                ResponseState::Headers => {
                    let Some(headers) = self.header_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    let length = body_length(&headers, self.limits.max_body_len)?;
                    trace!(status = %self.status, body_size = length, "parsed response head");
                    self.headers = headers;
                    self.state = ResponseState::Body(LengthDecoder::new(length));
                }

                ResponseState::Body(body_decoder) => {
                    let Some(body) = body_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    self.state = ResponseState::Version;

                    let mut response = Response::new(self.status).with_body(body);
                    if let Some(reason) = self.reason.take() {
                        response = response.with_reason(reason);
                    }
                    *response.headers_mut() = std::mem::take(&mut self.headers);
                    return Ok(Some(response));
                }
            }
        }
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self::with_limits(DecoderLimits::default())
    }
}

impl Decoder for ResponseDecoder {
    type Item = Response;
    type Error = ParseError;

    fn decode(&mut self, src: &mut ByteBuffer) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode_response(src) {
            Ok(None) => {
                src.realign();
                Ok(None)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
            result => result,
        }
    }
}
