//! HTTP request decoder module
//!
//! A request is decoded in the order it arrives on the wire:
//!
//! ```text
//! Method(' ') -> Resource(' ') -> Version(CRLF) -> Headers(blank line) -> Body -> emit
//! ```
//!
//! Each step reads its field with [`ByteBuffer::read_until`]; when the delimiter is not there
//! yet the partial field is kept and the decoder returns `Ok(None)`. The next call resumes in
//! the same state, so splitting the input at any byte offset does not change the result.
//!
//! The decoder realigns the buffer after every incomplete call and resets itself after an
//! error, so it stays usable for the next request.

use std::mem;

use bytes::BytesMut;
use http::{HeaderMap, Method};
use tracing::trace;

use crate::buffer::ByteBuffer;
use crate::codec::body::LengthDecoder;
use crate::codec::header::HeaderDecoder;
use crate::codec::{Decoder, DecoderLimits, body_length, check_version, read_field};
use crate::protocol::{ParseError, QueryArgs, Request, split_resource};

#[derive(Debug)]
enum RequestState {
    Method,
    Resource,
    Version,
    Headers,
    Body(LengthDecoder),
}

/// A decoder for complete HTTP requests.
#[derive(Debug)]
pub struct RequestDecoder {
    state: RequestState,
    field: BytesMut,
    method: Method,
    resource: String,
    args: QueryArgs,
    headers: HeaderMap,
    header_decoder: HeaderDecoder,
    limits: DecoderLimits,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` with default limits
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            state: RequestState::Method,
            field: BytesMut::new(),
            method: Method::GET,
            resource: String::new(),
            args: QueryArgs::new(),
            headers: HeaderMap::new(),
            header_decoder: HeaderDecoder::new(limits),
            limits,
        }
    }

    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// Drops any partially decoded request and starts over at the method.
    pub fn reset(&mut self) {
        self.state = RequestState::Method;
        self.field.clear();
        self.resource.clear();
        self.args = QueryArgs::new();
        self.headers.clear();
        self.header_decoder.reset();
    }

    fn decode_request(&mut self, src: &mut ByteBuffer) -> Result<Option<Request>, ParseError> {
        let max_field_len = self.limits.max_field_len;
        loop {
            match &mut self.state {
                RequestState::Method => {
                    if !read_field(src, b" ", &mut self.field, max_field_len, "method")? {
                        return Ok(None);
                    }
                    self.method = Method::from_bytes(&self.field).map_err(|_| ParseError::InvalidMethod)?;
                    self.field.clear();
                    self.state = RequestState::Resource;
                }

                RequestState::Resource => {
                    if !read_field(src, b" ", &mut self.field, max_field_len, "resource")? {
                        return Ok(None);
                    }
                    let target = std::str::from_utf8(&self.field).map_err(|_| ParseError::InvalidUri)?;
                    let (resource, query) = split_resource(target);
                    self.args = match query {
                        Some(query) => QueryArgs::parse(query)?,
                        None => QueryArgs::new(),
                    };
                    self.resource = resource.to_owned();
                    self.field.clear();
                    self.state = RequestState::Version;
                }

                RequestState::Version => {
                    if !read_field(src, b"\r\n", &mut self.field, max_field_len, "version")? {
                        return Ok(None);
                    }
                    check_version(&self.field)?;
                    self.field.clear();
                    self.state = RequestState::Headers;
                }

                RequestState::Headers => {
                    let Some(headers) = self.header_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    let length = body_length(&headers, self.limits.max_body_len)?;
                    trace!(method = %self.method, resource = %self.resource, body_size = length, "parsed request head");
                    self.headers = headers;
                    self.state = RequestState::Body(LengthDecoder::new(length));
                }

                RequestState::Body(body_decoder) => {
                    let Some(body) = body_decoder.decode(src)? else {
                        return Ok(None);
                    };
                    self.state = RequestState::Method;
                    let request = Request::from_parts(
                        mem::replace(&mut self.method, Method::GET),
                        mem::take(&mut self.resource),
                        mem::take(&mut self.args),
                        mem::take(&mut self.headers),
                        body,
                    );
                    return Ok(Some(request));
                }
            }
        }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_limits(DecoderLimits::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    /// Attempts to decode an HTTP request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(request))`: a complete request, including its body
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: encountered a parsing error, the decoder has been reset
    fn decode(&mut self, src: &mut ByteBuffer) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode_request(src) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::HttpMessage;
    use http::header;
    use indoc::indoc;

    fn crlf(str: &str) -> String {
        str.replace('\n', "\r\n")
    }

    fn decode_all(input: &[u8]) -> Result<Option<Request>, ParseError> {
        RequestDecoder::new().decode(&mut ByteBuffer::from(input))
    }

    #[test]
    fn simple_get() {
        let request = decode_all(b"GET /a?x=1 HTTP/1.1\r\n\r\n").unwrap().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.resource(), "/a");
        assert_eq!(request.args().iter().collect::<Vec<_>>(), vec![("x", "1")]);
        assert!(request.headers().is_empty());
        assert!(request.body().is_empty());
    }

    #[test]
    fn post_with_body() {
        let request = decode_all(b"POST /e HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello").unwrap().unwrap();

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.resource(), "/e");
        assert_eq!(request.body(), "hello");
    }

    #[test]
    fn args_decoded() {
        let request = decode_all(b"GET /e?a=v%20v&b HTTP/1.1\r\n\r\n").unwrap().unwrap();

        assert_eq!(request.arg("a"), Some("v v"));
        assert_eq!(request.arg("b"), Some(""));
    }

    #[test]
    fn from_curl() {
        let str = crlf(indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##});

        let request = decode_all(str.as_bytes()).unwrap().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.resource(), "/index.html");
        assert!(request.args().is_empty());
        assert_eq!(request.headers().len(), 3);
        assert_eq!(request.header("host").unwrap(), "127.0.0.1:8080");
        assert_eq!(request.header("USER-AGENT").unwrap(), "curl/7.79.1");
        assert_eq!(request.header("Accept").unwrap(), "*/*");
    }

    #[test]
    fn parse_by_parts() {
        let parts: [&[u8]; 9] = [
            b"POST /p",
            b"ath?na",
            b"me=val",
            b"ue HTTP/1.1\r",
            b"\nContent-Ty",
            b"pe: text/plain\r\nContent-Le",
            b"ngth: 11\r\n\r",
            b"\nhello ",
            b"world",
        ];

        let mut decoder = RequestDecoder::new();
        let mut buffer = ByteBuffer::new(256);

        for part in parts {
            assert!(decoder.decode(&mut buffer).unwrap().is_none());
            buffer.write(part).unwrap();
        }

        let request = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.resource(), "/path");
        assert_eq!(request.arg("name"), Some("value"));
        assert_eq!(request.header("content-type").unwrap(), "text/plain");
        assert_eq!(request.content_length(), Some(11));
        assert_eq!(request.body(), "hello world");
    }

    #[test]
    fn split_invariance() {
        let input = crlf(indoc! {r##"
        PUT /items/7?tag=a%26b&tag=ignored&flag HTTP/1.0
        Host: local
        X-Empty:
        Content-Length: 12

        {"id":7,"x"}"##});
        let input = input.as_bytes();

        let expected = decode_all(input).unwrap().unwrap();
        assert_eq!(expected.arg("tag"), Some("a&b"));
        assert_eq!(expected.header("x-empty").unwrap(), "");
        assert_eq!(expected.body(), r#"{"id":7,"x"}"#);

        for offset in 0..=input.len() {
            let mut decoder = RequestDecoder::new();
            let mut buffer = ByteBuffer::new(input.len());

            buffer.write(&input[..offset]).unwrap();
            let first = decoder.decode(&mut buffer).unwrap();
            buffer.write(&input[offset..]).unwrap();
            let request = match first {
                Some(request) => request,
                None => decoder.decode(&mut buffer).unwrap().unwrap(),
            };

            assert_eq!(request, expected, "split at offset {offset}");
        }

        let mut decoder = RequestDecoder::new();
        let mut buffer = ByteBuffer::new(16);
        let mut decoded = None;
        for byte in input {
            buffer.write(&[*byte]).unwrap();
            if let Some(request) = decoder.decode(&mut buffer).unwrap() {
                decoded = Some(request);
            }
        }
        assert_eq!(decoded.unwrap(), expected);
    }

    #[test]
    fn method_is_validated() {
        assert!(matches!(decode_all(b"G(T / HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidMethod)));
    }

    #[test]
    fn version_is_validated() {
        assert!(matches!(decode_all(b"GET / HTTP/2.0\r\n\r\n"), Err(ParseError::InvalidVersion(_))));
        assert!(matches!(decode_all(b"GET / FOO\r\n\r\n"), Err(ParseError::InvalidVersion(_))));
    }

    #[test]
    fn malformed_percent_encoding() {
        assert!(matches!(decode_all(b"GET /e?a=%4 HTTP/1.1\r\n\r\n"), Err(ParseError::InvalidPercentEncoding { .. })));
    }

    #[test]
    fn invalid_content_length() {
        let result = decode_all(b"POST /e HTTP/1.1\r\nContent-Length: five\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidContentLength { .. })));
    }

    #[test]
    fn body_limit() {
        let limits = DecoderLimits { max_body_len: 4, ..Default::default() };
        let mut buffer = ByteBuffer::from("POST /e HTTP/1.1\r\ncontent-length: 5\r\n\r\nhello");

        let error = RequestDecoder::with_limits(limits).decode(&mut buffer).unwrap_err();
        assert!(matches!(error, ParseError::TooLargeBody { size: 5, max_size: 4 }));
        assert_eq!(error.status_code(), http::StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn unterminated_field_is_bounded() {
        let limits = DecoderLimits { max_field_len: 16, ..Default::default() };
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buffer = ByteBuffer::from("GET /aaaaaaaa");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        buffer.write(b"aaaaaaaaaaaa").unwrap();

        let error = decoder.decode(&mut buffer).unwrap_err();
        assert!(matches!(error, ParseError::FieldTooLong { field: "resource", limit: 16 }));
        assert_eq!(error.status_code(), http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn usable_after_error() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = ByteBuffer::from("GET / HTTP/9.9\r\n");
        assert!(decoder.decode(&mut buffer).is_err());

        let mut buffer = ByteBuffer::from("DELETE /x HTTP/1.1\r\nHost: a\r\n\r\n");
        let request = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.method(), &Method::DELETE);
        assert_eq!(request.header(header::HOST.as_str()).unwrap(), "a");
    }

    #[test]
    fn incomplete_decode_realigns() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = ByteBuffer::from("GET /index HTTP/1.1\r\nHo");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.read_cursor(), 0);
        assert_eq!(buffer.unread(), b"");
    }
}
