//! HTTP response message and the status reason table.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::protocol::HttpMessage;

/// A complete HTTP response.
///
/// The reason phrase is optional: without an explicit one, [`Response::reason`] falls back to
/// [`reason_phrase`] and finally to `"Unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self { status, reason: None, headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets an explicit reason phrase. Control characters other than tab are dropped so the
    /// phrase cannot end the status line early.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let mut reason = reason.into();
        reason.retain(|c| c == '\t' || !c.is_control());
        self.reason = Some(reason);
        self
    }

    /// Adds a header, keeping an existing value with the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The reason phrase written on the status line.
    pub fn reason(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => reason_phrase(self.status.as_u16()).unwrap_or("Unknown"),
        }
    }

    /// The explicitly set reason phrase, if any.
    pub fn explicit_reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

impl From<StatusCode> for Response {
    fn from(status: StatusCode) -> Self {
        Self::new(status)
    }
}

impl HttpMessage for Response {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Reason phrases of the status codes this server knows about.
pub fn reason_phrase(code: u16) -> Option<&'static str> {
    let phrase = match code {
        100 => "Continue",
        101 => "Switching Protocols",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        300 => "Multiple Choices",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        305 => "Use Proxy",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Request Entity Too Large",
        414 => "Request-URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Requested Range Not Satisfiable",
        417 => "Expectation Failed",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        _ => return None,
    };
    Some(phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_fallbacks() {
        assert_eq!(Response::new(StatusCode::OK).reason(), "OK");
        assert_eq!(Response::new(StatusCode::PAYLOAD_TOO_LARGE).reason(), "Request Entity Too Large");
        assert_eq!(Response::new(StatusCode::IM_A_TEAPOT).reason(), "Unknown");
        assert_eq!(Response::new(StatusCode::IM_A_TEAPOT).with_reason("Teapot").reason(), "Teapot");
    }

    #[test]
    fn reason_drops_line_breaks() {
        let response = Response::new(StatusCode::OK).with_reason("Fine\r\nSet-Cookie: a=b\0");

        assert_eq!(response.reason(), "FineSet-Cookie: a=b");
        assert_eq!(Response::new(StatusCode::OK).with_reason("Very\tGood").reason(), "Very\tGood");
    }

    #[test]
    fn from_status() {
        let response = Response::from(StatusCode::NOT_FOUND);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.explicit_reason(), None);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
    }
}
