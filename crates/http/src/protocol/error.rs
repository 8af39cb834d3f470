use std::io;

use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("{field} exceeds the limit of {limit} bytes")]
    FieldTooLong { field: &'static str, limit: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http version: {0:?}")]
    InvalidVersion(String),

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid status code: {0:?}")]
    InvalidStatusCode(String),

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("body size {size} exceed the limit {max_size}")]
    TooLargeBody { size: u64, max_size: u64 },

    #[error("invalid percent encoding: {reason}")]
    InvalidPercentEncoding { reason: String },
}

impl ParseError {
    pub fn field_too_long(field: &'static str, limit: usize) -> Self {
        Self::FieldTooLong { field, limit }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_version(bytes: &[u8]) -> Self {
        Self::InvalidVersion(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn invalid_status_code(bytes: &[u8]) -> Self {
        Self::InvalidStatusCode(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn too_large_body(size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { size, max_size }
    }

    pub fn invalid_percent_encoding<S: ToString>(str: S) -> Self {
        Self::InvalidPercentEncoding { reason: str.to_string() }
    }

    /// Status code of the response sent back when a request fails with this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::TooLargeBody { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}
