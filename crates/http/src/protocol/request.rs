//! HTTP request message.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};

use crate::protocol::query::split_resource;
use crate::protocol::{HttpMessage, ParseError, QueryArgs};

/// A complete HTTP request: method, resource path, query arguments, headers and body.
///
/// The resource never contains the query string; arguments live in [`QueryArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    resource: String,
    args: QueryArgs,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a request for a target such as `/users?id=3`, parsing the query part.
    pub fn new(method: Method, target: &str) -> Result<Self, ParseError> {
        let (resource, query) = split_resource(target);
        let args = match query {
            Some(query) => QueryArgs::parse(query)?,
            None => QueryArgs::new(),
        };
        Ok(Self::from_parts(method, resource, args, HeaderMap::new(), Bytes::new()))
    }

    pub fn from_parts(method: Method, resource: impl Into<String>, args: QueryArgs, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, resource: resource.into(), args, headers, body }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a header, keeping an existing value with the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.add_header(name, value);
        self
    }

    /// Adds a query argument, keeping an existing value with the same key.
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(key, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn args(&self) -> &QueryArgs {
        &self.args
    }

    pub fn args_mut(&mut self) -> &mut QueryArgs {
        &mut self.args
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key)
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}

impl HttpMessage for Request {
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

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};

    #[test]
    fn new_splits_query() {
        let request = Request::new(Method::GET, "/a?x=1&y=%2F").unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.resource(), "/a");
        assert_eq!(request.arg("x"), Some("1"));
        assert_eq!(request.arg("y"), Some("/"));
        assert!(request.body().is_empty());
    }

    #[test]
    fn new_rejects_bad_escape() {
        assert!(Request::new(Method::GET, "/a?x=%G1").is_err());
    }

    #[test]
    fn headers_first_wins() {
        let request = Request::new(Method::POST, "/e")
            .unwrap()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_header(HeaderName::from_static("content-type"), HeaderValue::from_static("application/json"));

        assert_eq!(request.header("Content-Type").unwrap(), "text/plain");
        assert!(request.has_header("CONTENT-TYPE"));
    }

    #[test]
    fn content_length_calculation() {
        let mut request = Request::new(Method::POST, "/e").unwrap().with_body("hello");
        assert_eq!(request.content_length(), None);

        request.calculate_content_length();
        assert_eq!(request.content_length(), Some(5));

        let mut empty = Request::new(Method::GET, "/e").unwrap();
        empty.calculate_content_length();
        assert!(!empty.has_header(CONTENT_LENGTH.as_str()));
    }
}
