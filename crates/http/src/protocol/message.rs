use bytes::Bytes;
use http::header::{CONTENT_LENGTH, Entry};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Shared header and body access for [`Request`](super::Request) and [`Response`](super::Response).
///
/// Header names are case-insensitive. When a header appears more than once, the first
/// value wins: [`add_header`](HttpMessage::add_header) ignores names already present.
pub trait HttpMessage {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    fn body(&self) -> &Bytes;

    /// Returns the first value of header `name`.
    fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers().get(name)
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers().contains_key(name)
    }

    /// Adds a header unless one with the same name is already present.
    ///
    /// Returns `true` if the header was added.
    fn add_header(&mut self, name: HeaderName, value: HeaderValue) -> bool {
        match self.headers_mut().entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Parsed `Content-Length` header, `None` if missing or malformed.
    fn content_length(&self) -> Option<u64> {
        self.headers().get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
    }

    /// Sets `Content-Length` to the body length if the header is absent and the body non-empty.
    fn calculate_content_length(&mut self) {
        let length = self.body().len();
        if length > 0 {
            self.add_header(CONTENT_LENGTH, HeaderValue::from(length));
        }
    }
}
