//! Message types shared by the server and the client.
//!
//! - **Messages**: [`Request`] and [`Response`] are independent types. Header and body
//!   helpers are shared through the [`HttpMessage`] trait.
//! - **Query arguments** ([`QueryArgs`]): ordered, first occurrence wins, with
//!   [`percent_encode`] and [`percent_decode`] for the wire form.
//! - **Errors**: [`ParseError`] for malformed input and [`SendError`] for encoding failures.
//!
//! Headers are kept in an [`http::HeaderMap`], so lookups are case-insensitive.

mod message;
pub use message::HttpMessage;

mod request;
pub use request::Request;

mod response;
pub use response::Response;
pub use response::reason_phrase;

mod query;
pub use query::QueryArgs;
pub use query::percent_decode;
pub use query::percent_encode;
pub use query::split_resource;

mod error;
pub use error::ParseError;
pub use error::SendError;
