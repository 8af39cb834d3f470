//! Server side connection handling
//!
//! - [`Connection`]: a [`Socket`](crate::net::Socket) paired with its own
//!   [`RequestDecoder`](crate::codec::RequestDecoder)
//!   - Drains readable data and decodes it into a complete request
//!   - Writes the response, queuing what the kernel does not accept at once
//!   - Closes itself once the response is written (no keep-alive)

mod http_connection;

pub use http_connection::Connection;
pub use http_connection::ConnectionError;
