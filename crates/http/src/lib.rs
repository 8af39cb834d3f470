//! HTTP/1.1 over unix domain sockets
//!
//! This crate lets a process expose or consume HTTP-shaped request/response messages over a
//! unix domain stream socket instead of a network socket. It is built from three tightly
//! coupled pieces:
//!
//! - a resumable parser that rebuilds complete messages from bytes delivered in arbitrary
//!   fragments across non-blocking reads
//! - a byte buffer that feeds the parser and reclaims consumed space without losing
//!   partially read data
//! - a single-threaded reactor that accepts connections, drives each connection's
//!   read/parse/dispatch/write cycle and can be stopped from another thread
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use tracing::{Level, info};
//! use tracing_subscriber::FmtSubscriber;
//! use ulocal_http::client::Client;
//! use ulocal_http::handler::{HandlerError, make_handler};
//! use ulocal_http::protocol::{Request, Response};
//! use ulocal_http::server::Server;
//!
//! fn hello_world(request: &Request) -> Result<Response, HandlerError> {
//!     info!(resource = request.resource(), "receiving request");
//!     Ok(Response::new(StatusCode::OK).with_body("Hello World!\r\n"))
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber)?;
//!
//!     let handle = Server::builder()
//!         .path("/tmp/hello.sock")
//!         .route("/", &["GET"], make_handler(hello_world))
//!         .build()?
//!         .serve()?;
//!
//!     let response = Client::new("/tmp/hello.sock").get("/")?;
//!     info!(status = %response.status(), "got response");
//!
//!     handle.terminate()?;
//!     handle.wait_until_done()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`buffer`]: the cursor based [`ByteBuffer`](buffer::ByteBuffer)
//! - [`net`]: non-blocking sockets, the listener and the control channel
//! - [`codec`]: request/response decoders and encoders
//! - [`protocol`]: message types, query arguments and errors
//! - [`connection`]: a socket paired with its request decoder
//! - [`handler`]: handlers and the exact-match route table
//! - [`server`]: builder, reactor and the handle used to stop it
//! - [`client`]: one-shot synchronous requests
//!
//! # Limitations
//!
//! - One request per connection; every response carries `Connection: close`
//! - Bodies are delimited by `Content-Length` only, chunked transfer encoding is not supported
//! - Handlers run on the reactor thread, one at a time
//! - Unix only

pub mod buffer;
pub mod client;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod net;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
