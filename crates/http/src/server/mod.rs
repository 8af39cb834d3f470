//! The server: a route table served by a single-threaded reactor.
//!
//! [`Server::serve`] binds the socket, then moves the routes into a dedicated thread that
//! waits for readiness on the listener, the control channel and every live connection.
//! Each connection reads one request, gets one response and is closed.
//!
//! # Example
//!
//! ```no_run
//! use http::StatusCode;
//! use ulocal_http::handler::{HandlerError, make_handler};
//! use ulocal_http::protocol::{Request, Response};
//! use ulocal_http::server::Server;
//!
//! fn hello(request: &Request) -> Result<Response, HandlerError> {
//!     let name = request.arg("name").unwrap_or("world");
//!     Ok(Response::new(StatusCode::OK).with_body(format!("Hello, {name}!")))
//! }
//!
//! let handle = Server::builder()
//!     .path("/tmp/hello.sock")
//!     .route("/hello", &["GET"], make_handler(hello))
//!     .build()?
//!     .serve()?;
//!
//! handle.terminate()?;
//! handle.wait_until_done()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod dispatch;
mod error;
mod reactor;
#[allow(clippy::module_inception, reason = "the server type lives next to its builder and handle")]
mod server;

pub use dispatch::SERVER_NAME;
pub use dispatch::finalize_response;
pub use error::ServerBuildError;
pub use error::ServerError;
pub use server::DEFAULT_BACKLOG;
pub use server::DEFAULT_EVENTS_CAPACITY;
pub use server::Server;
pub use server::ServerBuilder;
pub use server::ServerConfig;
pub use server::ServerHandle;
