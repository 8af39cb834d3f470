//! Turning a decoded request, or a failure to decode one, into the response to send.

use std::panic::{AssertUnwindSafe, catch_unwind};

use http::header::{CONNECTION, CONTENT_LENGTH, SERVER};
use http::{HeaderValue, StatusCode};
use tracing::{debug, warn};

use crate::buffer::BufferError;
use crate::connection::ConnectionError;
use crate::handler::{RouteMatch, RouteTable};
use crate::net::TransportError;
use crate::protocol::{HttpMessage, Request, Response};

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = concat!("ulocal-http/", env!("CARGO_PKG_VERSION"));

/// Routes `request` and runs its handler. Handler errors and panics become 500.
pub fn dispatch(routes: &RouteTable, request: &Request) -> Response {
    let handler = match routes.lookup(request.resource(), request.method()) {
        RouteMatch::Found(handler) => handler,
        RouteMatch::MethodNotAllowed => {
            debug!(method = %request.method(), resource = request.resource(), "method not allowed");
            return Response::new(StatusCode::METHOD_NOT_ALLOWED);
        }
        RouteMatch::NotFound => {
            debug!(resource = request.resource(), "no route");
            return Response::new(StatusCode::NOT_FOUND);
        }
    };

    match catch_unwind(AssertUnwindSafe(|| handler.call(request))) {
        Ok(Ok(response)) => {
            debug!(method = %request.method(), resource = request.resource(), status = %response.status(), "handled request");
            response
        }
        Ok(Err(e)) => {
            warn!(cause = %e, resource = request.resource(), "handler failed");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            warn!(resource = request.resource(), "handler panicked");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Response for a connection whose request could not be read.
pub fn error_response(error: &ConnectionError) -> Response {
    let status = match error {
        ConnectionError::Parse { source } => source.status_code(),
        ConnectionError::Transport { source: TransportError::Buffer(BufferError::CapacityExceeded { .. }) } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        ConnectionError::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(cause = %error, status = %status, "failed to read request");
    Response::new(status)
}

/// Adds the headers every response carries: `Content-Length` (only when absent and the body
/// is not empty), `Connection: close` and `Server`.
pub fn finalize_response(response: &mut Response) {
    if !response.has_header(CONTENT_LENGTH.as_str()) {
        response.calculate_content_length();
    }
    response.headers_mut().insert(CONNECTION, HeaderValue::from_static("close"));
    response.headers_mut().insert(SERVER, HeaderValue::from_static(SERVER_NAME));
}
