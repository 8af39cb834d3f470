//! Request handlers and the route table.
//!
//! A [`Handler`] turns a decoded [`Request`] into a [`Response`]. Plain functions and
//! closures become handlers through [`make_handler`]. Handlers run on the reactor thread,
//! one at a time, so a slow handler delays every other connection.

use std::error::Error;

use crate::protocol::{Request, Response};

mod route;

pub use route::RouteMatch;
pub use route::RouteTable;

/// Error returned by a handler; the server answers it with 500.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[cfg_attr(test, mockall::automock)]
pub trait Handler: Send + Sync {
    fn call(&self, request: &Request) -> Result<Response, HandlerError>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync,
{
    fn call(&self, request: &Request) -> Result<Response, HandlerError> {
        (self.f)(request)
    }
}

pub fn make_handler<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request) -> Result<Response, HandlerError> + Send + Sync,
{
    HandlerFn { f }
}
