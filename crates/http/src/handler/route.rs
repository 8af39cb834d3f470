use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::handler::Handler;

/// Outcome of looking up a request in the [`RouteTable`].
pub enum RouteMatch<'a> {
    Found(&'a dyn Handler),
    /// The path is known but no handler accepts the method.
    MethodNotAllowed,
    NotFound,
}

/// Exact path to method to handler mapping.
///
/// Paths match exactly, without templates or wildcards. Method tokens are matched
/// case-insensitively. Registering the same path and method again replaces the earlier
/// handler.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<String, HashMap<String, Arc<dyn Handler>>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers `handler` for `path` and every method in `methods`.
    pub fn add_route<H>(&mut self, path: impl Into<String>, methods: &[&str], handler: H)
    where
        H: Handler + 'static,
    {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        let endpoint = self.routes.entry(path.into()).or_default();
        for method in methods {
            endpoint.insert(method.to_ascii_uppercase(), Arc::clone(&handler));
        }
    }

    pub fn lookup(&self, path: &str, method: &Method) -> RouteMatch<'_> {
        let Some(endpoint) = self.routes.get(path) else {
            return RouteMatch::NotFound;
        };

        match endpoint.get(&method.as_str().to_ascii_uppercase()) {
            Some(handler) => RouteMatch::Found(handler.as_ref()),
            None => RouteMatch::MethodNotAllowed,
        }
    }

    pub fn has_route(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    pub fn has_route_for_method(&self, path: &str, method: &Method) -> bool {
        matches!(self.lookup(path, method), RouteMatch::Found(_))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (path, endpoint) in &self.routes {
            map.entry(path, &endpoint.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => f.write_str("Found"),
            Self::MethodNotAllowed => f.write_str("MethodNotAllowed"),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerError, make_handler};
    use crate::protocol::{Request, Response};
    use http::StatusCode;

    fn respond_with(status: StatusCode) -> impl Handler {
        make_handler(move |_: &Request| -> Result<Response, HandlerError> { Ok(Response::new(status)) })
    }

    fn status_of(table: &RouteTable, path: &str, method: &Method) -> Option<StatusCode> {
        match table.lookup(path, method) {
            RouteMatch::Found(handler) => Some(handler.call(&Request::new(method.clone(), path).unwrap()).unwrap().status()),
            _ => None,
        }
    }

    #[test]
    fn lookup() {
        let mut table = RouteTable::new();
        table.add_route("/items", &["get", "POST"], respond_with(StatusCode::OK));

        assert!(matches!(table.lookup("/items", &Method::GET), RouteMatch::Found(_)));
        assert!(matches!(table.lookup("/items", &Method::POST), RouteMatch::Found(_)));
        assert!(matches!(table.lookup("/items", &Method::DELETE), RouteMatch::MethodNotAllowed));
        assert!(matches!(table.lookup("/items/", &Method::GET), RouteMatch::NotFound));
        assert!(matches!(table.lookup("/other", &Method::GET), RouteMatch::NotFound));
    }

    #[test]
    fn method_case_insensitive() {
        let mut table = RouteTable::new();
        table.add_route("/a", &["Get"], respond_with(StatusCode::OK));

        let lowercase = Method::from_bytes(b"get").unwrap();
        assert!(table.has_route_for_method("/a", &lowercase));
        assert!(table.has_route_for_method("/a", &Method::GET));
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let mut table = RouteTable::new();
        table.add_route("/a", &["GET", "PUT"], respond_with(StatusCode::OK));
        table.add_route("/a", &["GET"], respond_with(StatusCode::ACCEPTED));

        assert_eq!(table.len(), 1);
        assert!(table.has_route("/a"));
        assert_eq!(status_of(&table, "/a", &Method::GET), Some(StatusCode::ACCEPTED));
        assert_eq!(status_of(&table, "/a", &Method::PUT), Some(StatusCode::OK));
    }
}
