//! Request routing.
//!
//! Routes are exact paths. A path may be registered for several methods,
//! each with its own endpoint; the router keeps them together so a request
//! with the wrong method can be answered with the list of methods that
//! would have worked.
//!
//! # Example
//!
//! ```rust
//! use storefront_server::{Endpoint, RouteMatch, Router};
//! use http::Method;
//!
//! let mut router = Router::new();
//! router.add_route(Method::GET, "/api", Endpoint::Api);
//!
//! assert_eq!(
//!     router.match_route(&Method::GET, "/api"),
//!     RouteMatch::Found(Endpoint::Api)
//! );
//! assert!(matches!(
//!     router.match_route(&Method::POST, "/api"),
//!     RouteMatch::MethodNotAllowed(_)
//! ));
//! assert_eq!(router.match_route(&Method::GET, "/missing"), RouteMatch::NotFound);
//! ```

use http::Method;

/// The built-in endpoints the server dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/`: the static index page.
    Index,
    /// `/api`: scrape one listing.
    Api,
    /// `/health`: liveness probe.
    Health,
}

/// Outcome of matching a request against the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch<'r> {
    /// The path and method are both registered.
    Found(Endpoint),
    /// The path exists but not for this method.
    MethodNotAllowed(&'r [Method]),
    /// No route for this path.
    NotFound,
}

#[derive(Debug, Clone)]
struct Route {
    path: String,
    // Parallel vectors: `endpoints[i]` answers `methods[i]`.
    methods: Vec<Method>,
    endpoints: Vec<Endpoint>,
}

/// Exact-path router.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The routing table the server uses: `/`, `/api` and `/health`, each
    /// answering GET and HEAD.
    #[must_use]
    pub fn standard() -> Self {
        let mut router = Self::new();
        for (path, endpoint) in [
            ("/", Endpoint::Index),
            ("/api", Endpoint::Api),
            ("/health", Endpoint::Health),
        ] {
            router.add_route(Method::GET, path, endpoint);
            router.add_route(Method::HEAD, path, endpoint);
        }
        router
    }

    /// Registers `endpoint` for `method` on `path`.
    ///
    /// Registering a path again with another method adds that method.
    /// Registering the same method and path again replaces its endpoint.
    pub fn add_route(&mut self, method: Method, path: impl Into<String>, endpoint: Endpoint) {
        let path = path.into();

        let Some(route) = self.routes.iter_mut().find(|r| r.path == path) else {
            self.routes.push(Route {
                path,
                methods: vec![method],
                endpoints: vec![endpoint],
            });
            return;
        };

        match route.methods.iter().position(|m| *m == method) {
            Some(index) => route.endpoints[index] = endpoint,
            None => {
                route.methods.push(method);
                route.endpoints.push(endpoint);
            }
        }
    }

    /// Matches a request method and path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let Some(route) = self.routes.iter().find(|r| r.path == path) else {
            return RouteMatch::NotFound;
        };

        match route.methods.iter().position(|m| m == method) {
            Some(index) => RouteMatch::Found(route.endpoints[index]),
            None => RouteMatch::MethodNotAllowed(&route.methods),
        }
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Formats methods as an `Allow` header value.
#[must_use]
pub fn allow_header(methods: &[Method]) -> String {
    methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_routes() {
        let router = Router::standard();
        assert_eq!(router.len(), 3);
        assert_eq!(
            router.match_route(&Method::GET, "/"),
            RouteMatch::Found(Endpoint::Index)
        );
        assert_eq!(
            router.match_route(&Method::HEAD, "/api"),
            RouteMatch::Found(Endpoint::Api)
        );
        assert_eq!(
            router.match_route(&Method::GET, "/health"),
            RouteMatch::Found(Endpoint::Health)
        );
    }

    #[test]
    fn test_exact_paths_only() {
        let router = Router::standard();
        assert_eq!(router.match_route(&Method::GET, "/api/"), RouteMatch::NotFound);
        assert_eq!(router.match_route(&Method::GET, "/API"), RouteMatch::NotFound);
        assert_eq!(router.match_route(&Method::GET, "/index.html"), RouteMatch::NotFound);
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let router = Router::standard();
        match router.match_route(&Method::POST, "/api") {
            RouteMatch::MethodNotAllowed(methods) => {
                assert_eq!(allow_header(methods), "GET, HEAD");
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_add_route_merges_methods() {
        let mut router = Router::new();
        assert!(router.is_empty());

        router.add_route(Method::GET, "/api", Endpoint::Api);
        router.add_route(Method::GET, "/api", Endpoint::Api);
        router.add_route(Method::HEAD, "/api", Endpoint::Api);

        assert_eq!(router.len(), 1);
        match router.match_route(&Method::POST, "/api") {
            RouteMatch::MethodNotAllowed(methods) => assert_eq!(allow_header(methods), "GET, HEAD"),
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_each_method_keeps_its_endpoint() {
        let mut router = Router::new();
        router.add_route(Method::GET, "/api", Endpoint::Api);
        router.add_route(Method::DELETE, "/api", Endpoint::Health);

        assert_eq!(
            router.match_route(&Method::GET, "/api"),
            RouteMatch::Found(Endpoint::Api)
        );
        assert_eq!(
            router.match_route(&Method::DELETE, "/api"),
            RouteMatch::Found(Endpoint::Health)
        );

        router.add_route(Method::GET, "/api", Endpoint::Index);
        assert_eq!(
            router.match_route(&Method::GET, "/api"),
            RouteMatch::Found(Endpoint::Index)
        );
        assert_eq!(router.len(), 1);
    }
}
