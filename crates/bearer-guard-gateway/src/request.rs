//! Adapter from axum requests to the token layer.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Query;
use axum::http::Request;

use bearer_guard_auth::TokenRequest;

/// An HTTP request viewed as a [`TokenRequest`].
///
/// Headers come from the request itself; input fields come from the query
/// string. The body is never read, so the request can be forwarded unchanged.
#[derive(Debug)]
pub struct HttpRequest {
    inner: Request<Body>,
    query: HashMap<String, String>,
}

impl HttpRequest {
    /// Wrap a request, parsing its query string.
    #[must_use]
    pub fn new(inner: Request<Body>) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(inner.uri())
            .map(|Query(query)| query)
            .unwrap_or_default();
        Self { inner, query }
    }

    /// The wrapped request.
    #[must_use]
    pub const fn inner(&self) -> &Request<Body> {
        &self.inner
    }

    /// Unwrap the request for forwarding.
    #[must_use]
    pub fn into_inner(self) -> Request<Body> {
        self.inner
    }
}

impl TokenRequest for HttpRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    fn input(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}
