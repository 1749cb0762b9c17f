//! HTTP request/response primitive.
//!
//! Everything above this layer sees a request as data and a response as a
//! status plus a body string. A [`TransportError`] means no response arrived
//! at all, which is distinct from any HTTP status.

use async_trait::async_trait;
use parkwatch_core::{Document, DocumentError};
use serde_json::Value;
use tracing::debug;

use crate::error::TransportError;
use crate::ApiConfig;

/// HTTP methods used by the parking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl HttpMethod {
    /// The method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Headers in insertion order.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Create a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A `GET` request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// A `POST` request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, url).json(body)
    }

    /// A `PUT` request with a JSON body.
    #[must_use]
    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Put, url).json(body)
    }

    /// Set the JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set a header, replacing any existing value with the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Look up a header value, case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response with any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body text.
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 401.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Parse the body as a document.
    ///
    /// # Errors
    ///
    /// Returns a `DocumentError` if the body is empty or not JSON.
    pub fn document(&self) -> Result<Document, DocumentError> {
        Document::parse(&self.body)
    }
}

/// Executes HTTP requests.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send a request and return whatever status the server answered with.
    ///
    /// # Errors
    ///
    /// Returns a `TransportError` if no response was received.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the request and connect timeouts from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created (should never happen with default TLS).
    #[must_use]
    pub fn new(config: &ApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .expect("failed to create HTTP client");

        Self { client }
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
            HttpMethod::Put => self.client.put(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                TransportError::Request {
                    url: request.url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Body {
            url: request.url.clone(),
            message: e.to_string(),
        })?;

        debug!(method = %request.method, url = %request.url, status, "HTTP exchange");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTransport;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;

    use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
    use crate::error::TransportError;

    type Reply = Result<HttpResponse, TransportError>;

    #[derive(Debug)]
    struct Route {
        method: HttpMethod,
        path: String,
        reply: Reply,
    }

    impl Route {
        fn matches(&self, request: &HttpRequest) -> bool {
            self.method == request.method && request.url.contains(&self.path)
        }
    }

    /// Scripted transport for tests.
    ///
    /// One-shot replies registered with [`expect`](Self::expect) are consumed
    /// in order; replies registered with [`stub`](Self::stub) answer every
    /// matching request that no one-shot reply claims. Every request is
    /// recorded.
    #[derive(Debug, Default)]
    pub struct MockTransport {
        once: Mutex<VecDeque<Route>>,
        always: Mutex<Vec<Route>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockTransport {
        /// Create a transport with no scripted replies.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer the next matching request once with `status` and a JSON body.
        pub fn expect(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
            self.expect_reply(method, path, Ok(HttpResponse::new(status, body.to_string())));
        }

        /// Answer the next matching request once with a raw reply.
        pub fn expect_reply(&self, method: HttpMethod, path: &str, reply: Reply) {
            self.once.lock().push_back(Route {
                method,
                path: path.to_string(),
                reply,
            });
        }

        /// Answer every matching request with `status` and a JSON body.
        pub fn stub(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
            self.always.lock().push(Route {
                method,
                path: path.to_string(),
                reply: Ok(HttpResponse::new(status, body.to_string())),
            });
        }

        /// All requests sent so far.
        #[must_use]
        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }

        /// Requests sent to URLs containing `path`.
        #[must_use]
        pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.url.contains(path))
                .cloned()
                .collect()
        }

        /// Number of requests sent so far.
        #[must_use]
        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl HttpTransport for MockTransport {
        async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.lock().push(request.clone());

            {
                let mut once = self.once.lock();
                if let Some(pos) = once.iter().position(|r| r.matches(request)) {
                    if let Some(route) = once.remove(pos) {
                        return route.reply;
                    }
                }
            }

            self.always
                .lock()
                .iter()
                .find(|r| r.matches(request))
                .map_or_else(
                    || {
                        Err(TransportError::Request {
                            url: request.url.clone(),
                            message: "no scripted reply".to_string(),
                        })
                    },
                    |r| r.reply.clone(),
                )
        }
    }
}
