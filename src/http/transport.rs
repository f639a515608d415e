//! Single-exchange HTTP transport.
//!
//! A transport sends one request and hands back whatever the server answered.
//! Status interpretation lives in the response mapper and re-attempts live in
//! the retry policy.

use async_trait::async_trait;
use log::debug;
use reqwest::{
    Client, Method, StatusCode, Url,
    cookie::{CookieStore, Jar},
    header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::config::ConnectorConfig;
use crate::error::{ApiError, Result};

/// Cookie carrying the anti-CSRF token issued by the server.
pub const CSRF_COOKIE: &str = "CSRF-TOKEN";

/// Header echoing the CSRF token back on every authenticated call.
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";

const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

#[derive(Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Form(Vec<(String, String)>),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => write!(f, "Empty"),
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            // Form bodies carry the login password.
            RequestBody::Form(fields) => f
                .debug_tuple("Form")
                .field(&fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// Describes one call against the API, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    /// Whether the call needs the session's CSRF token.
    pub requires_session: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            requires_session: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(RequestBody::Json(body))
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(RequestBody::Json(body))
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn without_session(mut self) -> Self {
        self.requires_session = false;
        self
    }
}

/// Status, headers and body of one HTTP exchange, uninterpreted.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs exactly one HTTP exchange.
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse>;

    /// The CSRF token of the current session, if one has been issued.
    fn csrf_token(&self) -> Option<String>;
}

/// Transport backed by a pooled reqwest client with a cookie jar.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    jar: Arc<Jar>,
    config: ConnectorConfig,
    cookie_url: Url,
}

impl HttpTransport {
    pub fn new(config: &ConnectorConfig) -> Result<Self> {
        let cookie_url = Url::parse(&format!("{}/", config.api_url))
            .map_err(|e| ApiError::config(format!("Invalid API URL: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_certificates)
            .build()
            .map_err(|e| ApiError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            jar,
            config: config.clone(),
            cookie_url,
        })
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = self.config.endpoint_url(&request.path);

        let mut builder = self.client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        match self.csrf_token() {
            Some(token) => builder = builder.header(CSRF_HEADER, token),
            None if request.requires_session => {
                return Err(ApiError::MissingCredential {
                    path: request.path.clone(),
                });
            }
            None => {}
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.header(CONTENT_TYPE, JSON_CONTENT_TYPE).json(value),
            RequestBody::Form(fields) => builder.form(fields),
        };

        debug!("{} {}", request.method, url);

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    fn csrf_token(&self) -> Option<String> {
        let cookies = self.jar.cookies(&self.cookie_url)?;
        let cookies = cookies.to_str().ok()?;
        cookies
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
            .map(str::to_string)
    }
}
