//! HTTP transport for the panel API.
//!
//! Every operation is a single exchange against `/index.php`. The whole body
//! is buffered before it is parsed as JSON; there is no streaming and no
//! retry. The HTTP status is only logged because the panel reports failures
//! inside the JSON body.

use crate::action::Action;
use crate::config::ClientConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("virtualizor-core/", env!("CARGO_PKG_VERSION"));

/// Path of the panel API entry point.
pub const INDEX_PATH: &str = "index.php";

/// Content type of every request.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Connection establishment timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// One request to the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Action being performed (used for logging only)
    pub action: Action,
    /// HTTP method
    pub method: Method,
    /// Encoded query string including the leading `?`
    pub query: String,
    /// Optional form-encoded body
    pub body: Option<String>,
}

impl ApiRequest {
    /// Create a GET request.
    #[must_use]
    pub fn get(action: Action, query: String) -> Self {
        Self {
            action,
            method: Method::GET,
            query,
            body: None,
        }
    }

    /// Create a POST request, optionally carrying a form body.
    #[must_use]
    pub fn post(action: Action, query: String, body: Option<String>) -> Self {
        Self {
            action,
            method: Method::POST,
            query,
            body,
        }
    }
}

/// Executes panel requests.
///
/// Implementations perform exactly one exchange per call and resolve it
/// exactly once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request and return the parsed JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportError`] if the exchange fails and
    /// [`Error::MalformedResponse`] if the body is not JSON.
    async fn execute(&self, request: ApiRequest) -> Result<Value>;
}

/// reqwest-backed [`Transport`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Build a transport for the configured panel.
    ///
    /// When TLS verification is disabled, certificates are not checked at all
    /// and a warning is logged: traffic is encrypted but the panel's identity
    /// is not verified.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.base_url()?.join(INDEX_PATH)?;

        let mut builder = ClientBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));

        if !config.tls_verify {
            warn!(
                host = %config.host,
                "TLS certificate verification disabled for Virtualizor panel"
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build panel HTTP client: {err}"))
        })?;

        Ok(Self { http, endpoint })
    }

    /// Return the API endpoint URL (without query).
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn request_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        let query = query.strip_prefix('?').unwrap_or(query);
        url.set_query(if query.is_empty() { None } else { Some(query) });
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = self.request_url(&request.query);
        let action = request.action;
        let started = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Error::from)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::from)?;

        debug!(
            action = %action,
            method = %request.method,
            %status,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Received panel response"
        );

        serde_json::from_slice::<Value>(&bytes).map_err(|err| {
            Error::malformed(
                format!("Panel response for `{action}` is not valid JSON (HTTP {status}): {err}"),
                bytes.to_vec(),
            )
        })
    }
}
