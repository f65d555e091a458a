//! client configuration
//!
//! build a [`ClientConfig`] from an api key and optional overrides, then
//! pass it to [`crate::Client::new`] to create a client.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// hosted gateway api root
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.thegraph.com/api";

/// subgraph id of the graph network subgraph on arbitrum
pub const DEFAULT_NETWORK_SUBGRAPH_ID: &str = "DZz4kDTdmzWLWsV373w2bSmoar3umKKH9y82SUKr5qmp";

/// configuration for the gateway client
#[derive(Clone)]
pub struct ClientConfig {
    /// original base url input
    pub(crate) raw_base_url: String,

    /// gateway api root (e.g., "<https://gateway.thegraph.com/api>")
    pub(crate) base_url: Url,

    /// whether the provided base url parsed successfully
    pub(crate) base_url_valid: bool,

    /// gateway api key
    pub(crate) api_key: String,

    /// request timeout; unset leaves the transport default in place
    pub(crate) timeout: Option<Duration>,

    /// user agent string
    pub(crate) user_agent: String,

    /// whether to verify ssl certificates
    pub(crate) verify_ssl: bool,

    /// additional headers to send with every request
    pub(crate) extra_headers: HeaderMap,

    /// subgraph id used by the network helpers
    pub(crate) network_subgraph_id: String,

    /// prebuilt http client (takes precedence over http_client_builder)
    pub(crate) http_client: Option<reqwest::Client>,

    /// callback to customize the http client builder before building
    pub(crate) http_client_builder:
        Option<Arc<dyn Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync>>,
}

impl ClientConfig {
    /// create a new client configuration for the hosted gateway
    ///
    /// # arguments
    ///
    /// * `api_key` - the gateway api key from subgraph studio
    ///
    /// # example
    ///
    /// ```
    /// use graph_gateway::ClientConfig;
    ///
    /// let config = ClientConfig::new("your-api-key");
    /// ```
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            raw_base_url: DEFAULT_GATEWAY_URL.to_string(),
            base_url: Url::parse(DEFAULT_GATEWAY_URL).expect("default gateway url is valid"),
            base_url_valid: true,
            api_key: api_key.into(),
            timeout: None,
            user_agent: format!("graph-gateway-rs/{} (Rust)", env!("CARGO_PKG_VERSION")),
            verify_ssl: true,
            extra_headers: HeaderMap::new(),
            network_subgraph_id: DEFAULT_NETWORK_SUBGRAPH_ID.to_string(),
            http_client: None,
            http_client_builder: None,
        }
    }

    /// create a configuration from an optional key, e.g. an environment lookup
    ///
    /// a missing key is reported by [`crate::Client::new`] as a config error.
    pub fn from_optional(api_key: Option<String>) -> Self {
        Self::new(api_key.unwrap_or_default())
    }

    /// point the client at a different gateway root (with or without trailing slash)
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Self {
        let base_url_str = base_url.as_ref();

        let normalized = base_url_str.trim_end_matches('/');

        let parsed = Url::parse(normalized)
            .or_else(|_| Url::parse(&format!("https://{}", normalized)));

        self.raw_base_url = base_url_str.to_string();
        match parsed {
            Ok(url) => {
                self.base_url = url;
                self.base_url_valid = true;
            }
            Err(_) => self.base_url_valid = false,
        }
        self
    }

    /// set a request timeout
    ///
    /// default: none, the transport default applies
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// set a custom user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// disable ssl certificate verification (not recommended for production)
    ///
    /// default: enabled
    pub fn with_ssl_verification(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// add a header to every request
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.extra_headers.insert(name, value);
        self
    }

    /// add a set of headers to every request
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.extra_headers.extend(headers);
        self
    }

    /// access extra headers configured on this client
    pub fn extra_headers(&self) -> &HeaderMap {
        &self.extra_headers
    }

    /// override the network subgraph used by the search and deployment helpers
    pub fn with_network_subgraph(mut self, id: impl Into<String>) -> Self {
        self.network_subgraph_id = id.into();
        self
    }

    /// gateway api root
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// inject a prebuilt http client.
    ///
    /// when set, this client is used as-is and takes precedence over
    /// `with_http_client_builder`. transport configuration (tls, timeouts,
    /// ssl verification, user agent, extra headers) comes from the prebuilt
    /// client; the corresponding `ClientConfig` fields are ignored. the api
    /// key is still applied per request.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// customize the http client builder before the client is created.
    ///
    /// the callback receives a builder that already has the extra headers,
    /// user agent, timeout, and ssl settings applied.
    /// use this to add proxy config, custom tls roots, or other transport
    /// settings without reimplementing the defaults.
    ///
    /// ignored if `with_http_client` is also set.
    pub fn with_http_client_builder<F>(mut self, f: F) -> Self
    where
        F: Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static,
    {
        self.http_client_builder = Some(Arc::new(f));
        self
    }

    /// validate the configuration
    pub(crate) fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "api key is required. get one from https://thegraph.com/studio/".to_string(),
            ));
        }

        if !self.base_url_valid {
            return Err(Error::Config(format!(
                "invalid base url: {}",
                self.raw_base_url
            )));
        }

        if self.base_url.scheme() != "http" && self.base_url.scheme() != "https" {
            return Err(Error::Config(format!(
                "invalid url scheme: {}. must be http or https",
                self.base_url.scheme()
            )));
        }

        if self.base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base url cannot carry a path: {}",
                self.raw_base_url
            )));
        }

        Ok(())
    }

    /// build the query url for an endpoint
    ///
    /// subgraph ids embed the api key in the path; deployment ids use a fixed
    /// path and authenticate with a bearer header instead.
    pub(crate) fn endpoint_url(&self, endpoint: &Endpoint) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("base url cannot carry a path: {}", self.raw_base_url))
            })?;
            segments.pop_if_empty();
            match endpoint {
                Endpoint::Subgraph(id) => {
                    segments.push(&self.api_key).push("subgraphs").push("id").push(id);
                }
                Endpoint::Deployment(id) => {
                    segments.push("deployments").push("id").push(id);
                }
            }
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("verify_ssl", &self.verify_ssl)
            .field("extra_headers", &self.extra_headers.len())
            .field("network_subgraph_id", &self.network_subgraph_id)
            .field("http_client", &self.http_client.is_some())
            .field("http_client_builder", &self.http_client_builder.is_some())
            .field("api_key", &"<redacted>")
            .finish()
    }
}
