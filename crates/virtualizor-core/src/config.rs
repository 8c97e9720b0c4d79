//! Configuration structures for Virtualizor clients.
//!
//! A [`ClientConfig`] describes one panel endpoint together with the
//! credentials used against it. The credential kind decides which API variant
//! the client speaks, so response handling never has to guess from the shape
//! of a reply.

use crate::Error;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Default port of the admin panel API.
pub const DEFAULT_ADMIN_PORT: u16 = 4085;

/// Default port of the end-user panel API.
pub const DEFAULT_USER_PORT: u16 = 4083;

/// Upper bound accepted for the request timeout, in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// The two API surfaces a Virtualizor panel exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVariant {
    /// Admin API (`adminapikey` / `adminapipass`)
    Admin,
    /// End-user API (`apikey` / `apipass`)
    EndUser,
}

impl ApiVariant {
    /// Returns the variant name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::EndUser => "enduser",
        }
    }

    /// Returns the default panel port for the variant.
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Admin => DEFAULT_ADMIN_PORT,
            Self::EndUser => DEFAULT_USER_PORT,
        }
    }
}

impl fmt::Display for ApiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// API credentials. Always sent as query parameters, never as headers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    /// Admin API key pair
    Admin {
        /// Admin API key
        adminapikey: String,
        /// Admin API password
        adminapipass: SecretString,
    },
    /// End-user API key pair
    User {
        /// API key
        key: String,
        /// API password
        pass: SecretString,
    },
}

impl Credentials {
    /// Create admin credentials.
    pub fn admin(key: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::Admin {
            adminapikey: key.into(),
            adminapipass: SecretString::from(pass.into()),
        }
    }

    /// Create end-user credentials.
    pub fn user(key: impl Into<String>, pass: impl Into<String>) -> Self {
        Self::User {
            key: key.into(),
            pass: SecretString::from(pass.into()),
        }
    }

    /// The API variant these credentials authenticate against.
    #[must_use]
    pub const fn variant(&self) -> ApiVariant {
        match self {
            Self::Admin { .. } => ApiVariant::Admin,
            Self::User { .. } => ApiVariant::EndUser,
        }
    }

    /// Query parameter pairs carrying the credentials.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        match self {
            Self::Admin {
                adminapikey,
                adminapipass,
            } => [
                ("adminapikey", adminapikey.clone()),
                ("adminapipass", adminapipass.expose_secret().to_string()),
            ],
            Self::User { key, pass } => [
                ("apikey", key.clone()),
                ("apipass", pass.expose_secret().to_string()),
            ],
        }
    }

    fn is_complete(&self) -> bool {
        match self {
            Self::Admin {
                adminapikey,
                adminapipass,
            } => !adminapikey.is_empty() && !adminapipass.expose_secret().is_empty(),
            Self::User { key, pass } => !key.is_empty() && !pass.expose_secret().is_empty(),
        }
    }
}

/// URL scheme used to reach the panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// HTTPS (panels always serve TLS)
    #[default]
    Https,
    /// Plain HTTP, for local test servers
    Http,
}

impl Scheme {
    /// Returns the scheme as used in a URL.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }
}

/// Configuration for one panel client.
///
/// The request timeout has no default: a panel that hangs would otherwise
/// hold a call open indefinitely.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClientConfig {
    /// Panel hostname or IP address
    #[validate(length(min = 1))]
    pub host: String,

    /// Panel port; defaults to the variant's standard port
    #[serde(default)]
    #[validate(range(min = 1))]
    pub port: Option<u16>,

    /// API credentials
    pub credentials: Credentials,

    /// Return parsed panel bodies instead of normalized results
    #[serde(default)]
    pub raw_mode: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates (panels usually run self-signed)
    #[serde(default)]
    pub tls_verify: bool,

    /// URL scheme
    #[serde(default)]
    pub scheme: Scheme,
}

impl ClientConfig {
    /// Create a configuration with the required parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty, the credentials are incomplete
    /// or the timeout is out of range.
    pub fn new(host: impl Into<String>, credentials: Credentials, timeout_secs: u64) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            port: None,
            credentials,
            raw_mode: false,
            timeout_secs,
            tls_verify: false,
            scheme: Scheme::Https,
        };

        config.check()?;
        Ok(config)
    }

    /// Set an explicit port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enable or disable raw mode.
    #[must_use]
    pub const fn with_raw_mode(mut self, raw: bool) -> Self {
        self.raw_mode = raw;
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set the request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Set the URL scheme.
    #[must_use]
    pub const fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// The API variant selected by the credentials.
    #[must_use]
    pub const fn variant(&self) -> ApiVariant {
        self.credentials.variant()
    }

    /// The effective port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.variant().default_port())
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the first problem found.
    pub fn check(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        if !self.credentials.is_complete() {
            return Err(Error::ConfigError(
                "Invalid configuration: credentials must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Build the panel base URL (`scheme://host:port/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not form a valid URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let url = Url::parse(&format!(
            "{}://{}:{}/",
            self.scheme.as_str(),
            self.host,
            self.port()
        ))?;
        Ok(url)
    }
}
