//! Query string and form body encoding.
//!
//! Parameters keep their insertion order. Absent values are dropped at encode
//! time; an empty string is still a value and is kept.

use crate::config::Credentials;
use std::fmt::Display;
use url::form_urlencoded;

/// Key of the response-format marker.
pub const FORMAT_KEY: &str = "api";

/// Value asking the panel for JSON instead of rendered HTML.
pub const FORMAT_JSON: &str = "json";

/// Builder for assembling request parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, Option<String>)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a parameter that may be absent.
    pub fn push_opt<T>(&mut self, key: &'static str, value: Option<T>)
    where
        T: ToString,
    {
        self.pairs.push((key, value.map(|v| v.to_string())));
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: &'static str, value: T)
    where
        T: Display,
    {
        self.pairs.push((key, Some(value.to_string())));
    }

    /// Append the credential pair.
    pub fn push_credentials(&mut self, credentials: &Credentials) {
        for (key, value) in credentials.query_pairs() {
            self.pairs.push((key, Some(value)));
        }
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encode as a query string, prefixed with `?`.
    ///
    /// The `api=json` marker is always present exactly once: an existing
    /// `api` entry is overwritten in place, otherwise the marker is appended.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut marked = false;

        for (key, value) in &self.pairs {
            if *key == FORMAT_KEY {
                if !marked {
                    serializer.append_pair(FORMAT_KEY, FORMAT_JSON);
                    marked = true;
                }
                continue;
            }
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }

        if !marked {
            serializer.append_pair(FORMAT_KEY, FORMAT_JSON);
        }

        format!("?{}", serializer.finish())
    }

    /// Encode as an `application/x-www-form-urlencoded` request body.
    #[must_use]
    pub fn encode_form(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            if let Some(value) = value {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}
