//! Settings read once from the process environment at startup.

use snafu::{ResultExt, Snafu};
use url::Url;

use crate::client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Primary variable holding the Gemini credential.
pub const API_KEY_VAR: &str = "API_KEY";
/// Checked when [`API_KEY_VAR`] is unset.
pub const FALLBACK_API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "AGRIVISION_BASE_URL";
pub const MODEL_VAR: &str = "AGRIVISION_MODEL";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("AGRIVISION_BASE_URL is not a valid URL: '{value}'"))]
    InvalidBaseUrl {
        source: url::ParseError,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// The Gemini credential; `None` is reported when an edit is submitted.
    pub api_key: Option<String>,
    /// API root, always ending in `/`.
    pub base_url: Url,
    pub model: String,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).or_else(|| non_empty(FALLBACK_API_KEY_VAR));

        let base_url = match non_empty(BASE_URL_VAR) {
            Some(value) => {
                let normalized = if value.ends_with('/') {
                    value.clone()
                } else {
                    format!("{value}/")
                };
                Url::parse(&normalized).context(InvalidBaseUrlSnafu { value })?
            }
            None => Url::parse(DEFAULT_BASE_URL).context(InvalidBaseUrlSnafu {
                value: DEFAULT_BASE_URL,
            })?,
        };

        let model = non_empty(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
        })
    }
}
