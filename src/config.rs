//! Application configuration.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```toml
//! trailing_slash_redirect = false
//! parse_body = false
//! ```

use serde::Deserialize;

use crate::error::Error;

/// Behaviour switches for an [`App`](crate::App).
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Treat `/a/` and `/a` as the same route.
    pub trailing_slash_redirect: bool,
    /// Run the query-string middleware ahead of every route.
    pub parse_query: bool,
    /// Run the body-parsing middleware ahead of every route.
    pub parse_body: bool,
}

impl Config {
    /// Parses a TOML document.
    pub fn from_toml(input: &str) -> Result<Self, Error> {
        Ok(toml::from_str(input)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trailing_slash_redirect: true,
            parse_query: true,
            parse_body: true,
        }
    }
}
