//! Absolute web address used by offers and URL brain content

use serde::{Deserialize, Serialize};
use url::Url;

/// A well-formed absolute http(s) URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebAddress(String);

impl WebAddress {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        let url = Url::parse(trimmed).map_err(|e| format!("'{}' is not a valid URL: {}", trimmed, e))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(format!("'{}' must use http or https, not {}", trimmed, scheme)),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(format!("'{}' has no host", trimmed));
        }
        Ok(Self(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WebAddress {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WebAddress> for String {
    fn from(address: WebAddress) -> String {
        address.0
    }
}

impl std::fmt::Display for WebAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
