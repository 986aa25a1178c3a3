//! Transport providers.
//!
//! A provider names the channel through which a call reached a service. The
//! set is closed: anything coming in as a loose string is parsed once, when a
//! hook is built, rather than on every event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParseProviderError;

/// The transport that issued a service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// A REST (HTTP) client.
    Rest,
    /// A websocket client.
    Websocket,
    /// A GraphQL client.
    Graphql,
}

impl Provider {
    /// Every known provider.
    pub const ALL: [Provider; 3] = [Self::Rest, Self::Websocket, Self::Graphql];

    /// Lowercase provider name, as stored in event params.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rest => "rest",
            Self::Websocket => "websocket",
            Self::Graphql => "graphql",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "rest" | "http" => Self::Rest,
            "websocket" | "ws" => Self::Websocket,
            "graphql" => Self::Graphql,
            _ => return Err(ParseProviderError(s.to_string())),
        })
    }
}

impl TryFrom<&str> for Provider {
    type Error = ParseProviderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!("REST".parse::<Provider>(), Ok(Provider::Rest));
        assert_eq!(" ws ".parse::<Provider>(), Ok(Provider::Websocket));
        assert_eq!(
            "smtp".parse::<Provider>(),
            Err(ParseProviderError("smtp".into()))
        );
    }

    #[test]
    fn test_serde_uses_lowercase_tags() {
        let json = serde_json::to_value(Provider::Graphql).unwrap();
        assert_eq!(json, serde_json::json!("graphql"));
    }
}
