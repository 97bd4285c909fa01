use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{RemoteError, RemoteResult};

/// Connection settings for a Git Data API host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// API root, e.g. `https://host/api/v3`. Unset means
    /// [`DEFAULT_API_BASE`](Self::DEFAULT_API_BASE).
    pub api_base: Option<Url>,
    /// Personal access token. Anonymous access is read-only and heavily
    /// rate limited.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl RemoteConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.github.com";

    /// The configured API root, or the public host.
    pub fn api_url(&self) -> RemoteResult<Url> {
        match &self.api_base {
            Some(url) => Ok(url.clone()),
            None => {
                Url::parse(Self::DEFAULT_API_BASE).map_err(|e| RemoteError::Config(e.to_string()))
            }
        }
    }

    /// The token, if set and not blank.
    pub fn effective_token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            token: None,
            timeout_secs: 30,
            user_agent: format!("rws/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RemoteConfig::default();
        assert!(c.api_base.is_none());
        assert_eq!(c.api_url().unwrap().as_str(), "https://api.github.com/");
        assert_eq!(c.timeout_secs, 30);
        assert!(c.token.is_none());
        assert!(c.user_agent.starts_with("rws/"));
    }

    #[test]
    fn blank_token_is_ignored() {
        let c = RemoteConfig {
            token: Some("  ".into()),
            ..RemoteConfig::default()
        };
        assert_eq!(c.effective_token(), None);

        let c = RemoteConfig {
            token: Some(" ghp_abc \n".into()),
            ..RemoteConfig::default()
        };
        assert_eq!(c.effective_token(), Some("ghp_abc"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: RemoteConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(c.timeout_secs, 5);
        assert_eq!(c.api_url().unwrap().as_str(), "https://api.github.com/");
    }

    #[test]
    fn configured_api_base_wins() {
        let c: RemoteConfig =
            serde_json::from_str(r#"{"api_base": "https://git.example.com/api/v3"}"#).unwrap();
        assert_eq!(c.api_url().unwrap().as_str(), "https://git.example.com/api/v3");
    }
}
