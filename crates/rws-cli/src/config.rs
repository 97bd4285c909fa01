//! CLI configuration: a TOML file under the user's config directory,
//! overridden by flags and environment.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rws_remote::RemoteConfig;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub remote: RemoteConfig,
}

impl CliConfig {
    /// `~/.config/rws/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("rws").join("config.toml"))
    }

    /// Load `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply command-line and environment values over the file.
    pub fn with_overrides(mut self, token: Option<String>, api_base: Option<Url>) -> Self {
        if let Some(token) = token {
            self.remote.token = Some(token);
        }
        if let Some(api_base) = api_base {
            self.remote.api_base = Some(api_base);
        }
        self
    }

    /// A copy safe to print: the token, if any, is masked.
    pub fn masked(&self) -> Self {
        let mut shown = self.clone();
        if shown.remote.effective_token().is_some() {
            shown.remote.token = Some("********".to_string());
        }
        shown
    }

    pub fn to_display_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(&self.masked())?)
    }
}
