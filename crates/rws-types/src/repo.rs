//! Repository references: the `owner/repo` pair a workspace is opened on.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TypeError;

/// Identifies a remote repository by owner and name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Create a reference from already-split parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self, TypeError> {
        let owner = owner.into();
        let repo = repo.into();
        let repo = repo.strip_suffix(".git").unwrap_or(&repo).to_string();
        if !is_valid_segment(&owner) || !is_valid_segment(&repo) {
            return Err(TypeError::InvalidRepoRef(format!("{owner}/{repo}")));
        }
        Ok(Self { owner, repo })
    }

    /// Parse user input: either `owner/repo` or a repository URL such as
    /// `https://github.com/owner/repo/tree/main`.
    ///
    /// For URLs only the first two path segments are used.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let input = input.trim();
        if input.starts_with("http://") || input.starts_with("https://") {
            let url =
                Url::parse(input).map_err(|e| TypeError::InvalidRepoRef(format!("{input}: {e}")))?;
            let mut segments = url
                .path_segments()
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty());
            return match (segments.next(), segments.next()) {
                (Some(owner), Some(repo)) => Self::new(owner, repo),
                _ => Err(TypeError::InvalidRepoRef(input.to_string())),
            };
        }

        match input.split_once('/') {
            Some((owner, repo)) if !repo.contains('/') => Self::new(owner, repo),
            _ => Err(TypeError::InvalidRepoRef(input.to_string())),
        }
    }

    /// `owner/repo`, as used in API paths.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl std::str::FromStr for RepoRef {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn is_valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
