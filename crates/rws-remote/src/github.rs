//! Git Data API client.
//!
//! [`GithubRemote`] speaks the REST endpoints used to read a branch and to
//! publish a commit without a local clone: recursive tree listing, file
//! contents, ref lookup, and blob/tree/commit creation followed by a ref
//! update. Non-success responses are classified by [`classify_status`].

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use rws_types::{EntryKind, FileMode, ObjectId, RepoRef, RepositoryEntry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::RemoteConfig;
use crate::error::{classify_status, RemoteError, RemoteResult};
use crate::traits::RemoteStore;
use crate::types::{TreeChange, TreeListing};

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// HTTPS client for a GitHub-compatible Git Data API.
pub struct GithubRemote {
    client: Client,
    api_base: Url,
    token: Option<String>,
}

impl GithubRemote {
    /// Build a client from configuration.
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_url()?,
            token: config.effective_token().map(str::to_string),
        })
    }

    /// Whether requests carry a credential.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// `{api_base}/repos/{owner}/{repo}/{segments...}`.
    ///
    /// Segments are split on `/` so branch names and file paths keep their
    /// separators unescaped, while every other character is percent-encoded.
    fn endpoint<'a>(
        &self,
        repo: &RepoRef,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> RemoteResult<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|()| {
                RemoteError::Config(format!("{} cannot be used as an API base", self.api_base))
            })?;
            path.pop_if_empty()
                .push("repos")
                .push(&repo.owner)
                .push(&repo.repo);
            for segment in segments {
                path.extend(segment.split('/').filter(|s| !s.is_empty()));
            }
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(ACCEPT, ACCEPT_JSON);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder, target: &str) -> RemoteResult<Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), target, "remote response");
        if status.is_success() {
            return Ok(response);
        }

        let (remaining, reset) = rate_headers(response.headers());
        let message = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("").to_string());
        let error = classify_status(
            status.as_u16(),
            remaining.as_deref(),
            reset.as_deref(),
            &message,
            target,
        );
        warn!(status = status.as_u16(), target, error = %error, "remote request failed");
        Err(error)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        target: &str,
    ) -> RemoteResult<T> {
        let response = self.execute(request, target).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(format!("{target}: {e}")))
    }
}

impl std::fmt::Debug for GithubRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubRemote")
            .field("api_base", &self.api_base.as_str())
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

fn rate_headers(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    (get("x-ratelimit-remaining"), get("x-ratelimit-reset"))
}

fn parse_id(sha: &str) -> RemoteResult<ObjectId> {
    ObjectId::from_hex(sha).map_err(|e| RemoteError::Decode(e.to_string()))
}

// ---------------------------------------------------------------------------
// Wire formats
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ShaBody {
    sha: String,
}

#[derive(Deserialize)]
struct RefBody {
    object: ShaBody,
}

#[derive(Deserialize)]
struct CommitBody {
    tree: ShaBody,
}

#[derive(Deserialize)]
struct TreeBody {
    sha: String,
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Deserialize)]
struct TreeItem {
    path: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Serialize)]
struct NewBlob {
    content: String,
    encoding: &'static str,
}

#[derive(Serialize)]
struct NewTree<'a> {
    base_tree: &'a ObjectId,
    tree: Vec<NewTreeItem<'a>>,
}

#[derive(Serialize)]
struct NewTreeItem<'a> {
    path: &'a str,
    mode: FileMode,
    #[serde(rename = "type")]
    kind: &'static str,
    /// Serialized as `null` for deletions.
    sha: Option<&'a ObjectId>,
}

#[derive(Serialize)]
struct NewCommit<'a> {
    message: &'a str,
    tree: &'a ObjectId,
    parents: [&'a ObjectId; 1],
}

#[derive(Serialize)]
struct RefPatch<'a> {
    sha: &'a ObjectId,
    force: bool,
}

#[async_trait]
impl RemoteStore for GithubRemote {
    async fn fetch_tree(&self, repo: &RepoRef, branch: &str) -> RemoteResult<TreeListing> {
        let mut url = self.endpoint(repo, ["git/trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        let target = format!("{repo}@{branch}");

        let body: TreeBody = match self.fetch_json(self.client.get(url), &target).await {
            // Hosts answer 409 for a repository with no commits at all.
            Err(RemoteError::Api { status: 409, .. }) => {
                return Err(RemoteError::NotFound(format!("{target} (empty repository)")))
            }
            other => other?,
        };

        let mut entries = Vec::with_capacity(body.tree.len());
        for item in body.tree {
            let kind = match item.kind.as_str() {
                "blob" => EntryKind::File,
                "tree" => EntryKind::Directory,
                other => {
                    debug!(path = %item.path, kind = other, "skipping tree entry");
                    continue;
                }
            };
            let mut entry = RepositoryEntry::new(item.path, kind, parse_id(&item.sha)?);
            if kind.is_file() {
                if let Some(mode) = item.mode.as_deref().and_then(FileMode::parse) {
                    entry = entry.with_mode(mode);
                }
            }
            entries.push(entry);
        }
        if body.truncated {
            warn!(target = %target, count = entries.len(), "tree listing truncated by host");
        }
        Ok(TreeListing {
            tree_id: parse_id(&body.sha)?,
            entries,
            truncated: body.truncated,
        })
    }

    async fn fetch_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        branch: &str,
    ) -> RemoteResult<Option<String>> {
        let mut url = self.endpoint(repo, ["contents", path])?;
        url.query_pairs_mut().append_pair("ref", branch);

        let body: Value = match self.fetch_json(self.client.get(url), path).await {
            Err(RemoteError::NotFound(_)) => return Ok(None),
            other => other?,
        };
        // Directories come back as arrays, and files over the inline size
        // limit come back with encoding "none" and an empty content field.
        let encoding = body.get("encoding").and_then(Value::as_str);
        let encoded = match (encoding, body.get("content").and_then(Value::as_str)) {
            (Some("base64"), Some(encoded)) => encoded,
            (Some(other), _) => {
                return Err(RemoteError::ContentUnavailable(format!(
                    "{path}: host returned encoding {other:?}"
                )))
            }
            (None, _) => {
                return Err(RemoteError::ContentUnavailable(format!(
                    "{path}: not a file"
                )))
            }
        };
        let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = STANDARD
            .decode(cleaned)
            .map_err(|e| RemoteError::Decode(format!("{path}: {e}")))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| RemoteError::ContentUnavailable(format!("{path} is not UTF-8 text")))
    }

    async fn resolve_ref(&self, repo: &RepoRef, branch: &str) -> RemoteResult<ObjectId> {
        let url = self.endpoint(repo, ["git/ref/heads", branch])?;
        let body: RefBody = self
            .fetch_json(self.client.get(url), &format!("refs/heads/{branch}"))
            .await?;
        parse_id(&body.object.sha)
    }

    async fn commit_tree(&self, repo: &RepoRef, commit: &ObjectId) -> RemoteResult<ObjectId> {
        let url = self.endpoint(repo, ["git/commits", commit.as_str()])?;
        let body: CommitBody = self
            .fetch_json(self.client.get(url), &format!("commit {}", commit.short()))
            .await?;
        parse_id(&body.tree.sha)
    }

    async fn create_blob(&self, repo: &RepoRef, content: &str) -> RemoteResult<ObjectId> {
        let url = self.endpoint(repo, ["git/blobs"])?;
        let payload = NewBlob {
            content: STANDARD.encode(content.as_bytes()),
            encoding: "base64",
        };
        let body: ShaBody = self
            .fetch_json(self.client.post(url).json(&payload), "git/blobs")
            .await?;
        parse_id(&body.sha)
    }

    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &ObjectId,
        changes: &[TreeChange],
    ) -> RemoteResult<ObjectId> {
        let url = self.endpoint(repo, ["git/trees"])?;
        let payload = NewTree {
            base_tree,
            tree: changes
                .iter()
                .map(|c| NewTreeItem {
                    path: &c.path,
                    mode: c.mode,
                    kind: "blob",
                    sha: c.object_id.as_ref(),
                })
                .collect(),
        };
        let body: ShaBody = self
            .fetch_json(self.client.post(url).json(&payload), "git/trees")
            .await?;
        parse_id(&body.sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &ObjectId,
        parent: &ObjectId,
    ) -> RemoteResult<ObjectId> {
        let url = self.endpoint(repo, ["git/commits"])?;
        let payload = NewCommit {
            message,
            tree,
            parents: [parent],
        };
        let body: ShaBody = self
            .fetch_json(self.client.post(url).json(&payload), "git/commits")
            .await?;
        parse_id(&body.sha)
    }

    async fn update_ref(
        &self,
        repo: &RepoRef,
        branch: &str,
        commit: &ObjectId,
        expected_parent: &ObjectId,
    ) -> RemoteResult<()> {
        // The host enforces fast-forward itself when `force` is false: a
        // commit whose parent is no longer the branch head is rejected.
        debug!(branch, parent = expected_parent.short(), commit = commit.short(), "updating ref");
        let url = self.endpoint(repo, ["git/refs/heads", branch])?;
        let payload = RefPatch {
            sha: commit,
            force: false,
        };
        let request = self.client.patch(url).json(&payload);
        match self.execute(request, &format!("refs/heads/{branch}")).await {
            Ok(_) => Ok(()),
            Err(RemoteError::Api {
                status: 409 | 422, ..
            }) => Err(RemoteError::StaleParent {
                branch: branch.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
