use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::try_join_all;
use rws_remote::{RemoteError, RemoteStore, TreeChange};
use rws_types::{ObjectId, RepoRef};
use tracing::{debug, info, warn};

use crate::error::{CommitError, CommitResult};
use crate::request::{CommitReceipt, CommitRequest, StagedChange};
use crate::stage::PipelineStage;

/// Publishes staged changes to one remote, one run at a time.
///
/// A second [`run`](Self::run) while one is in flight is rejected with
/// [`CommitError::InFlight`]: both would read the same parent and race on
/// the ref update. Runs never retry.
pub struct CommitPipeline {
    remote: Arc<dyn RemoteStore>,
    in_flight: AtomicBool,
    stage: Mutex<PipelineStage>,
}

impl std::fmt::Debug for CommitPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitPipeline")
            .field("in_flight", &self.is_in_flight())
            .field("stage", &self.stage())
            .finish()
    }
}

/// Clears the in-flight flag when a run ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CommitPipeline {
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            remote,
            in_flight: AtomicBool::new(false),
            stage: Mutex::new(PipelineStage::Idle),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Stage of the current run, or the terminal stage of the last one.
    pub fn stage(&self) -> PipelineStage {
        self.stage.lock().map(|s| *s).unwrap_or(PipelineStage::Failed)
    }

    fn enter(&self, stage: PipelineStage) {
        debug!(stage = %stage, "commit stage");
        if let Ok(mut current) = self.stage.lock() {
            *current = stage;
        }
    }

    /// Publish `request` on `branch`.
    ///
    /// The request is validated before any remote call. On failure the
    /// branch has not moved; objects created before the failing step are
    /// left unreferenced on the remote.
    pub async fn run(
        &self,
        repo: &RepoRef,
        branch: &str,
        request: &CommitRequest,
    ) -> CommitResult<CommitReceipt> {
        request.validate()?;
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CommitError::InFlight);
        }
        let _guard = RunGuard(&self.in_flight);

        match self.publish(repo, branch, request).await {
            Ok(receipt) => {
                self.enter(PipelineStage::Committed);
                info!(
                    repo = %repo,
                    branch,
                    commit = receipt.commit_id.short(),
                    count = receipt.paths.len(),
                    "committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(repo = %repo, branch, error = %e, "commit failed");
                self.enter(PipelineStage::Failed);
                Err(e)
            }
        }
    }

    async fn publish(
        &self,
        repo: &RepoRef,
        branch: &str,
        request: &CommitRequest,
    ) -> CommitResult<CommitReceipt> {
        self.enter(PipelineStage::FetchParent);
        let parent = self
            .remote
            .resolve_ref(repo, branch)
            .await
            .map_err(CommitError::at(PipelineStage::FetchParent))?;

        self.enter(PipelineStage::FetchBaseTree);
        let base_tree = self
            .remote
            .commit_tree(repo, &parent)
            .await
            .map_err(CommitError::at(PipelineStage::FetchBaseTree))?;

        self.enter(PipelineStage::CreateBlobs);
        let blobs = self.create_blobs(repo, request).await?;
        let blobs_created = blobs.len();

        self.enter(PipelineStage::CreateTree);
        let mut blobs = blobs.into_iter();
        let mut changes = Vec::with_capacity(request.changes.len());
        for change in &request.changes {
            match change {
                StagedChange::Upsert { path, mode, .. } => {
                    let blob = blobs.next().ok_or_else(|| CommitError::Remote {
                        stage: PipelineStage::CreateTree,
                        source: RemoteError::Internal(format!("no blob created for {path}")),
                    })?;
                    changes.push(TreeChange::upsert(path.clone(), blob, *mode));
                }
                StagedChange::Delete { path } => changes.push(TreeChange::delete(path.clone())),
            }
        }
        let tree = self
            .remote
            .create_tree(repo, &base_tree, &changes)
            .await
            .map_err(CommitError::at(PipelineStage::CreateTree))?;

        self.enter(PipelineStage::CreateCommit);
        let commit = self
            .remote
            .create_commit(repo, request.message.trim(), &tree, &parent)
            .await
            .map_err(CommitError::at(PipelineStage::CreateCommit))?;

        self.enter(PipelineStage::UpdateRef);
        self.remote
            .update_ref(repo, branch, &commit, &parent)
            .await
            .map_err(CommitError::at(PipelineStage::UpdateRef))?;

        let mut paths: Vec<String> = request.paths().into_iter().map(str::to_string).collect();
        paths.sort_unstable();
        paths.dedup();
        Ok(CommitReceipt {
            commit_id: commit,
            tree_id: tree,
            parent_id: parent,
            blobs_created,
            paths,
        })
    }

    /// Upload every edited file concurrently, keeping request order.
    ///
    /// Tree creation waits for all of them; one failure fails the stage.
    async fn create_blobs(
        &self,
        repo: &RepoRef,
        request: &CommitRequest,
    ) -> CommitResult<Vec<ObjectId>> {
        debug!(count = request.upsert_count(), "uploading blobs");
        let uploads = request.changes.iter().filter_map(|change| match change {
            StagedChange::Upsert { content, .. } => Some(self.remote.create_blob(repo, content)),
            StagedChange::Delete { .. } => None,
        });
        let blobs = try_join_all(uploads)
            .await
            .map_err(CommitError::at(PipelineStage::CreateBlobs))?;
        debug!(count = blobs.len(), "blobs created");
        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rws_remote::{InMemoryRemote, RemoteOp};
    use rws_types::{ErrorKind, FileMode};

    fn repo() -> RepoRef {
        RepoRef::new("octo", "demo").unwrap()
    }

    fn setup() -> (Arc<InMemoryRemote>, CommitPipeline) {
        let remote = Arc::new(InMemoryRemote::new());
        remote
            .seed(&repo(), "main", &[("README.md", "hi"), ("src/main.js", "v1")])
            .unwrap();
        let pipeline = CommitPipeline::new(remote.clone());
        (remote, pipeline)
    }

    #[tokio::test]
    async fn publishes_single_edit() {
        let (remote, pipeline) = setup();
        let parent = remote.head(&repo(), "main").unwrap();
        let request = CommitRequest::new("update").with_upsert("src/main.js", "v2");

        let receipt = pipeline.run(&repo(), "main", &request).await.unwrap();

        assert_eq!(
            remote.calls(),
            vec![
                RemoteOp::ResolveRef,
                RemoteOp::CommitTree,
                RemoteOp::CreateBlob,
                RemoteOp::CreateTree,
                RemoteOp::CreateCommit,
                RemoteOp::UpdateRef,
            ]
        );
        assert_eq!(receipt.parent_id, parent);
        assert_eq!(receipt.blobs_created, 1);
        assert_eq!(receipt.paths, vec!["src/main.js"]);
        assert_eq!(remote.head(&repo(), "main"), Some(receipt.commit_id.clone()));
        assert_eq!(
            remote.commit_info(&receipt.commit_id),
            Some(("update".to_string(), Some(parent)))
        );
        let files = remote.files(&repo(), "main").unwrap();
        assert_eq!(files.get("src/main.js").map(String::as_str), Some("v2"));
        assert_eq!(files.get("README.md").map(String::as_str), Some("hi"));
        assert_eq!(pipeline.stage(), PipelineStage::Committed);
    }

    #[tokio::test]
    async fn upsert_mode_reaches_the_tree() {
        let (remote, pipeline) = setup();
        remote
            .chmod(&repo(), "main", "src/main.js", FileMode::Executable)
            .unwrap();
        let request = CommitRequest::new("update")
            .with_upsert_mode("src/main.js", "v2", FileMode::Executable)
            .with_upsert("notes.txt", "n");

        pipeline.run(&repo(), "main", &request).await.unwrap();
        assert_eq!(
            remote.mode_of(&repo(), "main", "src/main.js"),
            Some(FileMode::Executable)
        );
        assert_eq!(
            remote.mode_of(&repo(), "main", "notes.txt"),
            Some(FileMode::Regular)
        );
    }

    #[tokio::test]
    async fn deletes_need_no_blob() {
        let (remote, pipeline) = setup();
        let request = CommitRequest::new("remove readme")
            .with_delete("README.md")
            .with_upsert("b.txt", "b")
            .with_upsert("c.txt", "c");

        let receipt = pipeline.run(&repo(), "main", &request).await.unwrap();
        assert_eq!(remote.call_count(RemoteOp::CreateBlob), 2);
        assert_eq!(receipt.paths, vec!["README.md", "b.txt", "c.txt"]);

        let files = remote.files(&repo(), "main").unwrap();
        assert!(!files.contains_key("README.md"));
        assert_eq!(files.get("c.txt").map(String::as_str), Some("c"));
    }

    #[tokio::test]
    async fn invalid_request_makes_no_remote_calls() {
        let (remote, pipeline) = setup();

        let err = pipeline
            .run(&repo(), "main", &CommitRequest::new("  ").with_upsert("docs/new.md", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::EmptyMessage));

        let err = pipeline
            .run(&repo(), "main", &CommitRequest::new("msg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::EmptyStaging));

        assert!(remote.calls().is_empty());
        assert_eq!(pipeline.stage(), PipelineStage::Idle);
    }

    #[tokio::test]
    async fn missing_branch_fails_at_fetch_parent() {
        let (_remote, pipeline) = setup();
        let err = pipeline
            .run(&repo(), "gone", &CommitRequest::new("m").with_upsert("a", "1"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::FetchParent));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!pipeline.is_in_flight());
    }

    #[tokio::test]
    async fn blob_failure_stops_before_tree() {
        let (remote, pipeline) = setup();
        let head = remote.head(&repo(), "main");
        remote.fail_next(RemoteOp::CreateBlob, RemoteError::Network("reset".into()));

        let request = CommitRequest::new("m")
            .with_upsert("a.txt", "1")
            .with_upsert("b.txt", "2");
        let err = pipeline.run(&repo(), "main", &request).await.unwrap_err();

        assert_eq!(err.stage(), Some(PipelineStage::CreateBlobs));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(remote.call_count(RemoteOp::CreateTree), 0);
        assert_eq!(remote.head(&repo(), "main"), head);
        assert_eq!(pipeline.stage(), PipelineStage::Failed);
    }

    #[tokio::test]
    async fn tree_failure_leaves_branch_and_retry_succeeds() {
        let (remote, pipeline) = setup();
        let head = remote.head(&repo(), "main");
        remote.fail_next(
            RemoteOp::CreateTree,
            RemoteError::Api {
                status: 502,
                message: "bad gateway".into(),
            },
        );
        let request = CommitRequest::new("m").with_upsert("src/main.js", "v2");

        let err = pipeline.run(&repo(), "main", &request).await.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::CreateTree));
        assert_eq!(remote.head(&repo(), "main"), head);

        let receipt = pipeline.run(&repo(), "main", &request).await.unwrap();
        assert_eq!(remote.head(&repo(), "main"), Some(receipt.commit_id));
    }

    #[tokio::test]
    async fn moved_branch_is_stale_parent() {
        let (remote, pipeline) = setup();
        let pause = remote.pause_next(RemoteOp::CreateCommit);
        let request = CommitRequest::new("mine").with_upsert("a.txt", "1");

        let target = repo();
        let (result, ()) = tokio::join!(pipeline.run(&target, "main", &request), async {
            remote
                .push(&repo(), "main", &[("other.txt", Some("x"))], "theirs")
                .unwrap();
            pause.notify_one();
        });

        let err = result.unwrap_err();
        assert_eq!(err.stage(), Some(PipelineStage::UpdateRef));
        assert_eq!(err.kind(), ErrorKind::StaleParent);
        let files = remote.files(&repo(), "main").unwrap();
        assert!(files.contains_key("other.txt"));
        assert!(!files.contains_key("a.txt"));
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected() {
        let (remote, pipeline) = setup();
        let pause = remote.pause_next(RemoteOp::CreateBlob);
        let request = CommitRequest::new("first").with_upsert("a.txt", "1");
        let other = CommitRequest::new("second").with_upsert("b.txt", "2");

        let target = repo();
        let (first, second) = tokio::join!(pipeline.run(&target, "main", &request), async {
            let second = pipeline.run(&repo(), "main", &other).await;
            pause.notify_one();
            second
        });

        assert!(matches!(second, Err(CommitError::InFlight)));
        assert!(first.is_ok());
        assert!(!pipeline.is_in_flight());
        let files = remote.files(&repo(), "main").unwrap();
        assert!(files.contains_key("a.txt"));
        assert!(!files.contains_key("b.txt"));
    }
}
