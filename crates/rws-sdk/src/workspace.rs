use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use rws_commit::{CommitPipeline, CommitReceipt, CommitRequest};
use rws_index::{
    project, ChangeStatus, DirectoryTree, IndexError, Overlay, OverlayEntry, RemoteTreeIndex,
    StagingSet,
};
use rws_remote::RemoteStore;
use rws_types::{path, EntryKind, RepoRef};
use tracing::{debug, info, warn};

use crate::buffer::{BufferSet, OpenBuffer};
use crate::diff::{diff_text, FileDiff};
use crate::error::{SdkError, SdkResult};
use crate::notify::Notification;
use crate::services::{AutoConfirm, EditorService, NoopEditor, UserPrompt};

/// Placeholder leaf that keeps an otherwise empty folder alive remotely.
pub const FOLDER_PLACEHOLDER: &str = ".gitkeep";

type Inbox = Arc<Mutex<Vec<(String, String)>>>;

/// Host capabilities handed to a workspace.
#[derive(Clone)]
pub struct Services {
    pub editor: Arc<dyn EditorService>,
    pub prompt: Arc<dyn UserPrompt>,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            editor: Arc::new(NoopEditor),
            prompt: Arc::new(AutoConfirm),
        }
    }
}

/// One repository branch opened for browsing, editing and committing.
///
/// Owns the remote tree snapshot, the overlay of unpublished changes, the
/// staging set and the open buffers. Opening another branch or repository
/// means building a new `Workspace`; nothing carries over.
pub struct Workspace {
    remote: Arc<dyn RemoteStore>,
    pipeline: CommitPipeline,
    services: Services,
    index: RemoteTreeIndex,
    overlay: Overlay,
    staging: StagingSet,
    buffers: BufferSet,
    inbox: Inbox,
    notification: Option<Notification>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("index", &self.index)
            .field("overlay", &self.overlay.len())
            .field("staged", &self.staging.len())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

impl Workspace {
    /// Open `repo` at `branch` with headless services.
    pub async fn open(
        remote: Arc<dyn RemoteStore>,
        repo: RepoRef,
        branch: impl Into<String>,
    ) -> SdkResult<Self> {
        Self::open_with(remote, Services::default(), repo, branch).await
    }

    /// Open `repo` at `branch`.
    ///
    /// Fails with `NotFound` if the repository or branch does not exist or
    /// has no files.
    pub async fn open_with(
        remote: Arc<dyn RemoteStore>,
        services: Services,
        repo: RepoRef,
        branch: impl Into<String>,
    ) -> SdkResult<Self> {
        let index = RemoteTreeIndex::load(remote.as_ref(), repo, branch).await?;

        let inbox: Inbox = Arc::default();
        let sink = Arc::clone(&inbox);
        services.editor.on_change(Box::new(move |path, content| {
            if let Ok(mut pending) = sink.lock() {
                pending.push((path.to_string(), content.to_string()));
            }
        }));

        let notification = Notification::info(format!(
            "Opened {} at {} ({} entries).",
            index.repo(),
            index.branch(),
            index.len()
        ));
        Ok(Self {
            pipeline: CommitPipeline::new(Arc::clone(&remote)),
            remote,
            services,
            index,
            overlay: Overlay::new(),
            staging: StagingSet::new(),
            buffers: BufferSet::new(),
            inbox,
            notification: Some(notification),
        })
    }

    /// Release the editor surface.
    pub fn leave(self) {
        self.services.editor.dispose();
        info!(repo = %self.index.repo(), "left workspace");
    }

    // ---- Accessors ----

    pub fn repo(&self) -> &RepoRef {
        self.index.repo()
    }

    pub fn branch(&self) -> &str {
        self.index.branch()
    }

    pub fn index(&self) -> &RemoteTreeIndex {
        &self.index
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    /// Folder/file view of the remote tree with pending changes applied.
    pub fn projected_tree(&self) -> DirectoryTree {
        project(&self.index, &self.overlay)
    }

    pub fn staged_paths(&self) -> BTreeSet<String> {
        self.staging.to_set()
    }

    pub fn status(&self) -> ChangeStatus {
        ChangeStatus::compute(&self.index, &self.overlay, &self.staging)
    }

    pub fn open_buffers(&self) -> &[OpenBuffer] {
        self.buffers.as_slice()
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    fn notify(&mut self, notification: Notification) {
        debug!(message = %notification.message, "notification");
        self.notification = Some(notification);
    }

    fn report<T>(&mut self, result: SdkResult<T>) -> SdkResult<T> {
        if let Err(e) = &result {
            self.notify(Notification::from_error(e));
        }
        result
    }

    // ---- Buffers ----

    /// Apply typing reported by the editor since the last call.
    pub fn sync_editor(&mut self) {
        let pending = match self.inbox.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for (path, content) in pending {
            match self.buffers.get_mut(&path) {
                Some(buffer) => buffer.live_content = content,
                None => debug!(path = %path, "change for closed buffer dropped"),
            }
        }
    }

    /// Open `path` for editing and return its live content.
    ///
    /// An already-open buffer is returned as is. Otherwise the content comes
    /// from the overlay if pending, else from the remote, where a missing
    /// file reads as empty. Folders and paths below a file cannot be opened.
    pub async fn select_file(&mut self, path: &str) -> SdkResult<String> {
        let result = self.do_select_file(path).await;
        self.report(result)
    }

    async fn do_select_file(&mut self, path: &str) -> SdkResult<String> {
        self.sync_editor();
        let path = path::normalize(path)?;
        if let Some(buffer) = self.buffers.get(&path) {
            self.services.editor.open(buffer);
            return Ok(buffer.live_content.clone());
        }
        self.overlay.check_leaf_target(&self.index, &path)?;

        let buffer = match self.overlay.get(&path) {
            Some(OverlayEntry::Edited(content)) => OpenBuffer::new(&path, content.clone()),
            Some(OverlayEntry::Deleted) => {
                return Err(IndexError::ContentUnavailable(path).into());
            }
            None => {
                let content = self
                    .remote
                    .read_file(self.index.repo(), &path, self.index.branch())
                    .await?;
                OpenBuffer::new(&path, content)
            }
        };
        let buffer = self.buffers.open(buffer);
        self.services.editor.open(buffer);
        debug!(path = %path, "opened buffer");
        Ok(buffer.live_content.clone())
    }

    /// Replace the live text of an open buffer.
    pub fn edit_buffer(&mut self, path: &str, content: impl Into<String>) -> SdkResult<()> {
        self.sync_editor();
        let path = path::normalize(path)?;
        let buffer = self
            .buffers
            .get_mut(&path)
            .ok_or(SdkError::BufferNotOpen(path))?;
        buffer.live_content = content.into();
        Ok(())
    }

    /// Write an open buffer into the overlay and stage it.
    ///
    /// Returns `false` if the buffer had no unsaved typing. Saving text equal
    /// to the remote copy drops the pending change instead.
    pub fn save_buffer(&mut self, path: &str) -> SdkResult<bool> {
        let result = self.do_save_buffer(path);
        self.report(result)
    }

    fn do_save_buffer(&mut self, path: &str) -> SdkResult<bool> {
        self.sync_editor();
        let path = path::normalize(path)?;
        let Some(buffer) = self.buffers.get_mut(&path) else {
            return Err(SdkError::BufferNotOpen(path));
        };
        if !buffer.is_dirty() {
            return Ok(false);
        }
        self.overlay
            .record_edit(&self.index, &path, buffer.live_content.clone())?;
        buffer.mark_saved();
        let name = path::file_name(&path).to_string();

        if !self.overlay.contains(&path) {
            self.staging.unstage(&path);
            self.notify(Notification::info(format!("{name} matches the remote copy.")));
            return Ok(true);
        }

        self.staging.stage(&self.overlay, &path)?;
        info!(path = %path, "saved locally");
        self.notify(Notification::info(format!("{name} saved locally.")));
        Ok(true)
    }

    /// Close a buffer. Unsaved typing is lost; the overlay is untouched.
    pub fn close_buffer(&mut self, path: &str) -> bool {
        self.sync_editor();
        path::normalize(path).is_ok_and(|path| self.buffers.close(&path).is_some())
    }

    // ---- Tree operations ----

    /// Create a file or folder named `name` under `base` (`""` for the
    /// root) and stage it. Returns the new path.
    ///
    /// A folder is created as an empty `.gitkeep` leaf. A file is created
    /// empty and opened in the editor.
    pub fn create_path(&mut self, base: &str, name: &str, kind: EntryKind) -> SdkResult<String> {
        let result = self.do_create_path(base, name, kind);
        self.report(result)
    }

    fn do_create_path(&mut self, base: &str, name: &str, kind: EntryKind) -> SdkResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SdkError::EmptyName);
        }
        let base = base.trim().trim_matches(path::SEPARATOR);
        if !base.is_empty() && self.overlay.is_live(&self.index, base) {
            return Err(SdkError::NotADirectory(base.to_string()));
        }
        let target = path::join(base, name)?;
        if self.overlay.exists(&self.index, &target) {
            return Err(IndexError::AlreadyExists(target).into());
        }

        match kind {
            EntryKind::Directory => {
                let leaf = path::join(&target, FOLDER_PLACEHOLDER)?;
                self.overlay.record_edit(&self.index, &leaf, "")?;
                self.staging.stage(&self.overlay, &leaf)?;
                self.notify(Notification::info(format!("Folder {target} created.")));
            }
            EntryKind::File => {
                self.overlay.record_edit(&self.index, &target, "")?;
                self.staging.stage(&self.overlay, &target)?;
                let buffer = self.buffers.open(OpenBuffer::new(&target, ""));
                self.services.editor.open(buffer);
                self.notify(Notification::info(format!("File {target} created.")));
            }
        }
        info!(path = %target, %kind, "created");
        Ok(target)
    }

    /// Ask for a name, then [`create_path`](Self::create_path). Cancelling
    /// or answering blank creates nothing.
    pub async fn create_with_prompt(
        &mut self,
        base: &str,
        kind: EntryKind,
    ) -> SdkResult<Option<String>> {
        let question = match kind {
            EntryKind::File => "Enter file name:",
            EntryKind::Directory => "Enter folder name:",
        };
        match self.services.prompt.ask(question).await {
            Some(name) if !name.trim().is_empty() => self.create_path(base, &name, kind).map(Some),
            _ => Ok(None),
        }
    }

    /// Rename a file or folder and stage every affected leaf.
    ///
    /// Returns the affected paths, old and new; empty when renaming onto
    /// itself. Open buffers below the old path follow it.
    pub async fn rename_path(&mut self, old: &str, new: &str) -> SdkResult<Vec<String>> {
        let result = self.do_rename_path(old, new).await;
        self.report(result)
    }

    async fn do_rename_path(&mut self, old: &str, new: &str) -> SdkResult<Vec<String>> {
        self.sync_editor();
        let affected = self
            .overlay
            .record_rename(&self.index, self.remote.as_ref(), old, new)
            .await?;
        if affected.is_empty() {
            return Ok(affected);
        }
        self.staging
            .sync_paths(&self.overlay, affected.iter().map(String::as_str));

        let old = path::normalize(old)?;
        let new = path::normalize(new)?;
        self.buffers.retarget(&old, &new);
        info!(from = %old, to = %new, count = affected.len(), "renamed");
        self.notify(Notification::info(format!("Renamed {old} to {new}.")));
        Ok(affected)
    }

    /// Ask for a new final segment, keeping the parent directory.
    /// Cancelling or keeping the same name does nothing.
    pub async fn rename_with_prompt(&mut self, old: &str) -> SdkResult<Option<Vec<String>>> {
        let old = path::normalize(old)?;
        let current = path::file_name(&old).to_string();
        let answer = self
            .services
            .prompt
            .ask(&format!("Enter new name for {current}:"))
            .await;
        let name = match answer {
            Some(name) if !name.trim().is_empty() && name.trim() != current => {
                name.trim().to_string()
            }
            _ => return Ok(None),
        };
        let new = path::join(path::parent(&old), &name)?;
        self.rename_path(&old, &new).await.map(Some)
    }

    /// Delete a file or folder after confirmation and stage every affected
    /// leaf. Returns `false` if the user declined.
    pub async fn delete_path(&mut self, path: &str) -> SdkResult<bool> {
        let result = self.do_delete_path(path).await;
        self.report(result)
    }

    async fn do_delete_path(&mut self, path: &str) -> SdkResult<bool> {
        self.sync_editor();
        let path = path::normalize(path)?;
        if !self.overlay.exists(&self.index, &path) {
            return Err(IndexError::PathNotFound(path).into());
        }
        if !self
            .services
            .prompt
            .confirm(&format!("Are you sure you want to delete {path}?"))
            .await
        {
            debug!(path = %path, "delete declined");
            return Ok(false);
        }

        let affected = self.overlay.record_delete(&self.index, &path)?;
        self.staging
            .sync_paths(&self.overlay, affected.iter().map(String::as_str));
        self.buffers.close_under(&path);
        info!(path = %path, count = affected.len(), "deleted");
        self.notify(Notification::info(format!("Deleted {path}.")));
        Ok(true)
    }

    // ---- Pending changes ----

    /// Select a pending change for the next commit.
    pub fn stage(&mut self, path: &str) -> SdkResult<bool> {
        let path = path::normalize(path)?;
        Ok(self.staging.stage(&self.overlay, &path)?)
    }

    /// Deselect a path, keeping its pending change.
    pub fn unstage(&mut self, path: &str) -> bool {
        path::normalize(path).is_ok_and(|path| self.staging.unstage(&path))
    }

    /// Drop the pending change of a leaf, or of every leaf below a folder.
    ///
    /// Open buffers of remote files are reset to the remote content; buffers
    /// of files that only existed locally are closed. Returns `false` if
    /// nothing was pending.
    pub async fn discard(&mut self, path: &str) -> SdkResult<bool> {
        let result = self.do_discard(path).await;
        self.report(result)
    }

    async fn do_discard(&mut self, path: &str) -> SdkResult<bool> {
        self.sync_editor();
        let path = path::normalize(path)?;
        let targets: Vec<String> = if self.overlay.contains(&path) {
            vec![path.clone()]
        } else {
            self.overlay
                .paths()
                .filter(|p| path::is_within(p, &path))
                .map(str::to_string)
                .collect()
        };
        if targets.is_empty() {
            return Ok(false);
        }

        // Fetch before changing anything so a failed read leaves state intact.
        let mut resets = Vec::new();
        for target in &targets {
            if self.buffers.get(target).is_some() && self.index.contains_file(target) {
                let content = self
                    .remote
                    .read_file(self.index.repo(), target, self.index.branch())
                    .await?;
                resets.push((target.clone(), content));
            }
        }

        for target in &targets {
            self.overlay.remove(target);
            self.staging.unstage(target);
            if !self.index.contains_file(target) {
                self.buffers.close(target);
            }
        }
        for (target, content) in resets {
            if let Some(buffer) = self.buffers.get_mut(&target) {
                buffer.reset(content);
            }
        }
        info!(path = %path, count = targets.len(), "discarded");
        self.notify(Notification::info(format!("Discarded changes to {path}.")));
        Ok(true)
    }

    /// Live content of any leaf: open buffer, then overlay, then remote.
    pub async fn read_path(&mut self, path: &str) -> SdkResult<String> {
        self.sync_editor();
        let path = path::normalize(path)?;
        if let Some(buffer) = self.buffers.get(&path) {
            return Ok(buffer.live_content.clone());
        }
        match self.overlay.get(&path) {
            Some(OverlayEntry::Edited(content)) => Ok(content.clone()),
            Some(OverlayEntry::Deleted) => Err(IndexError::ContentUnavailable(path).into()),
            None if self.index.contains_file(&path) => Ok(self
                .remote
                .read_file(self.index.repo(), &path, self.index.branch())
                .await?),
            None => Err(IndexError::PathNotFound(path).into()),
        }
    }

    /// Line diff between the remote copy and the pending content.
    pub async fn diff(&self, path: &str) -> SdkResult<FileDiff> {
        let path = path::normalize(path)?;
        let changes = self.status();
        let status = changes
            .staged
            .iter()
            .chain(&changes.unstaged)
            .find(|e| e.path == path)
            .map(|e| e.status);
        let remote = if self.index.contains_file(&path) {
            self.remote
                .read_file(self.index.repo(), &path, self.index.branch())
                .await?
        } else if self.overlay.contains(&path) {
            String::new()
        } else {
            return Err(IndexError::PathNotFound(path).into());
        };
        let pending = match self.overlay.get(&path) {
            Some(OverlayEntry::Edited(content)) => content.clone(),
            Some(OverlayEntry::Deleted) => String::new(),
            None => remote.clone(),
        };
        Ok(diff_text(&path, status, &remote, &pending))
    }

    // ---- Publishing ----

    /// Publish every staged change as one commit on the branch.
    ///
    /// On success the committed paths leave the overlay and staging set,
    /// other pending changes stay, and the remote tree is re-read. On failure
    /// nothing local changes and the same commit can be retried.
    pub async fn commit(&mut self, message: &str) -> SdkResult<CommitReceipt> {
        let result = self.do_commit(message).await;
        self.report(result)
    }

    async fn do_commit(&mut self, message: &str) -> SdkResult<CommitReceipt> {
        self.sync_editor();
        let request =
            CommitRequest::from_staged(message, &self.index, &self.overlay, &self.staging)?;
        let receipt = self
            .pipeline
            .run(self.index.repo(), self.index.branch(), &request)
            .await?;

        receipt.prune(&mut self.overlay, &mut self.staging);

        let count = receipt.paths.len();
        match self.index.refresh(self.remote.as_ref()).await {
            Ok(()) => {
                self.overlay.reconcile(&self.index);
                self.staging.retain_overlay(&self.overlay);
                self.notify(Notification::info(format!(
                    "{count} file(s) committed successfully!"
                )))
            }
            Err(e) => {
                warn!(error = %e, "tree refresh after commit failed");
                self.notify(Notification::warning(format!(
                    "{count} file(s) committed, but reloading the tree failed: {e}"
                )));
            }
        }
        Ok(receipt)
    }

    /// Replace the workspace with `branch` of the same repository.
    ///
    /// Pending changes are dropped, so the user is asked first when there
    /// are any. Returns `false` if declined. A failed load leaves the
    /// current workspace as it was.
    pub async fn switch_branch(&mut self, branch: &str) -> SdkResult<bool> {
        let result = self.do_switch_branch(branch).await;
        self.report(result)
    }

    async fn do_switch_branch(&mut self, branch: &str) -> SdkResult<bool> {
        if !self.overlay.is_empty() {
            let question = format!(
                "Discard {} pending change(s) and switch to {branch}?",
                self.overlay.len()
            );
            if !self.services.prompt.confirm(&question).await {
                return Ok(false);
            }
        }
        let index =
            RemoteTreeIndex::load(self.remote.as_ref(), self.index.repo().clone(), branch).await?;
        self.index = index;
        self.overlay = Overlay::new();
        self.staging = StagingSet::new();
        self.buffers.clear();
        if let Ok(mut pending) = self.inbox.lock() {
            pending.clear();
        }
        info!(branch, "switched branch");
        self.notify(Notification::info(format!("Switched to {branch}.")));
        Ok(true)
    }
}
