//! The drive capability contract
//!
//! A drive maps file-system-like operations onto a specific remote backend
//! and path namespace. A host file browser talks to `dyn Drive` only; it
//! never sees how the operations are carried out.

use async_trait::async_trait;

use crate::error::DriveResult;
use crate::events::{ChangeEvent, ListenerId};
use crate::types::{
    CheckpointModel, ContentModel, CreateOptions, FetchOptions, SaveModel,
};

/// File-operation contract a host file browser consumes
///
/// All operations are async and may fail; results are either fully
/// validated data or an error, never a partial success. Mutating
/// operations broadcast a [`ChangeEvent`] on the drive's change channel
/// after they succeed.
///
/// Implementors must be `Send + Sync`; concurrent calls are independent
/// and are not coalesced or de-duplicated.
#[async_trait]
pub trait Drive: Send + Sync {
    /// Identity of this drive, disambiguating it from others registered
    /// with the host
    fn name(&self) -> &str;

    /// Fetch the model for a file or directory
    ///
    /// # Errors
    ///
    /// Fails if the server rejects the path or the response body does not
    /// have the shape of a content model.
    async fn get(&self, path: &str, options: FetchOptions) -> DriveResult<ContentModel>;

    /// Create a new untitled file or directory inside `options.path`
    ///
    /// Emits [`ChangeEvent::New`] on success.
    async fn new_untitled(&self, options: CreateOptions) -> DriveResult<ContentModel>;

    /// Delete the entry at `path`
    ///
    /// Emits [`ChangeEvent::Delete`] on success.
    async fn delete(&self, path: &str) -> DriveResult<()>;

    /// Move an entry to a new path
    ///
    /// Emits [`ChangeEvent::Rename`] on success.
    async fn rename(&self, old_path: &str, new_path: &str) -> DriveResult<ContentModel>;

    /// Write a (partial) model to `path`; file saves must carry content
    ///
    /// Emits [`ChangeEvent::Save`] on success.
    async fn save(&self, path: &str, model: &SaveModel) -> DriveResult<ContentModel>;

    /// Copy the entry at `source` into the directory `dest_dir`
    ///
    /// The server picks the final name; the returned model carries it.
    /// Emits [`ChangeEvent::New`] on success.
    async fn copy(&self, source: &str, dest_dir: &str) -> DriveResult<ContentModel>;

    /// Create a checkpoint for `path`
    async fn create_checkpoint(&self, path: &str) -> DriveResult<CheckpointModel>;

    /// List checkpoints for `path`, in server order
    async fn list_checkpoints(&self, path: &str) -> DriveResult<Vec<CheckpointModel>>;

    /// Restore `path` to a previously created checkpoint
    async fn restore_checkpoint(&self, path: &str, checkpoint_id: &str) -> DriveResult<()>;

    /// Discard a checkpoint
    async fn delete_checkpoint(&self, path: &str, checkpoint_id: &str) -> DriveResult<()>;

    /// Absolute URL the entry at `path` can be downloaded from
    ///
    /// Builds the URL locally; no request is made.
    fn get_download_url(&self, path: &str) -> DriveResult<String>;

    /// Subscribe to this drive's change channel
    fn subscribe(&self, listener: Box<dyn Fn(&ChangeEvent) + Send + Sync>) -> ListenerId;

    /// Drop a previously registered listener
    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// Release the drive's notification channel. Idempotent; the drive is
    /// not usable afterwards.
    fn dispose(&self);

    fn is_disposed(&self) -> bool;
}
