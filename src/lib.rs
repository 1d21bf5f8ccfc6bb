/*!
 * Tether - remote contents drive
 *
 * Mounts a second, independently addressed Jupyter-style server as a
 * browsable drive by proxying file operations over HTTP to its contents
 * REST API:
 * - Async drive contract (list/get, create, delete, rename, save, copy)
 * - Checkpoint lifecycle (create, list, restore, delete)
 * - Field-level shape validation of every server payload
 * - Change-event broadcast for mutating operations
 * - Runtime-swappable connection settings (server URL, token)
 */

pub mod drive;
pub mod error;
pub mod events;
pub mod registry;
pub mod remote;
pub mod settings;
pub mod types;
pub mod uri;
pub mod validate;

// Re-export commonly used types
pub use drive::Drive;
pub use error::{DriveError, DriveResult};
pub use events::{ChangeEvent, ChangeListeners, ListenerId};
pub use registry::DriveRegistry;
pub use remote::RemoteDrive;
pub use settings::{ConnectionSettings, DEFAULT_API_ENDPOINT};
pub use types::{
    CheckpointModel, ContentModel, ContentType, CreateOptions, FetchOptions, SaveModel,
};
pub use validate::ValidationError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
