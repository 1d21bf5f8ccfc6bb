//! Wire-level models for the remote contents API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Categorical tag the contents API attaches to every entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    File,
    Directory,
    Notebook,
}

impl ContentType {
    /// Wire spelling of the tag, as it appears in query strings and bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::File => "file",
            ContentType::Directory => "directory",
            ContentType::Notebook => "notebook",
        }
    }
}

/// Descriptor of a file or directory as returned by the remote server
///
/// Every `ContentModel` handed out by a drive has passed shape validation:
/// all eight fields were present in the payload and carried the expected
/// types. `content` is populated only when the caller asked for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentModel {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub created: String,
    pub last_modified: String,
    pub mimetype: Option<String>,
    pub content: Option<Value>,
    pub format: Option<String>,
}

impl ContentModel {
    pub fn is_dir(&self) -> bool {
        self.kind == ContentType::Directory
    }

    pub fn is_notebook(&self) -> bool {
        self.kind == ContentType::Notebook
    }
}

/// One server-retained restore point for a file path
///
/// Checkpoints have no address of their own; they are only reachable as a
/// `(path, id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointModel {
    pub id: String,
    pub last_modified: String,
}

/// Options for fetching a single path
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Expected entry type; forwarded as the `type` query parameter
    pub kind: Option<ContentType>,

    /// Whether the server should inline the entry's content.
    /// Serialized as the literal `"1"`/`"0"` the REST convention expects.
    pub content: Option<bool>,

    /// Serialization format (`"text"`, `"base64"`, `"json"`). Dropped
    /// before forwarding when `kind` is `Notebook`; the remote API rejects
    /// it for that type.
    pub format: Option<String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ContentType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_content(mut self, content: bool) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Options for creating a new untitled entry in a directory
#[derive(Debug, Clone, Serialize)]
pub struct CreateOptions {
    /// Directory the entry is created in
    pub path: String,

    /// File extension for the new entry. A non-empty extension lacking a
    /// leading `.` gets one prepended before the request is sent; case is
    /// preserved as given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentType>,
}

impl CreateOptions {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ext: None,
            kind: None,
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_kind(mut self, kind: ContentType) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Partial model sent as the body of a save
///
/// Only the populated fields are serialized; the server fills in the rest
/// and returns the full model. File saves must include `content`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl SaveModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain-text file body
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentType::File),
            format: Some("text".to_string()),
            content: Some(Value::String(text.into())),
            ..Self::default()
        }
    }

    pub fn with_kind(mut self, kind: ContentType) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }
}
