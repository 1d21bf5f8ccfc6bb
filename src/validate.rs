//! Shape validation of server payloads
//!
//! The remote server is trusted for semantics but not for shape: every
//! payload passes through here before a typed model is handed to a caller.
//! Failures name the offending field so the surrounding layer can render a
//! useful message.

use serde_json::Value;
use thiserror::Error;

use crate::types::{CheckpointModel, ContentModel};

/// A payload that failed shape validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent from the payload
    #[error("{model} model is missing required field `{field}`")]
    MissingField {
        model: &'static str,
        field: &'static str,
    },

    /// A field was present but carried the wrong type
    #[error("{model} model field `{field}` is not {expected}")]
    InvalidField {
        model: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    /// The checkpoint-list body was not an array at the top level.
    /// Distinct from a per-item shape failure.
    #[error("checkpoint list response is not an array")]
    NotAnArray,
}

const CONTENT: &str = "content";
const CHECKPOINT: &str = "checkpoint";

/// Validate and type a content model payload
///
/// All eight fields must be present; `name`, `path`, `created` and
/// `last_modified` must be strings, `type` one of the known tags, and
/// `mimetype`/`format` string-or-null. `content` may be any JSON value
/// including null.
pub fn content_model(value: &Value) -> Result<ContentModel, ValidationError> {
    require_str(value, CONTENT, "name")?;
    require_str(value, CONTENT, "path")?;
    let kind = require_str(value, CONTENT, "type")?;
    if !matches!(kind, "file" | "directory" | "notebook") {
        return Err(ValidationError::InvalidField {
            model: CONTENT,
            field: "type",
            expected: "one of `file`, `directory`, `notebook`",
        });
    }
    require_str(value, CONTENT, "created")?;
    require_str(value, CONTENT, "last_modified")?;
    require_nullable_str(value, CONTENT, "mimetype")?;
    require_present(value, CONTENT, "content")?;
    require_nullable_str(value, CONTENT, "format")?;

    // Shape is known good at this point, so the typed decode cannot fail.
    serde_json::from_value(value.clone()).map_err(|_| ValidationError::InvalidField {
        model: CONTENT,
        field: "type",
        expected: "a content model",
    })
}

/// Validate and type a single checkpoint payload
pub fn checkpoint_model(value: &Value) -> Result<CheckpointModel, ValidationError> {
    let id = require_str(value, CHECKPOINT, "id")?;
    let last_modified = require_str(value, CHECKPOINT, "last_modified")?;
    Ok(CheckpointModel {
        id: id.to_string(),
        last_modified: last_modified.to_string(),
    })
}

/// Validate a checkpoint-list payload, preserving server order
pub fn checkpoint_list(value: &Value) -> Result<Vec<CheckpointModel>, ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotAnArray)?;
    items.iter().map(checkpoint_model).collect()
}

fn require_present<'a>(
    value: &'a Value,
    model: &'static str,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    value
        .get(field)
        .ok_or(ValidationError::MissingField { model, field })
}

fn require_str<'a>(
    value: &'a Value,
    model: &'static str,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    require_present(value, model, field)?
        .as_str()
        .ok_or(ValidationError::InvalidField {
            model,
            field,
            expected: "a string",
        })
}

fn require_nullable_str(
    value: &Value,
    model: &'static str,
    field: &'static str,
) -> Result<(), ValidationError> {
    let field_value = require_present(value, model, field)?;
    if field_value.is_string() || field_value.is_null() {
        Ok(())
    } else {
        Err(ValidationError::InvalidField {
            model,
            field,
            expected: "a string or null",
        })
    }
}
