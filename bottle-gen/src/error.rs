//! # Error Module
//!
//! Defines the error type shared by every stage of the generation pipeline:
//! configuration finalization, schema reading, field derivation and rendering.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout Bottle Gen.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by Bottle Gen.
///
/// `Path`, `Validation` and `Option` abort a generation run before anything is
/// handed to a renderer. The remaining variants wrap failures coming from the
/// external collaborators (database, serializer, output stream).
#[derive(Debug, Error)]
pub enum Error {
    /// The configured output path cannot be made absolute.
    #[error("outpath is invalid: {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An explicitly supplied field or model name is not a valid identifier.
    #[error("invalid name {name:?}: {reason}")]
    Validation { name: String, reason: &'static str },

    /// A filter, modify or create option failed while being applied.
    #[error("field option {option} failed: {message}")]
    Option { option: String, message: String },

    /// The schema reader could not talk to the database.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The renderer failed to serialize a model.
    #[error("render error: {0}")]
    Render(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds an [`Error::Option`] for the option named `option`.
    pub fn option(option: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Error::Option { option: option.into(), message: message.to_string() }
    }

    pub(crate) fn validation(name: impl Into<String>, reason: &'static str) -> Self {
        Error::Validation { name: name.into(), reason }
    }
}
