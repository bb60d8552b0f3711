use std::path::PathBuf;

use thiserror::Error;

use crate::tags::TagValidationError;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error(
        "Could not compute required fields for this template; please check the formatting of \"qfmt\": {qfmt}"
    )]
    NoRequiredFields { qfmt: String },

    #[error("Template error: {0}")]
    Template(#[from] mustache::Error),

    #[error("Expected model type 0 (standard) or 1 (cloze), found {0}")]
    UnknownModelType(i64),

    #[error("Model '{model}' has no id")]
    MissingModelId { model: String },

    #[error("The current GUID method needs a model id")]
    GuidWithoutModelId,

    #[error("Note has no model")]
    NoModel,

    #[error("Unknown built-in model: {0}")]
    UnknownBuiltinModel(String),

    #[error("Note references unknown model id {0}")]
    UnknownModelRef(i64),

    #[error("Number of fields in Model ({expected}) does not match number of fields in Note ({found})")]
    FieldCountMismatch { expected: usize, found: usize },

    #[error("Deck has no id")]
    MissingDeckId,

    #[error("Deck has no name")]
    MissingDeckName,

    #[error("Build timestamp must be a finite number of seconds between 0 and {max}, got {value}")]
    InvalidTimestamp { value: f64, max: f64 },

    #[error("Media file not found: {0}")]
    MediaNotFound(PathBuf),

    #[error("Invalid tag: {0}")]
    InvalidTag(#[from] TagValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DeckError>;
