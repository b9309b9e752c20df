//! Error types for settings operations
//!
//! Every failing store operation leaves the in-memory document exactly as it
//! was before the call.

use std::path::PathBuf;

/// Raw settings text could not be turned into a document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid settings document: {0}")]
    Invalid(String),
}

/// Reading the persisted file failed; the caller falls back to defaults
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read settings file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Failed to create default settings file {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: SaveError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Cannot save invalid document: {0}")]
    InvalidDocument(String),

    #[error("Failed to serialize settings to YAML: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Failed to write settings file {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {} is empty after writing", .path.display())]
    Verification { path: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Update path cannot be empty")]
    EmptyPath,

    #[error("Cannot descend into `{0}`: it is not a mapping")]
    NotAMapping(String),

    #[error("Value does not fit the settings document: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Output-schema mutation errors
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    #[error("Field already exists: {0}")]
    DuplicateField(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid field spec: {0}")]
    InvalidFieldSpec(String),

    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExampleError {
    #[error("Example input cannot be empty")]
    EmptyInput,

    #[error("Example index {index} out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Example output `{field}`: {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// A value could not be converted to the type its field declares
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    #[error("cannot convert {found} to {expected}")]
    Mismatch {
        expected: &'static str,
        found: String,
    },

    #[error("`{value}` is not one of the allowed options: {}", .options.join(", "))]
    NotAnOption { value: String, options: Vec<String> },
}
