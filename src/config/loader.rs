//! Settings parsing, serialization and file I/O
//!
//! The persisted file, raw imports and exports all go through the same
//! parser and serializer so a document survives any round trip unchanged.

use super::error::{LoadError, ParseError, SaveError};
use super::paths;
use super::schema::ConfigDocument;
use serde_yaml::Value;
use std::io::Write;
use std::path::Path;

/// Settings loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Parse raw settings text
    ///
    /// Returns `Ok(None)` for an empty or null document.
    pub fn parse(raw: &[u8]) -> Result<Option<ConfigDocument>, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        let value: Value = serde_yaml::from_slice(raw)?;
        match value {
            Value::Null => return Ok(None),
            Value::Mapping(_) => {}
            other => {
                return Err(ParseError::Invalid(format!(
                    "top level must be a mapping, found {}",
                    value_kind(&other)
                )));
            }
        }

        // Second pass against the typed schema keeps line numbers in errors
        let document: ConfigDocument = serde_yaml::from_slice(raw)?;
        document.validate().map_err(ParseError::Invalid)?;
        Ok(Some(document))
    }

    /// Serialize a document to the on-disk YAML form
    pub fn to_yaml(document: &ConfigDocument) -> Result<String, SaveError> {
        Ok(serde_yaml::to_string(document)?)
    }

    /// Read and parse a settings file
    ///
    /// Returns `Ok(None)` when the file is empty or holds only `null`.
    pub fn read_file(path: &Path) -> Result<Option<ConfigDocument>, LoadError> {
        let contents = std::fs::read(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write a document to `path`, returning the number of bytes on disk
    ///
    /// The YAML is written to a temporary file in the target directory and
    /// renamed over the destination, then read back to confirm it is not
    /// empty.
    pub fn write_file(document: &ConfigDocument, path: &Path) -> Result<usize, SaveError> {
        let yaml = Self::to_yaml(document)?;
        let persistence = |source: std::io::Error| SaveError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let dir = paths::parent_dir(path);
        paths::ensure_dir(dir).map_err(persistence)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".augmenta-")
            .suffix(".yaml.tmp")
            .tempfile_in(dir)
            .map_err(persistence)?;
        tmp.write_all(yaml.as_bytes()).map_err(persistence)?;
        tmp.as_file().sync_all().map_err(persistence)?;
        tmp.persist(path).map_err(|err| persistence(err.error))?;

        let written = std::fs::read(path).map_err(persistence)?;
        if written.is_empty() {
            return Err(SaveError::Verification {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!("Wrote {} bytes to {}", written.len(), path.display());
        Ok(written.len())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
