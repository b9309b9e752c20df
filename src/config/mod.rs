//! Settings system for Augmenta
//!
//! This module owns the `augmenta.yaml` document model: schema and defaults,
//! the shared YAML parser/serializer, and the [`ConfigStore`] through which
//! every edit is validated and persisted.

mod defaults;
pub mod error;
pub mod loader;
pub mod ordered;
pub mod paths;
pub mod schema;
pub mod store;
pub mod value;

pub use defaults::default_document;
pub use error::{
    CoercionError, ExampleError, FieldError, ImportError, LoadError, ParseError, SaveError,
    UpdateError,
};
pub use loader::ConfigLoader;
pub use ordered::OrderedMap;
pub use schema::{
    ConfigDocument, Example, FieldSpec, ModelConfig, PromptConfig, Provider, SearchConfig,
    SearchEngine,
};
pub use store::{ConfigStore, LoadOrigin, LoadOutcome};
pub use value::{FieldType, FieldValue};

use serde_yaml::{Mapping, Value};

/// Split a dotted key (`model.provider`) into path segments
pub fn split_key(key: &str) -> Vec<String> {
    key.split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

/// Get a value by dotted path from a document
pub fn get_value<S: AsRef<str>>(
    document: &ConfigDocument,
    path: &[S],
) -> Result<Option<Value>, SaveError> {
    let mut current = serde_yaml::to_value(document)?;
    for segment in path {
        current = match current {
            Value::Mapping(mut map) => match map.remove(segment.as_ref()) {
                Some(next) => next,
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
    }
    Ok(Some(current))
}

/// Set a value by path inside a YAML tree, creating missing mappings
pub fn set_value<S: AsRef<str>>(
    tree: &mut Value,
    path: &[S],
    value: Value,
) -> Result<(), UpdateError> {
    let Some((last, parents)) = path.split_last() else {
        return Err(UpdateError::EmptyPath);
    };

    let mut current = tree;
    for (depth, segment) in parents.iter().enumerate() {
        let map = as_mapping(current, &path[..depth])?;
        let key = Value::String(segment.as_ref().to_string());
        if !map.contains_key(&key) {
            map.insert(key.clone(), Value::Mapping(Mapping::new()));
        }
        current = map
            .get_mut(&key)
            .ok_or_else(|| UpdateError::NotAMapping(join_path(&path[..=depth])))?;
    }

    let map = as_mapping(current, parents)?;
    map.insert(Value::String(last.as_ref().to_string()), value);
    Ok(())
}

fn as_mapping<'a, S: AsRef<str>>(
    value: &'a mut Value,
    path: &[S],
) -> Result<&'a mut Mapping, UpdateError> {
    // `key:` with nothing after it reads as null; treat it as empty
    if value.is_null() {
        *value = Value::Mapping(Mapping::new());
    }
    match value {
        Value::Mapping(map) => Ok(map),
        _ => Err(UpdateError::NotAMapping(join_path(path))),
    }
}
