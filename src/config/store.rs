//! The settings store
//!
//! `ConfigStore` owns the one authoritative document for a session. Every
//! mutation builds a candidate copy, persists it, and only then swaps it in,
//! so a failed call never leaves the in-memory document half-edited.
//!
//! There is no locking: methods take `&mut self`, and two stores pointed at
//! the same file race with last-writer-wins semantics.

use super::error::{
    ExampleError, FieldError, ImportError, LoadError, SaveError, UpdateError,
};
use super::loader::ConfigLoader;
use super::ordered::OrderedMap;
use super::schema::{ConfigDocument, Example, FieldSpec};
use super::value::FieldValue;
use std::path::{Path, PathBuf};

/// Where the document returned by [`ConfigStore::load`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// Parsed from the settings file
    File,
    /// The file did not exist; defaults were written to it
    CreatedDefault,
    /// The file was empty, unreadable or could not be created; defaults
    /// were used and nothing was written
    Default,
}

/// Result of loading the settings file
#[derive(Debug)]
pub struct LoadOutcome {
    pub document: ConfigDocument,
    pub origin: LoadOrigin,
    /// Set when the file could not be read, parsed or created
    pub warning: Option<LoadError>,
}

/// Owner of the settings document for one session
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    document: ConfigDocument,
}

impl ConfigStore {
    /// Create a store for `path` holding the default document
    ///
    /// Nothing is read until [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: ConfigDocument::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current in-memory document
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// Load the settings file, falling back to defaults
    ///
    /// A missing file is created with the default document. A file that is
    /// empty, unreadable or malformed yields the defaults and is left as is.
    pub fn load(&mut self) -> LoadOutcome {
        if !self.path.exists() {
            let document = ConfigDocument::default();
            let warning = match ConfigLoader::write_file(&document, &self.path) {
                Ok(bytes) => {
                    tracing::info!(
                        "Created default settings file {} ({} bytes)",
                        self.path.display(),
                        bytes
                    );
                    None
                }
                Err(source) => {
                    let err = LoadError::Create {
                        path: self.path.clone(),
                        source,
                    };
                    tracing::warn!("{}", err);
                    Some(err)
                }
            };
            let origin = match warning {
                None => LoadOrigin::CreatedDefault,
                Some(_) => LoadOrigin::Default,
            };
            self.document = document.clone();
            return LoadOutcome {
                document,
                origin,
                warning,
            };
        }

        let (document, origin, warning) = match ConfigLoader::read_file(&self.path) {
            Ok(Some(document)) => {
                tracing::debug!("Loaded settings from {}", self.path.display());
                (document, LoadOrigin::File, None)
            }
            Ok(None) => {
                tracing::debug!(
                    "Settings file {} is empty, using defaults",
                    self.path.display()
                );
                (ConfigDocument::default(), LoadOrigin::Default, None)
            }
            Err(err) => {
                tracing::warn!("Error loading settings: {}", err);
                (ConfigDocument::default(), LoadOrigin::Default, Some(err))
            }
        };

        self.document = document.clone();
        LoadOutcome {
            document,
            origin,
            warning,
        }
    }

    /// Persist `document` and make it the current document
    ///
    /// Returns the size of the written file. On error the current document
    /// is unchanged.
    pub fn save(&mut self, document: ConfigDocument) -> Result<usize, SaveError> {
        document.validate().map_err(SaveError::InvalidDocument)?;
        let bytes = ConfigLoader::write_file(&document, &self.path)?;
        self.document = document;
        Ok(bytes)
    }

    /// Write one value at a dotted path and save
    ///
    /// Intermediate mappings are created as needed. The edited document must
    /// still fit the schema, e.g. `model.provider` must stay a known provider.
    pub fn update<S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: serde_yaml::Value,
    ) -> Result<(), UpdateError> {
        let mut tree = serde_yaml::to_value(&self.document).map_err(SaveError::Serialize)?;
        super::set_value(&mut tree, path, value)?;

        let candidate: ConfigDocument = serde_yaml::from_value(tree)
            .map_err(|err| UpdateError::InvalidValue(err.to_string()))?;
        self.save(candidate)?;

        tracing::debug!("Updated {}", super::join_path(path));
        Ok(())
    }

    /// Replace the whole document with parsed raw YAML and save
    ///
    /// A parse failure leaves the current document untouched. An empty or
    /// null document is refused without writing anything.
    pub fn import(&mut self, raw: &[u8]) -> Result<ConfigDocument, ImportError> {
        let document = ConfigLoader::parse(raw)?.ok_or_else(|| {
            SaveError::InvalidDocument("imported document is empty".to_string())
        })?;
        self.save(document.clone())?;
        tracing::info!("Imported settings into {}", self.path.display());
        Ok(document)
    }

    /// Serialize the current document exactly as `save` would write it
    pub fn export(&self) -> Result<Vec<u8>, SaveError> {
        ConfigLoader::to_yaml(&self.document).map(String::into_bytes)
    }

    /// Add a field to the output schema
    pub fn add_field(&mut self, name: &str, spec: FieldSpec) -> Result<(), FieldError> {
        if name.trim().is_empty() {
            return Err(FieldError::InvalidFieldSpec(
                "field name cannot be blank".to_string(),
            ));
        }
        if self.document.structure.contains_key(name) {
            return Err(FieldError::DuplicateField(name.to_string()));
        }
        let spec = spec.validated().map_err(FieldError::InvalidFieldSpec)?;

        let mut candidate = self.document.clone();
        candidate.structure.insert(name, spec);
        self.save(candidate)?;

        tracing::info!("Added field '{}'", name);
        Ok(())
    }

    /// Remove a field from the output schema
    ///
    /// Example outputs that reference the field keep their stale entries;
    /// see [`orphaned_outputs`](Self::orphaned_outputs) and
    /// [`prune_orphaned_outputs`](Self::prune_orphaned_outputs).
    pub fn remove_field(&mut self, name: &str) -> Result<(), FieldError> {
        if !self.document.structure.contains_key(name) {
            return Err(FieldError::UnknownField(name.to_string()));
        }

        let mut candidate = self.document.clone();
        candidate.structure.remove(name);
        self.save(candidate)?;

        let stale = self
            .document
            .orphaned_outputs()
            .iter()
            .filter(|(_, key)| key == name)
            .count();
        tracing::info!(
            "Removed field '{}' ({} example outputs still reference it)",
            name,
            stale
        );
        Ok(())
    }

    /// Change the description of an existing field
    pub fn set_field_description(
        &mut self,
        name: &str,
        description: impl Into<String>,
    ) -> Result<(), FieldError> {
        let description = description.into();
        self.edit_field(name, move |spec| {
            spec.description = description;
        })
    }

    /// Replace (or with `None`, drop) the option list of an existing field
    pub fn set_field_options(
        &mut self,
        name: &str,
        options: Option<Vec<String>>,
    ) -> Result<(), FieldError> {
        self.edit_field(name, move |spec| {
            spec.options = options;
        })
    }

    fn edit_field(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut FieldSpec),
    ) -> Result<(), FieldError> {
        let mut spec = self
            .document
            .structure
            .get(name)
            .cloned()
            .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
        edit(&mut spec);

        // Fields loaded with an unrecognized type can still be re-described
        if spec.kind.is_recognized() {
            spec = spec.validated().map_err(FieldError::InvalidFieldSpec)?;
        } else if spec.options.is_some() {
            return Err(FieldError::InvalidFieldSpec(format!(
                "options are only allowed on `str` fields, not `{}`",
                spec.kind
            )));
        }

        let mut candidate = self.document.clone();
        candidate.structure.insert(name, spec);
        self.save(candidate)?;
        Ok(())
    }

    /// Append an example
    ///
    /// Output values for declared fields are coerced to the declared type;
    /// keys not in the schema are kept as given.
    pub fn add_example(
        &mut self,
        input: &str,
        output: OrderedMap<FieldValue>,
    ) -> Result<(), ExampleError> {
        let example = self.build_example(input, output)?;

        let mut candidate = self.document.clone();
        candidate.examples.push(example);
        self.save(candidate)?;

        tracing::info!("Added example #{}", self.document.examples.len());
        Ok(())
    }

    /// Replace the example at `index`, with the same rules as `add_example`
    pub fn update_example(
        &mut self,
        index: usize,
        input: &str,
        output: OrderedMap<FieldValue>,
    ) -> Result<(), ExampleError> {
        self.check_index(index)?;
        let example = self.build_example(input, output)?;

        let mut candidate = self.document.clone();
        candidate.examples[index] = example;
        self.save(candidate)?;
        Ok(())
    }

    /// Remove the example at `index`
    ///
    /// Later examples shift down by one, so callers must re-read the list
    /// before removing another by index.
    pub fn remove_example(&mut self, index: usize) -> Result<(), ExampleError> {
        self.check_index(index)?;

        let mut candidate = self.document.clone();
        candidate.examples.remove(index);
        self.save(candidate)?;

        tracing::info!("Removed example #{}", index + 1);
        Ok(())
    }

    /// Example output keys with no matching schema field
    pub fn orphaned_outputs(&self) -> Vec<(usize, String)> {
        self.document.orphaned_outputs()
    }

    /// Drop every example output key with no matching schema field
    ///
    /// Returns how many entries were removed; nothing is written when there
    /// is nothing to remove.
    pub fn prune_orphaned_outputs(&mut self) -> Result<usize, ExampleError> {
        let orphaned = self.orphaned_outputs().len();
        if orphaned == 0 {
            return Ok(0);
        }

        let mut candidate = self.document.clone();
        let structure = candidate.structure.clone();
        for example in &mut candidate.examples {
            example.output.retain(|key, _| structure.contains_key(key));
        }
        self.save(candidate)?;

        tracing::info!("Pruned {} orphaned example outputs", orphaned);
        Ok(orphaned)
    }

    fn check_index(&self, index: usize) -> Result<(), ExampleError> {
        let len = self.document.examples.len();
        if index >= len {
            return Err(ExampleError::IndexOutOfRange { index, len });
        }
        Ok(())
    }

    fn build_example(
        &self,
        input: &str,
        output: OrderedMap<FieldValue>,
    ) -> Result<Example, ExampleError> {
        if input.trim().is_empty() {
            return Err(ExampleError::EmptyInput);
        }

        let mut coerced = OrderedMap::new();
        for (field, value) in output {
            let value = match self.document.structure.get(&field) {
                Some(spec) => spec
                    .coerce(value)
                    .map_err(|source| ExampleError::Coercion {
                        field: field.clone(),
                        source,
                    })?,
                None => value,
            };
            coerced.insert(field, value);
        }

        Ok(Example::new(input, coerced))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        let mut store = ConfigStore::new(dir.path().join("augmenta.yaml"));
        store.load();
        store
    }

    #[test]
    fn test_new_store_holds_defaults() {
        let store = ConfigStore::new("unused.yaml");
        assert_eq!(store.document(), &ConfigDocument::default());
        assert_eq!(store.path(), Path::new("unused.yaml"));
    }

    #[test]
    fn test_failed_create_reports_default_origin() {
        let dir = tempfile::tempdir().unwrap();
        // A plain file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let mut store = ConfigStore::new(blocker.join("augmenta.yaml"));

        let outcome = store.load();

        assert!(matches!(outcome.warning, Some(LoadError::Create { .. })));
        assert_eq!(outcome.origin, LoadOrigin::Default);
        assert_eq!(outcome.document, ConfigDocument::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_rejects_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let before = std::fs::read(store.path()).unwrap();

        let mut doc = store.document().clone();
        doc.search.results = 0;
        let err = store.save(doc).unwrap_err();

        assert!(matches!(err, SaveError::InvalidDocument(_)));
        assert_eq!(store.document().search.results, 10);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_save_failure_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes the rename fail
        let path = dir.path().join("augmenta.yaml");
        std::fs::create_dir(&path).unwrap();
        let mut store = ConfigStore::new(&path);

        let mut doc = ConfigDocument::default();
        doc.logfire = true;
        let err = store.save(doc).unwrap_err();

        assert!(matches!(err, SaveError::Persistence { .. }));
        assert!(!store.document().logfire);
    }

    #[test]
    fn test_update_rejects_scalar_parent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store
            .update(&["input_csv", "nested"], "x".into())
            .unwrap_err();
        assert!(matches!(err, UpdateError::NotAMapping(_)));
    }

    #[test]
    fn test_update_rejects_values_outside_schema() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store
            .update(&["model", "provider"], "mistral".into())
            .unwrap_err();
        assert!(matches!(err, UpdateError::InvalidValue(_)));

        let err = store
            .update(&["search", "results"], 1000.into())
            .unwrap_err();
        assert!(matches!(
            err,
            UpdateError::Save(SaveError::InvalidDocument(_))
        ));
        assert_eq!(store.document(), &ConfigDocument::default());
    }

    #[test]
    fn test_edit_field_keeps_position() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store
            .set_field_description("industry", "Primary sector")
            .unwrap();
        store.set_field_options("industry", None).unwrap();

        let structure = &store.document().structure;
        assert_eq!(
            structure.keys().collect::<Vec<_>>(),
            vec!["industry", "explanation"]
        );
        assert_eq!(structure.get("industry").unwrap().description, "Primary sector");
        assert!(structure.get("industry").unwrap().options.is_none());
    }

    #[test]
    fn test_edit_field_validates_options() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store
            .set_field_options("explanation", Some(vec![" ".to_string()]))
            .unwrap_err();
        assert!(matches!(err, FieldError::InvalidFieldSpec(_)));

        let err = store.set_field_description("missing", "x").unwrap_err();
        assert!(matches!(err, FieldError::UnknownField(_)));
    }

    #[test]
    fn test_update_example() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add_example("ACME", OrderedMap::new()).unwrap();

        let output: OrderedMap<FieldValue> =
            [("industry", FieldValue::from("Manufacturing"))].into_iter().collect();
        store.update_example(0, "ACME Corp", output).unwrap();

        let example = &store.document().examples[0];
        assert_eq!(example.input, "ACME Corp");
        assert_eq!(
            example.output.get("industry"),
            Some(&FieldValue::from("Manufacturing"))
        );

        let err = store
            .update_example(1, "x", OrderedMap::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ExampleError::IndexOutOfRange { index: 1, len: 1 }
        ));
    }

    #[test]
    fn test_prune_without_orphans_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        assert_eq!(store.prune_orphaned_outputs().unwrap(), 0);
    }
}
