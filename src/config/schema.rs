//! Settings document schema
//!
//! Defines the structure of `augmenta.yaml` using serde for serialization.
//! Field declaration order here is the key order written to disk.

use super::defaults;
use super::error::CoercionError;
use super::ordered::OrderedMap;
use super::value::{FieldType, FieldValue};
use serde::{Deserialize, Deserializer, Serialize};

/// Smallest accepted `search.results`
pub const MIN_SEARCH_RESULTS: u32 = 1;
/// Largest accepted `search.results`
pub const MAX_SEARCH_RESULTS: u32 = 100;

/// Root settings document
///
/// Every top-level key is optional in the file; absent keys take the
/// built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigDocument {
    /// Path of the CSV with entities to research
    pub input_csv: String,

    /// Path the augmented CSV is written to
    pub output_csv: String,

    pub model: ModelConfig,

    pub search: SearchConfig,

    /// Prompt templates (a bare string is read as the user prompt)
    #[serde(deserialize_with = "deserialize_prompt")]
    pub prompt: PromptConfig,

    /// Output schema: field name to declaration, in file order
    pub structure: OrderedMap<FieldSpec>,

    /// Few-shot examples
    pub examples: Vec<Example>,

    /// Telemetry toggle
    pub logfire: bool,

    /// Top-level keys this editor does not know about, kept verbatim
    #[serde(flatten)]
    pub extra: serde_yaml::Mapping,
}

/// Model selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: Provider,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Google,
    Azure,
    Anthropic,
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub engine: SearchEngine,

    /// Number of results to fetch per query (1..=100)
    pub results: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchEngine {
    #[default]
    Google,
    Bing,
    DuckDuckGo,
    Brave,
}

/// Prompt templates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    pub system: String,
    pub user: String,
}

/// Declaration of one output-schema field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldSpec {
    #[serde(rename = "type", default)]
    pub kind: FieldType,

    #[serde(default)]
    pub description: String,

    /// Allowed values, only meaningful for `str` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Sample input with its expected structured output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Example {
    #[serde(default)]
    pub input: String,

    #[serde(default)]
    pub output: OrderedMap<FieldValue>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PromptRepr {
    Empty,
    Legacy(String),
    Structured(PromptConfig),
}

fn deserialize_prompt<'de, D>(deserializer: D) -> Result<PromptConfig, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PromptRepr::deserialize(deserializer)? {
        PromptRepr::Empty => PromptConfig::default(),
        PromptRepr::Legacy(user) => PromptConfig {
            system: String::new(),
            user,
        },
        PromptRepr::Structured(prompt) => prompt,
    })
}

impl ConfigDocument {
    /// Check the constraints serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        let results = self.search.results;
        if !(MIN_SEARCH_RESULTS..=MAX_SEARCH_RESULTS).contains(&results) {
            return Err(format!(
                "search.results must be between {} and {}, got {}",
                MIN_SEARCH_RESULTS, MAX_SEARCH_RESULTS, results
            ));
        }

        for (idx, example) in self.examples.iter().enumerate() {
            for (key, value) in example.output.iter() {
                if !is_finite(value) {
                    return Err(format!(
                        "example #{} output `{}` is not a finite number",
                        idx + 1,
                        key
                    ));
                }
            }
        }
        Ok(())
    }

    /// Example output keys that have no matching field in `structure`
    ///
    /// Returned as `(example index, key)` pairs in document order.
    pub fn orphaned_outputs(&self) -> Vec<(usize, String)> {
        let structure = &self.structure;
        self.examples
            .iter()
            .enumerate()
            .flat_map(move |(idx, example)| {
                example
                    .output
                    .keys()
                    .filter(move |key| !structure.contains_key(key))
                    .map(move |key| (idx, key.to_string()))
            })
            .collect()
    }
}

/// `Float` values written from code must survive a reload
fn is_finite(value: &FieldValue) -> bool {
    match value {
        FieldValue::Float(x) => x.is_finite(),
        FieldValue::List(items) => items.iter().all(is_finite),
        _ => true,
    }
}

impl FieldSpec {
    pub fn new(kind: impl Into<FieldType>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
            options: None,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Validate a spec entered through the editor
    ///
    /// Blank option lines are dropped first; an option list that ends up
    /// empty is an error, as is any option list on a non-`str` field.
    pub fn validated(mut self) -> Result<Self, String> {
        if !self.kind.is_recognized() {
            let known: Vec<String> = FieldType::KNOWN.iter().map(ToString::to_string).collect();
            return Err(format!(
                "unknown type `{}` (expected one of: {})",
                self.kind,
                known.join(", ")
            ));
        }

        if let Some(options) = self.options.take() {
            if self.kind != FieldType::Str {
                return Err(format!(
                    "options are only allowed on `str` fields, not `{}`",
                    self.kind
                ));
            }
            let options: Vec<String> = options
                .into_iter()
                .filter(|opt| !opt.trim().is_empty())
                .collect();
            if options.is_empty() {
                return Err("options must contain at least one non-blank value".to_string());
            }
            self.options = Some(options);
        }

        Ok(self)
    }

    /// Convert an example value to this field's declared type
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, CoercionError> {
        let value = self.kind.coerce(value)?;
        if let (FieldValue::Str(s), Some(options)) = (&value, &self.options) {
            if self.kind == FieldType::Str && !options.iter().any(|opt| opt == s) {
                return Err(CoercionError::NotAnOption {
                    value: s.clone(),
                    options: options.clone(),
                });
            }
        }
        Ok(value)
    }
}

impl Example {
    pub fn new(input: impl Into<String>, output: OrderedMap<FieldValue>) -> Self {
        Self {
            input: input.into(),
            output,
        }
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            input_csv: defaults::INPUT_CSV.to_string(),
            output_csv: defaults::OUTPUT_CSV.to_string(),
            model: ModelConfig::default(),
            search: SearchConfig::default(),
            prompt: PromptConfig::default(),
            structure: defaults::default_structure(),
            examples: Vec::new(),
            logfire: false,
            extra: serde_yaml::Mapping::new(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            name: defaults::MODEL_NAME.to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine: SearchEngine::default(),
            results: defaults::SEARCH_RESULTS,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system: defaults::SYSTEM_PROMPT.to_string(),
            user: defaults::USER_PROMPT.to_string(),
        }
    }
}
