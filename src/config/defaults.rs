//! Default configuration values
//!
//! The built-in document written when no settings file exists yet.

use super::ordered::OrderedMap;
use super::schema::{ConfigDocument, FieldSpec};

pub const INPUT_CSV: &str = "data/input.csv";
pub const OUTPUT_CSV: &str = "data/output.csv";
pub const MODEL_NAME: &str = "gpt-4o-mini";
pub const SEARCH_RESULTS: u32 = 10;
pub const SYSTEM_PROMPT: &str = "You are an expert researcher.";
pub const USER_PROMPT: &str = "# Instructions\n\nResearch the following entity...";

/// Get the default document
pub fn default_document() -> ConfigDocument {
    ConfigDocument::default()
}

/// Starter output schema: a classified industry plus a free-text rationale
pub fn default_structure() -> OrderedMap<FieldSpec> {
    let mut structure = OrderedMap::new();
    structure.insert(
        "industry",
        FieldSpec::new(
            "str",
            "What industry is this organisation or person associated with?",
        )
        .with_options([
            "Agriculture, Forestry and Fishing",
            "Manufacturing",
            "Other",
        ]),
    );
    structure.insert("explanation", FieldSpec::new("str", "A brief explanation"));
    structure
}
