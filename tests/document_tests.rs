//! Tests for document parsing and serialization

use augmenta_settings::config::{
    ConfigDocument, ConfigLoader, Example, FieldSpec, FieldType, FieldValue, ModelConfig,
    OrderedMap, PromptConfig, Provider, SearchConfig, SearchEngine, default_document,
};
use proptest::prelude::*;
use serde_yaml::Value;

// ============================================================================
// Generators
// ============================================================================

fn arb_text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ,.#]{0,16}"
}

fn arb_multiline() -> impl Strategy<Value = String> {
    "[A-Za-z#.,]{1,10}( [A-Za-z#.,]{1,10}){0,4}(\n[A-Za-z#.,]{1,10}){0,3}\n?"
}

fn arb_provider() -> impl Strategy<Value = Provider> {
    prop_oneof![
        Just(Provider::OpenAi),
        Just(Provider::Google),
        Just(Provider::Azure),
        Just(Provider::Anthropic),
    ]
}

fn arb_engine() -> impl Strategy<Value = SearchEngine> {
    prop_oneof![
        Just(SearchEngine::Google),
        Just(SearchEngine::Bing),
        Just(SearchEngine::DuckDuckGo),
        Just(SearchEngine::Brave),
    ]
}

fn arb_field_spec() -> impl Strategy<Value = FieldSpec> {
    let kind = prop_oneof![
        Just(FieldType::Str),
        Just(FieldType::Int),
        Just(FieldType::Float),
        Just(FieldType::Bool),
        Just(FieldType::List),
        Just(FieldType::Unrecognized("date".to_string())),
    ];
    let options = prop::option::of(prop::collection::vec("[A-Za-z][A-Za-z ,]{0,12}", 1..4));
    (kind, arb_text(), options).prop_map(|(kind, description, options)| {
        let spec = FieldSpec::new(kind.clone(), description);
        match options {
            Some(options) if kind == FieldType::Str => spec.with_options(options),
            _ => spec,
        }
    })
}

fn arb_scalar() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<bool>().prop_map(FieldValue::Bool),
        any::<i64>().prop_map(FieldValue::Int),
        (-1.0e9..1.0e9f64).prop_map(FieldValue::Float),
        arb_text().prop_map(FieldValue::Str),
        Just(FieldValue::Raw(Value::Null)),
        ((i64::MAX as u64 + 1)..=u64::MAX)
            .prop_map(|n| FieldValue::Raw(Value::Number(n.into()))),
    ]
}

fn arb_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        4 => arb_scalar(),
        1 => prop::collection::vec(arb_scalar(), 0..4).prop_map(FieldValue::List),
    ]
}

fn arb_example() -> impl Strategy<Value = Example> {
    let output = prop::collection::vec(("[a-z]{1,8}", arb_field_value()), 0..5);
    (arb_text(), output).prop_map(|(input, output)| {
        Example::new(input, output.into_iter().collect::<OrderedMap<FieldValue>>())
    })
}

fn arb_document() -> impl Strategy<Value = ConfigDocument> {
    let paths = (arb_text(), arb_text());
    let model = (arb_provider(), arb_text()).prop_map(|(provider, name)| ModelConfig {
        provider,
        name,
    });
    let search = (arb_engine(), 1..=100u32)
        .prop_map(|(engine, results)| SearchConfig { engine, results });
    let prompt = (arb_multiline(), arb_multiline())
        .prop_map(|(system, user)| PromptConfig { system, user });
    let structure = prop::collection::vec(("[a-z][a-z_]{0,10}", arb_field_spec()), 0..5);
    let examples = prop::collection::vec(arb_example(), 0..4);
    let extra = prop::collection::vec(("x_[a-z]{1,6}", arb_text()), 0..3);

    (
        paths,
        model,
        search,
        prompt,
        structure,
        examples,
        any::<bool>(),
        extra,
    )
        .prop_map(
            |((input_csv, output_csv), model, search, prompt, structure, examples, logfire, extra)| {
                ConfigDocument {
                    input_csv,
                    output_csv,
                    model,
                    search,
                    prompt,
                    structure: structure.into_iter().collect(),
                    examples,
                    logfire,
                    extra: extra
                        .into_iter()
                        .map(|(key, value)| (Value::from(key), Value::from(value)))
                        .collect(),
                }
            },
        )
}

proptest! {
    #[test]
    fn prop_serialize_then_parse_is_identity(doc in arb_document()) {
        let yaml = ConfigLoader::to_yaml(&doc).unwrap();
        let parsed = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();
        prop_assert_eq!(&parsed, &doc, "{}", yaml);

        // Serializing again is stable
        prop_assert_eq!(ConfigLoader::to_yaml(&parsed).unwrap(), yaml);
    }
}

fn rich_document() -> ConfigDocument {
    let mut doc = default_document();
    doc.model.provider = Provider::Anthropic;
    doc.model.name = "claude-sonnet".to_string();
    doc.search.engine = SearchEngine::Brave;
    doc.search.results = 100;
    doc.prompt.user = "# Instructions\n\nFind the sector.\n".to_string();
    doc.logfire = true;

    doc.structure
        .insert("employees", FieldSpec::new("int", "Headcount"));
    doc.structure
        .insert("revenue", FieldSpec::new("float", "Revenue in GBP"));
    doc.structure
        .insert("public", FieldSpec::new("bool", "Publicly listed"));
    doc.structure
        .insert("brands", FieldSpec::new("list", "Notable brands"));

    let output: OrderedMap<FieldValue> = [
        ("industry", FieldValue::from("Manufacturing")),
        ("explanation", FieldValue::from("Makes things")),
        ("employees", FieldValue::Int(1200)),
        ("revenue", FieldValue::Float(2.5)),
        ("public", FieldValue::Bool(false)),
        (
            "brands",
            FieldValue::List(vec![FieldValue::from("Acme"), FieldValue::from("42")]),
        ),
        ("notes", FieldValue::Raw(Value::Null)),
    ]
    .into_iter()
    .collect();
    doc.examples.push(Example::new("ACME Ltd", output));
    doc.examples.push(Example::new("Nobody", OrderedMap::new()));

    doc.extra
        .insert(Value::from("owner"), Value::from("research-team"));
    doc
}

#[test]
fn test_round_trip_default_document() {
    let doc = default_document();
    let yaml = ConfigLoader::to_yaml(&doc).unwrap();
    let parsed = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn test_large_integers_written_back_exactly() {
    let yaml = "examples:\n  - input: ACME\n    output:\n      big: 18446744073709551615\n";
    let doc = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();
    let out = ConfigLoader::to_yaml(&doc).unwrap();
    assert!(out.contains("big: 18446744073709551615"), "{}", out);
    assert_eq!(ConfigLoader::parse(out.as_bytes()).unwrap().unwrap(), doc);
}

#[test]
fn test_numeric_looking_strings_stay_strings() {
    let doc = rich_document();
    let yaml = ConfigLoader::to_yaml(&doc).unwrap();
    let parsed = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();

    let brands = parsed.examples[0].output.get("brands").unwrap();
    assert_eq!(
        brands,
        &FieldValue::List(vec![FieldValue::from("Acme"), FieldValue::from("42")])
    );
}

#[test]
fn test_hand_written_document() {
    let yaml = r#"
input_csv: data/companies.csv
output_csv: data/companies_out.csv
model:
  provider: google
  name: gemini-1.5-pro
search:
  engine: bing
  results: 5
prompt:
  system: You are careful.
  user: Classify this.
structure:
  sector:
    type: str
    description: Sector
    options:
      - Public
      - Private
  founded:
    type: int
    description: Year founded
examples:
  - input: BBC
    output:
      sector: Public
      founded: 1922
logfire: true
"#;
    let doc = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();

    assert_eq!(doc.model.provider, Provider::Google);
    assert_eq!(doc.search.engine, SearchEngine::Bing);
    assert_eq!(doc.search.results, 5);
    assert_eq!(doc.structure.keys().collect::<Vec<_>>(), vec!["sector", "founded"]);
    assert_eq!(
        doc.structure.get("sector").unwrap().options,
        Some(vec!["Public".to_string(), "Private".to_string()])
    );
    assert_eq!(
        doc.examples[0].output.get("founded"),
        Some(&FieldValue::Int(1922))
    );
    assert!(doc.logfire);
    assert!(doc.orphaned_outputs().is_empty());
}

#[test]
fn test_unrecognized_field_type_is_tolerated() {
    let yaml = "structure:\n  when:\n    type: date\n    description: Founding date\n";
    let doc = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();

    let spec = doc.structure.get("when").unwrap();
    assert_eq!(spec.kind, FieldType::Unrecognized("date".to_string()));

    let out = ConfigLoader::to_yaml(&doc).unwrap();
    assert!(out.contains("type: date"));
}

#[test]
fn test_missing_field_type_defaults_to_str() {
    let yaml = "structure:\n  note:\n    description: Free text\n";
    let doc = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();
    assert_eq!(doc.structure.get("note").unwrap().kind, FieldType::Str);
}

#[test]
fn test_empty_structure_and_examples() {
    let yaml = "structure: {}\nexamples: []\n";
    let doc = ConfigLoader::parse(yaml.as_bytes()).unwrap().unwrap();
    assert!(doc.structure.is_empty());
    assert!(doc.examples.is_empty());

    let out = ConfigLoader::to_yaml(&doc).unwrap();
    assert!(out.contains("structure: {}"));
    assert!(out.contains("examples: []"));
}

#[test]
fn test_options_omitted_when_absent() {
    let yaml = ConfigLoader::to_yaml(&default_document()).unwrap();
    // Only `industry` declares options
    assert_eq!(yaml.matches("options:").count(), 1);
}
