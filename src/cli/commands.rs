//! CLI command handlers

use anyhow::{Context, Result};
use augmenta_settings::config::{
    self, ConfigStore, FieldSpec, FieldValue, LoadError, LoadOrigin, LoadOutcome, OrderedMap,
    paths,
};
use clap::{Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;

/// Main commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the whole configuration
    Show {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "model.provider", "search.results")
        key: String,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "model.provider", "search.results")
        key: String,
        /// Value, parsed as YAML ("10", "true", "anthropic")
        value: String,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
    /// Replace the configuration with a YAML file
    Import {
        /// Path to a .yaml/.yml file
        file: PathBuf,
    },
    /// Write the configuration as YAML to a file or stdout
    Export {
        /// Destination .yaml/.yml file (stdout when omitted)
        file: Option<PathBuf>,
    },
    /// Manage output structure fields
    Field {
        #[command(subcommand)]
        subcommand: FieldSubcommand,
    },
    /// Manage few-shot examples
    Example {
        #[command(subcommand)]
        subcommand: ExampleSubcommand,
    },
    /// Save the configuration and hand off to the Augmenta run
    Run,
    /// Show version information
    Version,
}

impl Command {
    /// Whether the settings file has to be loaded before handling
    pub fn needs_document(&self) -> bool {
        !matches!(self, Command::Path | Command::Version)
    }

    /// Whether handling writes the in-memory document back to the file
    ///
    /// `import` is left out: it replaces the whole document and is the way
    /// to recover from a file that does not load.
    pub fn writes_document(&self) -> bool {
        match self {
            Command::Set { .. } | Command::Run => true,
            Command::Field { subcommand } => !matches!(subcommand, FieldSubcommand::List),
            Command::Example { subcommand } => !matches!(subcommand, ExampleSubcommand::List),
            _ => false,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// Output structure subcommands
#[derive(Subcommand, Debug)]
pub enum FieldSubcommand {
    /// List structure fields
    List,
    /// Add a structure field
    Add {
        /// Field name
        name: String,
        /// Field type: str, int, float, bool or list
        #[arg(long = "type", default_value = "str")]
        kind: String,
        /// Field description
        #[arg(long, default_value = "")]
        description: String,
        /// Allowed value (repeatable, str fields only)
        #[arg(long = "option")]
        options: Vec<String>,
    },
    /// Change a field's description
    Describe {
        /// Field name
        name: String,
        /// New description
        description: String,
    },
    /// Replace or clear a field's allowed values
    Options {
        /// Field name
        name: String,
        /// Allowed value (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
        /// Remove the option list
        #[arg(long, conflicts_with = "options")]
        clear: bool,
    },
    /// Remove a structure field
    Remove {
        /// Field name
        name: String,
    },
}

/// Example subcommands
#[derive(Subcommand, Debug)]
pub enum ExampleSubcommand {
    /// List examples
    List,
    /// Add an example
    Add {
        /// Example input
        input: String,
        /// Output value for a field (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    /// Remove an example by its number (as shown by `example list`)
    Remove {
        /// Example number, starting at 1
        number: usize,
    },
    /// Drop example outputs whose field no longer exists
    Prune,
}

/// Handle a command against a store that has been loaded when required
pub fn handle_command(store: &mut ConfigStore, outcome: &LoadOutcome, cmd: Command) -> Result<()> {
    // The store holds defaults after a failed load; saving them would
    // replace the user's file
    if cmd.writes_document() {
        if let Some(err @ (LoadError::Read { .. } | LoadError::Parse { .. })) = &outcome.warning {
            anyhow::bail!(
                "Refusing to modify {}: {}. Fix the file or replace it with `import`",
                store.path().display(),
                err
            );
        }
    }

    match cmd {
        Command::Show { format } => {
            let rendered = match format {
                OutputFormat::Yaml => String::from_utf8(store.export()?)
                    .context("Configuration is not valid UTF-8")?,
                OutputFormat::Json => serde_json::to_string_pretty(store.document())
                    .context("Failed to serialize configuration to JSON")?
                    + "\n",
            };
            print!("{}", rendered);
        }
        Command::Get { key } => {
            let path = config::split_key(&key);
            let value = config::get_value(store.document(), &path)?
                .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
            let yaml =
                serde_yaml::to_string(&value).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        Command::Set { key, value } => {
            let path = config::split_key(&key);
            store
                .update(&path, parse_yaml_value(&value))
                .with_context(|| format!("Failed to set {} = {}", key, value))?;
            println!("Configuration saved");
        }
        Command::Path => {
            println!("{}", store.path().display());
        }
        Command::Validate => {
            if let Some(err) = &outcome.warning {
                eprintln!("Configuration validation failed: {}", err);
                std::process::exit(1);
            }
            if outcome.origin == LoadOrigin::CreatedDefault {
                println!("Created default configuration at {}", store.path().display());
            }
            for (name, spec) in store.document().structure.iter() {
                if !spec.kind.is_recognized() {
                    println!("warning: field `{}` has unrecognized type `{}`", name, spec.kind);
                }
            }
            for (idx, key) in store.orphaned_outputs() {
                println!(
                    "warning: example #{} output `{}` has no matching structure field",
                    idx + 1,
                    key
                );
            }
            println!("Configuration is valid");
        }
        Command::Import { file } => {
            ensure_yaml_file(&file)?;
            let raw = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            store
                .import(&raw)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            println!("Configuration imported from {}", file.display());
        }
        Command::Export { file } => {
            let bytes = store.export().context("Failed to export configuration")?;
            match file {
                Some(file) => {
                    ensure_yaml_file(&file)?;
                    std::fs::write(&file, &bytes)
                        .with_context(|| format!("Failed to write {}", file.display()))?;
                    println!("Configuration exported to {}", file.display());
                }
                None => std::io::stdout()
                    .write_all(&bytes)
                    .context("Failed to write configuration to stdout")?,
            }
        }
        Command::Field { subcommand } => handle_field_command(store, subcommand)?,
        Command::Example { subcommand } => handle_example_command(store, subcommand)?,
        Command::Run => {
            store
                .save(store.document().clone())
                .context("Failed to save settings before running")?;
            tracing::info!("Settings persisted to {}", store.path().display());
            println!("Starting process with current configuration...");
        }
        Command::Version => super::display_version(),
    }

    Ok(())
}

fn handle_field_command(store: &mut ConfigStore, cmd: FieldSubcommand) -> Result<()> {
    match cmd {
        FieldSubcommand::List => {
            let structure = &store.document().structure;
            if structure.is_empty() {
                println!("No structure fields defined.");
            }
            for (name, spec) in structure.iter() {
                println!("{}: {}", name, spec.kind);
                if !spec.description.is_empty() {
                    println!("    {}", spec.description);
                }
                if let Some(options) = &spec.options {
                    println!("    Options: {}", options.join(" | "));
                }
            }
        }
        FieldSubcommand::Add {
            name,
            kind,
            description,
            options,
        } => {
            let mut spec = FieldSpec::new(kind, description);
            if !options.is_empty() {
                spec = spec.with_options(options);
            }
            store
                .add_field(&name, spec)
                .with_context(|| format!("Failed to add field '{}'", name))?;
            println!("Field '{}' added", name);
        }
        FieldSubcommand::Describe { name, description } => {
            store
                .set_field_description(&name, description)
                .with_context(|| format!("Failed to update field '{}'", name))?;
            println!("Field '{}' updated", name);
        }
        FieldSubcommand::Options {
            name,
            options,
            clear,
        } => {
            let options = if clear {
                None
            } else if options.is_empty() {
                anyhow::bail!("Pass at least one --option, or --clear to remove the list");
            } else {
                Some(options)
            };
            store
                .set_field_options(&name, options)
                .with_context(|| format!("Failed to update field '{}'", name))?;
            println!("Field '{}' updated", name);
        }
        FieldSubcommand::Remove { name } => {
            store
                .remove_field(&name)
                .with_context(|| format!("Failed to remove field '{}'", name))?;
            println!("Field '{}' removed", name);

            let stale = store
                .orphaned_outputs()
                .into_iter()
                .filter(|(_, key)| *key == name)
                .count();
            if stale > 0 {
                println!(
                    "{} example outputs still reference '{}'; run `example prune` to drop them",
                    stale, name
                );
            }
        }
    }
    Ok(())
}

fn handle_example_command(store: &mut ConfigStore, cmd: ExampleSubcommand) -> Result<()> {
    match cmd {
        ExampleSubcommand::List => {
            let examples = &store.document().examples;
            if examples.is_empty() {
                println!("No examples defined.");
            }
            for (idx, example) in examples.iter().enumerate() {
                println!("#{}: {}", idx + 1, example.input);
                for (field, value) in example.output.iter() {
                    println!("    {}: {}", field, value);
                }
            }
        }
        ExampleSubcommand::Add { input, values } => {
            let output: OrderedMap<FieldValue> = values
                .into_iter()
                .map(|(field, raw)| (field, parse_field_value(&raw)))
                .collect();
            store
                .add_example(&input, output)
                .context("Failed to add example")?;
            println!("Example #{} added", store.document().examples.len());
        }
        ExampleSubcommand::Remove { number } => {
            let index = number
                .checked_sub(1)
                .context("Example numbers start at 1")?;
            store
                .remove_example(index)
                .with_context(|| format!("Failed to delete example #{}", number))?;
            println!("Example #{} deleted", number);
        }
        ExampleSubcommand::Prune => {
            let removed = store
                .prune_orphaned_outputs()
                .context("Failed to prune example outputs")?;
            println!("Removed {} orphaned example outputs", removed);
        }
    }
    Ok(())
}

fn ensure_yaml_file(path: &std::path::Path) -> Result<()> {
    if !paths::is_yaml_file(path) {
        anyhow::bail!("Expected a .yaml or .yml file: {}", path.display());
    }
    Ok(())
}

/// Parse a `FIELD=VALUE` argument
fn parse_assignment(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got `{}`", arg)),
    }
}

/// Interpret a command-line value as YAML, falling back to a plain string
fn parse_yaml_value(raw: &str) -> serde_yaml::Value {
    if raw.trim().is_empty() {
        return serde_yaml::Value::String(raw.to_string());
    }
    serde_yaml::from_str(raw).unwrap_or_else(|_| serde_yaml::Value::String(raw.to_string()))
}

fn parse_field_value(raw: &str) -> FieldValue {
    if raw.trim().is_empty() {
        return FieldValue::Str(raw.to_string());
    }
    serde_yaml::from_str(raw).unwrap_or_else(|_| FieldValue::Str(raw.to_string()))
}
