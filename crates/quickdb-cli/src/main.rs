//! QuickDB CLI
//!
//! Usage:
//!   qdb encode --model user.json --data record.json     Encode a record into tagged values
//!   qdb encode ... --declared-items                      Encode array items by declared type
//!   qdb decode [file]                                    Decode tagged JSON (stdin if no file)
//!   qdb register --config app.yaml --model user.json     Register models against the configured databases
//!
//! A failed model registration or database configuration exits with status 1.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};
use std::io::Read;
use std::path::{Path, PathBuf};

use quickdb::{init_logging, AppConfig, MemoryBridge, QuickDb, QuickDbError};
use quickdb_codec::{decode, encode_record_with_options, validate_record, EncodeOptions, ModelMeta};

#[derive(Parser)]
#[command(name = "qdb")]
#[command(about = "QuickDB typed value codec and model registration", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a host JSON record into tagged values using model metadata
    Encode {
        /// Model metadata file (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Record to encode (JSON object)
        #[arg(short, long)]
        data: PathBuf,

        /// Encode array elements against the declared item type
        #[arg(long)]
        declared_items: bool,

        /// Also check declared bounds and required fields
        #[arg(long)]
        validate: bool,
    },

    /// Decode tagged JSON into host JSON
    Decode {
        /// Input file (reads stdin when omitted)
        input: Option<PathBuf>,
    },

    /// Register models against the databases of an application config
    Register {
        /// Application config (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Model metadata files, registered in the order given
        #[arg(short, long = "model", required = true)]
        models: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let result = match cli.command {
        Commands::Encode {
            model,
            data,
            declared_items,
            validate,
        } => run_encode(&model, &data, declared_items, validate),
        Commands::Decode { input } => run_decode(input.as_deref()),
        Commands::Register { config, models } => run_register(&config, &models),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(err) => {
            let fatal = err
                .downcast_ref::<QuickDbError>()
                .map_or(false, QuickDbError::is_fatal);
            eprintln!("Error: {:#}", err);
            std::process::exit(if fatal { 1 } else { 2 });
        }
    }
}

/// Encode one record file against a model file
fn run_encode(model: &Path, data: &Path, declared_items: bool, validate: bool) -> Result<String> {
    let meta = load_model(model)?;
    let record = read_json(data)?;
    let JsonValue::Object(record) = record else {
        bail!("{}: record must be a JSON object", data.display());
    };

    let options = if declared_items {
        EncodeOptions::new().declared_array_items()
    } else {
        EncodeOptions::new()
    };
    let tagged = encode_record_with_options(&record, &meta, &options)?;
    if validate {
        validate_record(&tagged, &meta)?;
    }
    Ok(serde_json::to_string_pretty(&tagged.to_json())?)
}

fn run_decode(input: Option<&Path>) -> Result<String> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let value: JsonValue = serde_json::from_str(&text).context("Input is not valid JSON")?;
    Ok(serde_json::to_string_pretty(&decode(&value))?)
}

/// Configure every database, then register each model in the order given
fn run_register(config: &Path, models: &[PathBuf]) -> Result<String> {
    let app = AppConfig::from_file(config)?;
    if app.databases.is_empty() {
        bail!("{}: no databases configured", config.display());
    }

    let metas = models
        .iter()
        .map(|path| load_model(path))
        .collect::<Result<Vec<_>>>()?;

    let mut db = QuickDb::with_config(MemoryBridge::new(), &app);
    for database in app.databases.iter().cloned() {
        db.add_database(database)?;
    }
    for meta in metas {
        db.register_model(meta)?;
    }

    let registered: Vec<JsonValue> = db
        .registered_models()
        .map(|meta| {
            json!({
                "model": meta.collection_name,
                "alias": meta.database_alias,
                "fields": meta.fields.len(),
                "indexes": meta.indexes.len(),
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json!({ "registered": registered }))?)
}

fn load_model(path: &Path) -> Result<ModelMeta> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(ModelMeta::from_json(&text)?)
}

fn read_json(path: &Path) -> Result<JsonValue> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}
