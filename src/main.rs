use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use propval::{
    metadata::{JsonDirMetadataLoader, MetadataLoader},
    path::EnvPathResolver,
    Container, DisplayOptions, Storable, Validatable, ValidationError, Value,
};
use serde::Serialize;
use serde_json::Value as Json;
use std::{fs, path::PathBuf, process::ExitCode, sync::Arc};
use tracing_subscriber::EnvFilter;

/// Coerce a raw value through a property definition and validate it.
#[derive(Parser, Debug)]
#[command(name = "propval")]
struct Args {
    /// Property definition, as a JSON object.
    definition: PathBuf,

    /// Raw value. Parsed as JSON when it is valid JSON, taken literally
    /// otherwise.
    value: Option<String>,

    /// Locale for the input and display projections.
    #[arg(long)]
    lang: Option<String>,

    /// Directory holding structure interface schemas as `{ident}.json`.
    #[arg(long)]
    metadata_dir: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    ident: &'a str,
    #[serde(rename = "type")]
    type_ident: &'static str,
    val: &'a Value,
    input_val: String,
    display_val: String,
    valid: bool,
    errors: &'a [ValidationError],
    sql_type: String,
}

fn main() -> ExitCode {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Prints the report; the return value is the validation outcome.
fn run(args: Args) -> Result<bool> {
    let raw = fs::read_to_string(&args.definition)
        .with_context(|| format!("reading {}", args.definition.display()))?;
    let definition: Json = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.definition.display()))?;
    let definition = definition
        .as_object()
        .context("the definition must be a JSON object")?;
    let ident = definition
        .get("ident")
        .and_then(Json::as_str)
        .map(str::to_string)
        .or_else(|| {
            args.definition
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "property".to_string());

    let container = Container {
        metadata_loader: args.metadata_dir.map(|dir| {
            Arc::new(JsonDirMetadataLoader::new(dir)) as Arc<dyn MetadataLoader>
        }),
        translator: None,
        path_resolver: Some(Arc::new(EnvPathResolver::from_env())),
    };
    let mut prop = container
        .property_factory()
        .create_from_definition(&ident, definition)?;

    if let Some(raw) = args.value {
        let val = serde_json::from_str::<Json>(&raw)
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw.as_str()));
        prop.set_val(val)?;
    }

    let valid = prop.validate();
    tracing::debug!(ident = %prop.ident(), valid, "validated");

    let opts = DisplayOptions { lang: args.lang };
    let report = Report {
        ident: prop.ident(),
        type_ident: prop.r#type(),
        val: prop.val(),
        input_val: prop.input_val(None, &opts),
        display_val: prop.display_val(None, &opts),
        valid,
        errors: prop.validator().errors(),
        sql_type: prop.sql_type(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(valid)
}
