use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use flagset_core::{FieldDescriptor, FlagKind, FlagSet, ValueStore, validate_fields};
use flagset_manifest::Manifest;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

/// Output encoding for structured results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "flagset")]
#[command(about = "Check flag manifests and resolve arguments against them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve tokens against a manifest and print the resolution report.
    Resolve(ResolveArgs),
    /// Report every structural problem in one or more manifests.
    Validate(ValidateArgs),
    /// Print the arguments given for one flag.
    Args(FlagArgsArgs),
    /// List the flags a manifest declares.
    Flags(FlagsArgs),
}

#[derive(Debug, Args)]
struct ResolveArgs {
    /// Manifest file (.json, .yaml or .yml).
    #[arg(long)]
    manifest: PathBuf,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
    /// Exit with an error when any flag failed to resolve.
    #[arg(long)]
    strict: bool,
    /// Environment variable visible to resolution (KEY=VALUE, repeatable).
    #[arg(long = "env", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,
    /// Ignore the process environment; only --env values are visible.
    #[arg(long)]
    no_process_env: bool,
    /// Tokens to resolve, after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Manifest files.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct FlagArgsArgs {
    /// Manifest file (.json, .yaml or .yml).
    #[arg(long)]
    manifest: PathBuf,
    /// Dotted field name (e.g. Serve.Port).
    #[arg(long)]
    name: String,
    /// Tokens to resolve, after `--`.
    #[arg(last = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct FlagsArgs {
    /// Manifest file (.json, .yaml or .yml).
    #[arg(long)]
    manifest: PathBuf,
    /// Print as JSON or YAML instead of a table.
    #[arg(long)]
    format: Option<CliOutputFormat>,
}

/// One row of the `flags` listing.
#[derive(Debug, Serialize)]
struct FlagRow {
    id: usize,
    name: String,
    kind: FlagKind,
    #[serde(rename = "type")]
    value_type: String,
    names: String,
    required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    env: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    default: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Validate(args) => run_validate(args),
        Command::Args(args) => run_args(args),
        Command::Flags(args) => run_flags(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run_resolve(args: ResolveArgs) -> Result<(), String> {
    let fields = load_fields(&args.manifest)?;

    let mut env: BTreeMap<String, String> = if args.no_process_env {
        BTreeMap::new()
    } else {
        std::env::vars_os()
            .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
            .collect()
    };
    env.extend(args.env);

    let mut store = ValueStore::with_fields(&fields);
    let mut flags = build_flag_set(&fields, args.tokens)?;
    flags.resolve(&mut store, &env);

    let report = flags.report();
    println!("{}", render(&report, args.format)?);

    info!(
        manifest = %args.manifest.display(),
        resolved = report.resolved().count(),
        errors = report.errors.len(),
        "resolution finished"
    );
    if args.strict && !report.is_ok() {
        return Err(format!("{} resolution error(s)", report.errors.len()));
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut failed = 0;
    for path in &args.inputs {
        let problems: Vec<String> = match Manifest::load(path) {
            Ok(manifest) => validate_fields(&manifest.descriptors())
                .iter()
                .map(ToString::to_string)
                .collect(),
            Err(err) => vec![err.to_string()],
        };

        if problems.is_empty() {
            println!("{}: ok", path.display());
            continue;
        }
        failed += 1;
        for problem in problems {
            println!("{}: {problem}", path.display());
        }
    }

    if failed > 0 {
        return Err(format!(
            "{failed} of {} manifest(s) failed validation",
            args.inputs.len()
        ));
    }
    println!("Validated {} manifest(s).", args.inputs.len());
    Ok(())
}

fn run_args(args: FlagArgsArgs) -> Result<(), String> {
    let fields = load_fields(&args.manifest)?;
    let mut store = ValueStore::with_fields(&fields);
    let mut flags = build_flag_set(&fields, args.tokens)?;
    flags.resolve(&mut store, &flagset_core::ProcessEnv);

    if flags.flag_by_name(&args.name).is_none() {
        return Err(format!("no flag named '{}'", args.name));
    }
    for value in flags.flag_args(&args.name).unwrap_or_default() {
        println!("{value}");
    }
    Ok(())
}

fn run_flags(args: FlagsArgs) -> Result<(), String> {
    let fields = load_fields(&args.manifest)?;
    let flags = build_flag_set(&fields, Vec::new())?;

    let rows: Vec<FlagRow> = flags
        .flags()
        .iter()
        .map(|flag| FlagRow {
            id: flag.id,
            name: flags.qualified_name(flag),
            kind: flag.kind,
            value_type: flag.value_type.to_string(),
            names: flag_names(flag),
            required: flag.required,
            env: flag.env.clone(),
            default: flag.default.clone(),
            description: flag.description.clone(),
        })
        .collect();

    if let Some(format) = args.format {
        println!("{}", render(&rows, format)?);
        return Ok(());
    }

    println!("{:<4} {:<24} {:<8} {:<10} {:<16} ENV/DEFAULT", "ID", "NAME", "KIND", "TYPE", "NAMES");
    for row in &rows {
        let kind = match row.kind {
            FlagKind::Arg => "arg",
            FlagKind::Command => "command",
        };
        let mut extra = Vec::new();
        if !row.env.is_empty() {
            extra.push(format!("${}", row.env));
        }
        if !row.default.is_empty() {
            extra.push(format!("={}", row.default));
        }
        if row.required {
            extra.push("required".to_string());
        }
        println!(
            "{:<4} {:<24} {:<8} {:<10} {:<16} {}",
            row.id,
            row.name,
            kind,
            row.value_type,
            row.names,
            extra.join(" ")
        );
    }
    Ok(())
}

fn load_fields(path: &Path) -> Result<Vec<FieldDescriptor>, String> {
    let manifest = Manifest::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))?;
    debug!(manifest = %path.display(), name = %manifest.name, "manifest loaded");
    Ok(manifest.descriptors())
}

fn build_flag_set(fields: &[FieldDescriptor], tokens: Vec<String>) -> Result<FlagSet, String> {
    FlagSet::new(fields, tokens).map_err(|err| format!("Invalid flag declaration: {err}"))
}

fn flag_names(flag: &flagset_core::Flag) -> String {
    if flag.is_command() {
        return flag.command.clone();
    }
    let mut names = Vec::new();
    if !flag.short.is_empty() {
        names.push(format!("-{}", flag.short));
    }
    if !flag.long.is_empty() {
        names.push(format!("--{}", flag.long));
    }
    names.join(", ")
}

fn render<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<String, String> {
    match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("YAML serialization failed: {e}"))
        }
    }
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
