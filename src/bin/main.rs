//! GroundSQL CLI - Compile requests against a semantic model
//!
//! Usage:
//!   groundsql compile "total revenue by region last 30 days" [--model <dir>]
//!   groundsql list [--model <dir>]
//!   groundsql check [--model <dir>]
//!
//! Examples:
//!   groundsql compile "top 10 users by order count" --model ./models --snapshot ./meta.json
//!   groundsql compile "revenue this year" --validate
//!   groundsql list --model ./models

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use groundsql::compile::{compile_and_validate, compile_request, CompileOptions};
use groundsql::config::Settings;
use groundsql::grounding::GroundingIndex;
use groundsql::lookml::parse_project;
use groundsql::metadata::StaticMetadataProvider;
use groundsql::validation::SyntaxValidator;

#[derive(Parser)]
#[command(name = "groundsql")]
#[command(about = "GroundSQL - Grounds a semantic model in warehouse metadata and compiles SQL")]
#[command(version)]
struct Cli {
    /// Path to a groundsql.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model repository directory (overrides config)
    #[arg(short, long, global = true)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a request into SQL
    Compile {
        /// The request text
        request: String,

        /// Path to a JSON metadata snapshot (overrides config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,

        /// Row limit applied when the request names none
        #[arg(short, long)]
        limit: Option<u32>,

        /// Cap on joined views per query
        #[arg(long)]
        max_joins: Option<usize>,

        /// Run the generated SQL through the syntax validator
        #[arg(long)]
        validate: bool,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },

    /// List explores and fields in the model
    List {
        /// Path to a JSON metadata snapshot (overrides config)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },

    /// Parse the model repository and report what was found
    Check,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with the plan summary
    Verbose,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let model_path = cli.model.unwrap_or_else(|| settings.model.path.clone());

    match cli.command {
        Commands::Compile {
            request,
            snapshot,
            limit,
            max_joins,
            validate,
            output,
        } => {
            cmd_compile(
                &settings, model_path, request, snapshot, limit, max_joins, validate, output,
            )
            .await
        }
        Commands::List { snapshot } => cmd_list(&settings, model_path, snapshot).await,
        Commands::Check => cmd_check(model_path),
    }
}

fn load_settings(config: Option<&std::path::Path>) -> Result<Settings, groundsql::config::SettingsError> {
    match config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

async fn build_index(
    settings: &Settings,
    model_path: PathBuf,
    snapshot: Option<PathBuf>,
) -> Result<GroundingIndex, String> {
    let project = parse_project(&model_path)
        .map_err(|e| format!("failed to parse model repository '{}': {}", model_path.display(), e))?;

    let snapshot_path = match snapshot {
        Some(path) => Some(path),
        None => settings
            .metadata
            .resolved_snapshot()
            .map_err(|e| e.to_string())?,
    };

    let provider = match snapshot_path {
        Some(path) => StaticMetadataProvider::from_json_file(&path)
            .map_err(|e| format!("failed to load metadata snapshot '{}': {}", path.display(), e))?,
        None => StaticMetadataProvider::default(),
    };

    GroundingIndex::build(project, &provider)
        .await
        .map_err(|e| e.to_string())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_compile(
    settings: &Settings,
    model_path: PathBuf,
    request: String,
    snapshot: Option<PathBuf>,
    limit: Option<u32>,
    max_joins: Option<usize>,
    validate: bool,
    output: OutputFormat,
) -> ExitCode {
    let index = match build_index(settings, model_path, snapshot).await {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = CompileOptions::default()
        .with_default_limit(limit.unwrap_or(settings.generator.default_limit))
        .with_max_joins(max_joins.unwrap_or(settings.generator.max_joins));

    let result = if validate {
        let validator = SyntaxValidator::new();
        compile_and_validate(&index, &request, options, &validator).await
    } else {
        compile_request(&index, &request, options)
    };

    match result {
        Ok(compiled) => {
            match output {
                OutputFormat::Sql => println!("{}", compiled.sql),
                OutputFormat::Verbose => {
                    println!("-- Request: {}", request);
                    println!("-- Explore: {}", compiled.plan.explore_name);
                    let fields: Vec<String> = compiled
                        .plan
                        .fields
                        .iter()
                        .map(|f| f.qualified_name())
                        .collect();
                    println!("-- Fields: {}", fields.join(", "));
                    println!();
                    println!("{}", compiled.sql);
                }
            }
            if let Some(validation) = &compiled.validation {
                if validation.ok {
                    eprintln!("Validation: ok");
                } else {
                    eprintln!(
                        "Validation: failed ({})",
                        validation.message.as_deref().unwrap_or("no message")
                    );
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_list(
    settings: &Settings,
    model_path: PathBuf,
    snapshot: Option<PathBuf>,
) -> ExitCode {
    let index = match build_index(settings, model_path, snapshot).await {
        Ok(index) => index,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for (name, explore) in index.explores() {
        println!("{} (base view: {})", name, explore.base_view);
        for field in explore.available_fields.values() {
            let kind = if field.is_measure() {
                "measure"
            } else {
                "dimension"
            };
            println!("  - {} [{}]", field.qualified_name(), kind);
        }
        println!();
    }

    ExitCode::SUCCESS
}

fn cmd_check(model_path: PathBuf) -> ExitCode {
    match parse_project(&model_path) {
        Ok(project) => {
            println!("Models: {}", project.models.len());
            for model in project.models.values() {
                println!(
                    "  - {} ({} explores, {} views)",
                    model.name,
                    model.explores.len(),
                    model.views.len()
                );
            }
            println!("Standalone views: {}", project.views.len());
            for view in project.views.values() {
                println!(
                    "  - {} ({} dimensions, {} measures)",
                    view.name,
                    view.dimensions.len(),
                    view.measures.len()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Model error: {}", e);
            ExitCode::FAILURE
        }
    }
}
