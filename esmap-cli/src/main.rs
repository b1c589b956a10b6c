use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use esmap::metadata::SchemaLoader;
use esmap::query::{Parameter, QueryCreator, QueryMethod, ReturnKind, StringQuery};
use esmap::{Config, MappingBuilder, MappingContext};

#[derive(Parser, Debug)]
#[command(name = "esmap")]
#[command(about = "esmap CLI - Elasticsearch mapping and derived query tools")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(short, long, global = true, env = "ESMAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the index mapping of an entity
    Mapping {
        /// Directory with YAML entity schemas
        #[arg(short, long)]
        schemas: PathBuf,

        /// Entity type name
        #[arg(short, long)]
        entity: String,

        /// Directory that resource paths resolve against (overrides config)
        #[arg(short, long)]
        resources: Option<PathBuf>,
    },

    /// Print the index settings of an entity
    Settings {
        /// Directory with YAML entity schemas
        #[arg(short, long)]
        schemas: PathBuf,

        /// Entity type name
        #[arg(short, long)]
        entity: String,

        /// Directory that resource paths resolve against (overrides config)
        #[arg(short, long)]
        resources: Option<PathBuf>,
    },

    /// Derive a search request from a repository method name
    Derive {
        /// Directory with YAML entity schemas
        #[arg(short, long)]
        schemas: PathBuf,

        /// Entity type name
        #[arg(short, long)]
        entity: String,

        /// Method name, e.g. findByNameAndPriceGreaterThan
        #[arg(short, long)]
        method: String,

        /// Method arguments as a JSON array
        #[arg(short, long, default_value = "[]")]
        args: String,

        /// Declared return kind of the method
        #[arg(long, value_enum, default_value_t = Returns::Collection)]
        returns: Returns,
    },

    /// Bind ?N placeholders of a query template
    Bind {
        /// Query template
        #[arg(short, long)]
        template: String,

        /// Parameters as a JSON array
        #[arg(short, long, default_value = "[]")]
        args: String,
    },

    /// Check entity schemas for problems
    Lint {
        /// Directory with YAML entity schemas
        #[arg(short, long)]
        schemas: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Returns {
    Single,
    Collection,
    Page,
    Stream,
}

impl From<Returns> for ReturnKind {
    fn from(value: Returns) -> Self {
        match value {
            Returns::Single => ReturnKind::Single,
            Returns::Collection => ReturnKind::Collection,
            Returns::Page => ReturnKind::Page,
            Returns::Stream => ReturnKind::Stream,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    init_logging(&config);

    match cli.command {
        Commands::Mapping {
            schemas,
            entity,
            resources,
        } => {
            let context = load_context(&config, &schemas)?;
            let builder = MappingBuilder::new(&context, resource_loader(&config, resources));
            print_json(&builder.build_mapping(&entity)?)?;
        }
        Commands::Settings {
            schemas,
            entity,
            resources,
        } => {
            let context = load_context(&config, &schemas)?;
            let builder = MappingBuilder::new(&context, resource_loader(&config, resources));
            print_json(&builder.build_settings(&entity)?)?;
        }
        Commands::Derive {
            schemas,
            entity,
            method,
            args,
            returns,
        } => {
            let context = load_context(&config, &schemas)?;
            let parameters = parse_parameters(&args)?;
            let creator = QueryCreator::for_entity(&context, &entity)?;
            let query_method = QueryMethod::new(&entity, &method).returns(returns.into());
            let query = creator.create_for_method(&query_method, &parameters)?;
            let info = context.entity_information(&entity)?;

            tracing::info!(entity = %entity, method = %method, shape = ?query.shape(), "derived query");
            print_json(&json!({
                "index": info.index_name,
                "shape": query.shape(),
                "request": query.to_request_body(),
            }))?;
        }
        Commands::Bind { template, args } => {
            let parameters = parse_parameters(&args)?;
            println!("{}", StringQuery::new(template).bind(&parameters)?);
        }
        Commands::Lint { schemas } => {
            let all = SchemaLoader::new(&schemas).load_all()?;
            let issues = SchemaLoader::lint_all(&all);
            if issues.is_empty() {
                tracing::info!("{} schemas ok", all.len());
                return Ok(());
            }

            let mut names: Vec<_> = issues.keys().collect();
            names.sort();
            for name in names {
                for issue in &issues[name] {
                    println!("{name}: {issue}");
                }
            }
            bail!("{} of {} schemas have issues", issues.len(), all.len());
        }
    }

    Ok(())
}

/// RUST_LOG wins over the configured level. Logs go to stderr so stdout
/// stays valid JSON.
fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let (pretty, json) = if config.logging.format == "json" {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .init();
}

fn load_context(config: &Config, schemas: &Path) -> Result<MappingContext> {
    let context = MappingContext::from_config(config);
    let count = SchemaLoader::new(schemas).load_into(&context)?;
    tracing::debug!("Loaded {} schemas from {}", count, schemas.display());
    Ok(context)
}

fn resource_loader(config: &Config, root: Option<PathBuf>) -> esmap::ResourceLoader {
    match root {
        Some(root) => esmap::ResourceLoader::new(root),
        None => config.resource_loader(),
    }
}

fn parse_parameters(args: &str) -> Result<Vec<Parameter>> {
    let value: Value = serde_json::from_str(args).context("Arguments must be valid JSON")?;
    match value {
        Value::Array(items) => Ok(items.iter().map(Parameter::from_json).collect()),
        other => Err(anyhow!("Arguments must be a JSON array, got {}", other)),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
