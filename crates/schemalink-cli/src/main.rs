//! schemalink CLI - extract a schema model with bidirectional foreign keys.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use schemalink::{
    Config, ExtractionResult, MetadataSource, MysqlSource, SchemaError, SchemaExtractor,
    TableRecord,
};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "schemalink")]
#[command(about = "Extract table metadata and bidirectional foreign-key links")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the schema model and resolve reverse links
    Extract {
        /// Include only matching tables; replaces the config's include_tables
        #[arg(long)]
        include: Vec<String>,

        /// Exclude matching tables; added to the config's exclude_tables
        #[arg(long)]
        exclude: Vec<String>,

        /// Override number of concurrent table builds
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Show outbound and inbound foreign keys of one table
    Describe {
        /// Table name
        table: String,

        /// Override number of concurrent table builds
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Test the source database connection
    HealthCheck,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SchemaError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format);

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Extract {
            include,
            exclude,
            workers,
        } => {
            if !include.is_empty() {
                config.extract.include_tables = include;
            }
            if !exclude.is_empty() {
                config.extract.exclude_tables.extend(exclude);
            }
            if let Some(w) = workers {
                config.extract.workers = Some(w);
            }
            config.validate()?;

            let result = extract(config).await?;
            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_summary(&result);
            }
        }

        Commands::Describe { table, workers } => {
            if let Some(w) = workers {
                config.extract.workers = Some(w);
            }
            config.validate()?;

            let result = extract(config).await?;
            let record = result
                .model
                .get(&table)
                .ok_or_else(|| SchemaError::TableNotFound(table.clone()))?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(record)?);
            } else {
                print_table(record);
            }
        }

        Commands::HealthCheck => {
            let started = Instant::now();
            let source = MysqlSource::new(&config.source, 1).await?;
            let outcome = source.test_connection().await;
            let latency_ms = started.elapsed().as_millis();
            source.close().await;

            if cli.output_json {
                let report = serde_json::json!({
                    "source_connected": outcome.is_ok(),
                    "source_latency_ms": latency_ms,
                    "source_error": outcome.as_ref().err().map(|e| e.to_string()),
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Source (MySQL): {} ({}ms)",
                    if outcome.is_ok() { "OK" } else { "FAILED" },
                    latency_ms
                );
                if let Err(ref err) = outcome {
                    println!("    Error: {}", err);
                }
            }

            outcome?;
        }
    }

    Ok(())
}

async fn extract(config: Config) -> Result<ExtractionResult, SchemaError> {
    let config_hash = config.hash();
    let config = config.with_auto_tuning();
    let source = Arc::new(
        MysqlSource::new(&config.source, config.extract.get_max_connections()).await?,
    );

    let result = SchemaExtractor::new(source.clone(), config.extract.clone())
        .with_config_hash(config_hash)
        .extract()
        .await;
    source.close().await;
    result
}

fn print_summary(result: &ExtractionResult) {
    println!(
        "Extracted {} tables, {} foreign keys ({} inbound links) in {:.1}s\n",
        result.tables_total, result.constraints_total, result.inbound_total, result.duration_seconds
    );
    if let Some(hash) = &result.config_hash {
        println!("Config hash: {}\n", hash);
    }
    for name in result.model.table_names() {
        if let Some(record) = result.model.get(name) {
            print_table(record);
        }
    }
}

fn print_table(record: &TableRecord) {
    let pk = record.primary_key();
    if pk.is_empty() {
        println!("{} ({} columns)", record.name, record.columns.len());
    } else {
        println!(
            "{} ({} columns, primary key: {})",
            record.name,
            record.columns.len(),
            pk.join(", ")
        );
    }

    let mut outbound: Vec<_> = record.foreign_keys.values().collect();
    outbound.sort_by(|a, b| a.name.cmp(&b.name));
    for fk in outbound {
        let local: Vec<&str> = fk.parts.iter().map(|p| p.column.as_str()).collect();
        let remote: Vec<&str> = fk.parts.iter().map(|p| p.remote_column.as_str()).collect();
        println!(
            "  -> {} ({}) references {}({})",
            fk.name,
            local.join(", "),
            fk.remote_table().unwrap_or("?"),
            remote.join(", ")
        );
    }

    for fk in &record.inbound {
        let local: Vec<&str> = fk.parts.iter().map(|p| p.column.as_str()).collect();
        let remote: Vec<&str> = fk.parts.iter().map(|p| p.remote_column.as_str()).collect();
        let from = fk.parts.first().map(|p| p.remote_table.as_str()).unwrap_or("?");
        println!(
            "  <- {} from {}({}) to ({})",
            fk.name,
            from,
            remote.join(", "),
            local.join(", ")
        );
    }
    println!();
}

fn setup_logging(verbosity: &str, format: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --output-json stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
