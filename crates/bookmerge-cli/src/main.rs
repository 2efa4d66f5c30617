//! bookmerge CLI
//!
//! Command-line tool for integrating the Goodreads and Google Books exports
//! into one canonical catalog and inspecting the result.

use bookmerge_core::pipeline::SourceInputs;
use bookmerge_core::{integrate, run, schema_markdown, IntegrationOutput, PipelineConfig};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bookmerge")]
#[command(about = "Canonical book catalog builder", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to find the inputs; flags override the config file
#[derive(Args)]
struct InputArgs {
    /// Pipeline config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Goodreads JSON export
    #[arg(long)]
    goodreads: Option<PathBuf>,

    /// Google Books CSV export
    #[arg(long)]
    googlebooks: Option<PathBuf>,

    /// Google Books CSV delimiter
    #[arg(long)]
    delimiter: Option<char>,
}

impl InputArgs {
    fn resolve(&self) -> bookmerge_core::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(path) = &self.goodreads {
            config.goodreads_path = path.clone();
        }
        if let Some(path) = &self.googlebooks {
            config.googlebooks_path = path.clone();
        }
        if let Some(delimiter) = self.delimiter {
            config.googlebooks_delimiter = delimiter;
        }
        debug!(
            goodreads = %config.goodreads_path.display(),
            googlebooks = %config.googlebooks_path.display(),
            "resolved inputs"
        );
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full integration and write every output
    Integrate {
        #[command(flatten)]
        input: InputArgs,

        /// Output root for standard/ and docs/
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the canonical table without writing anything
    Show {
        #[command(flatten)]
        input: InputArgs,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,

        /// Columns to display (comma-separated)
        #[arg(long)]
        columns: Option<String>,
    },

    /// Explain which source rows produced a canonical book
    Explain {
        #[command(flatten)]
        input: InputArgs,

        /// Canonical book_id
        #[arg(short, long)]
        book_id: String,
    },

    /// Print the quality report as JSON
    Quality {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the output schema
    Schema,

    /// Write a config file with default settings
    InitConfig {
        /// Output path for the config file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    init_tracing();

    if let Err(e) = run_cli() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_cli() -> bookmerge_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Integrate { input, output } => cmd_integrate(&input, output),
        Commands::Show {
            input,
            limit,
            columns,
        } => cmd_show(&input, limit, columns),
        Commands::Explain { input, book_id } => cmd_explain(&input, &book_id),
        Commands::Quality { input } => cmd_quality(&input),
        Commands::Schema => {
            print!("{}", schema_markdown());
            Ok(())
        }
        Commands::InitConfig { output } => cmd_init_config(&output),
    }
}

/// Run the engine in memory; nothing is written
fn load_and_run(input: &InputArgs) -> bookmerge_core::Result<IntegrationOutput> {
    let config = input.resolve()?;
    let inputs = SourceInputs::load(&config)?;
    run(&inputs, &config.quality, Utc::now())
}

fn cmd_integrate(input: &InputArgs, output: Option<PathBuf>) -> bookmerge_core::Result<()> {
    let mut config = input.resolve()?;
    if let Some(dir) = output {
        config.output_dir = dir;
    }

    let (result, written) = integrate(&config)?;

    println!(
        "Integrated {} records into {} canonical books ({} duplicates collapsed)",
        result.detail.len(),
        result.resolved.len(),
        result.quality.duplicate_candidates
    );
    for path in &written {
        println!("  - {}", path.display());
    }

    Ok(())
}

fn cmd_show(input: &InputArgs, limit: Option<usize>, columns: Option<String>) -> bookmerge_core::Result<()> {
    let result = load_and_run(input)?;
    let table = result.canonical_table();

    // Filter columns if specified
    let col_filter: Option<Vec<&str>> = columns.as_ref().map(|c| c.split(',').map(str::trim).collect());

    let display_cols: Vec<&bookmerge_core::Column> = if let Some(ref filter) = col_filter {
        table
            .columns
            .iter()
            .filter(|c| filter.contains(&c.name.as_str()))
            .collect()
    } else {
        table.columns.iter().collect()
    };

    // Print header
    let header: Vec<&str> = display_cols.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    // Print rows
    let row_limit = limit.unwrap_or(table.rows.len());
    for row in table.rows.iter().take(row_limit) {
        let values: Vec<String> = display_cols
            .iter()
            .map(|col| row.get(col.index).map(|c| c.to_string_value()).unwrap_or_default())
            .collect();
        println!("{}", values.join("\t"));
    }

    if table.rows.len() > row_limit {
        println!("... ({} more rows)", table.rows.len() - row_limit);
    }

    Ok(())
}

fn cmd_explain(input: &InputArgs, book_id: &str) -> bookmerge_core::Result<()> {
    let result = load_and_run(input)?;

    let resolved = result.require_book(book_id)?;
    let book = &resolved.book;

    println!("Book ID: {}", book.book_id);
    println!("Title: {}", book.title.as_deref().unwrap_or("<null>"));
    println!("Winning source: {}", book.winning_source);
    println!();
    println!("Group members (merge order):");
    for (i, member) in resolved.members.iter().enumerate() {
        let marker = if i == 0 { " <-- base" } else { "" };
        println!("  {}. {}{}", i + 1, member, marker);
    }
    println!();
    println!("Field sources:");
    for (field, sources) in &resolved.provenance.fields {
        let refs: Vec<String> = sources.iter().map(ToString::to_string).collect();
        println!("  {:<20} {}", field, refs.join(", "));
    }

    Ok(())
}

fn cmd_quality(input: &InputArgs) -> bookmerge_core::Result<()> {
    let result = load_and_run(input)?;
    println!("{}", serde_json::to_string_pretty(&result.quality)?);
    Ok(())
}

fn cmd_init_config(output: &Path) -> bookmerge_core::Result<()> {
    let config = PipelineConfig::default();
    config.save(output)?;

    println!("Created config file: {}", output.display());
    println!();
    println!("Edit the file to point at your exports, then run:");
    println!("  bookmerge integrate --config {}", output.display());

    Ok(())
}
