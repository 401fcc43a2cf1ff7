//! HTEC CLI - reshape and aggregate employment panel tables
//!
//! # Main Commands
//!
//! ```bash
//! htec analyze data.tsv              # Full pipeline, JSON report on stdout
//! htec serve                         # Start HTTP server (port 3000)
//! htec resolve EL UK EU27_2020       # Display names and flag assets
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! htec normalize data.tsv            # Split the compound key column
//! htec long data.tsv                 # Coerced long-format observations
//! htec domains data.tsv              # Distinct values per dimension
//! ```
//!
//! `HTEC_CONFIG` (or `--config`) may point at a JSON options file; flags
//! override individual fields.

use clap::{Args, Parser, Subcommand};
use htec::server::parse_list;
use htec::{
    analyze_file, coerce, domains, load_and_normalize, resolve, to_long_form, AnalysisOptions, Dimension,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "htec")]
#[command(about = "Reshape and aggregate wide-format employment panel tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: TSV → long form → filter → aggregates and pivots
    Analyze {
        /// Input TSV file
        input: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split the compound key column and print the table as JSON
    Normalize {
        /// Input TSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print coerced long-format observations
    Long {
        /// Input TSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the distinct values of each dimension
    Domains {
        /// Input TSV file
        input: PathBuf,
    },

    /// Resolve geo codes to display names and flag assets
    Resolve {
        /// Codes to resolve
        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// JSON options file used as request defaults
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// JSON options file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Allowed sector codes (repeatable)
    #[arg(long = "sector")]
    sectors: Vec<String>,

    /// Required unit code
    #[arg(long)]
    unit: Option<String>,

    /// Dimension to group by (isced11, geo, ...)
    #[arg(long)]
    category: Option<String>,

    /// Active education levels, comma separated ("" allows none)
    #[arg(long)]
    education: Option<String>,

    /// Active geographies, comma separated ("" allows none)
    #[arg(long)]
    geo: Option<String>,

    /// Keep TOTAL / NRP categories in the views
    #[arg(long)]
    keep_aggregates: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            filters,
            output,
        } => cmd_analyze(&input, filters, output.as_deref()),

        Commands::Normalize { input, output } => cmd_normalize(&input, output.as_deref()),

        Commands::Long { input, output } => cmd_long(&input, output.as_deref()),

        Commands::Domains { input } => cmd_domains(&input),

        Commands::Resolve { codes } => cmd_resolve(&codes),

        Commands::Serve { port, config } => cmd_serve(port, config.as_deref()).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Options from `--config`, else `HTEC_CONFIG`, else defaults.
fn base_options(config: Option<&Path>) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let path = config
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("HTEC_CONFIG").map(PathBuf::from));

    match path {
        Some(p) => {
            eprintln!("⚙️  Options: {}", p.display());
            Ok(AnalysisOptions::from_json_file(&p)?)
        }
        None => Ok(AnalysisOptions::default()),
    }
}

fn build_options(filters: FilterArgs) -> Result<AnalysisOptions, Box<dyn std::error::Error>> {
    let mut options = base_options(filters.config.as_deref())?;

    if !filters.sectors.is_empty() {
        options.sectors = filters.sectors;
    }
    if let Some(unit) = filters.unit {
        options.unit = unit;
    }
    if let Some(category) = filters.category {
        options.category = category.parse::<Dimension>()?;
    }
    if let Some(levels) = filters.education {
        options.education = Some(parse_list(&levels));
    }
    if let Some(geos) = filters.geo {
        options.geography = Some(parse_list(&geos));
    }
    if filters.keep_aggregates {
        options.exclude_categories.clear();
    }

    Ok(options)
}

fn cmd_analyze(
    input: &Path,
    filters: FilterArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = build_options(filters)?;
    let result = analyze_file(input, &options)?;
    let summary = &result.report.summary;

    eprintln!("\n📊 Summary:");
    eprintln!("   Rows: {} x {} periods", summary.rows, summary.periods);
    eprintln!("   Observations: {} ({} missing)", summary.observations, summary.missing);
    eprintln!("   In scope: {}, selected: {}", summary.in_scope, summary.selected);
    eprintln!("   Education levels: {}", summary.education_levels);
    eprintln!("   Geographies: {}", summary.geographies);
    eprintln!("   Aggregate groups: {}", result.report.aggregates.len());

    let json = serde_json::to_string_pretty(&result)?;
    write_output(&json, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_normalize(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🧩 Normalizing: {}", input.display());

    let table = load_and_normalize(&fs::read(input)?)?;
    eprintln!("   {} rows, {} periods", table.rows.len(), table.periods.len());

    let json = serde_json::to_string_pretty(&table)?;
    write_output(&json, output)
}

fn cmd_long(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📐 Reshaping: {}", input.display());

    let table = load_and_normalize(&fs::read(input)?)?;
    let observations = coerce(to_long_form(&table));
    eprintln!("   {} observations", observations.len());

    let json = serde_json::to_string_pretty(&observations)?;
    write_output(&json, output)
}

fn cmd_domains(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let table = load_and_normalize(&fs::read(input)?)?;
    let keys: Vec<_> = table.rows.into_iter().map(|r| r.key).collect();

    for domain in domains(&keys) {
        let values: Vec<&str> = domain.values.iter().map(String::as_str).collect();
        println!("{} ({}): {}", domain.dimension, domain.len(), values.join(", "));
    }
    Ok(())
}

fn cmd_resolve(codes: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let resolved: Vec<_> = codes.iter().map(|c| resolve(c)).collect();
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

async fn cmd_serve(port: u16, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let options = base_options(config)?;
    htec::server::start_server(port, options).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
