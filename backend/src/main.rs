//! Driver Grid CLI - turn driver-safety reports into violation grids
//!
//! # Commands
//!
//! ```bash
//! driver-grid serve                          # Start HTTP server (port 3000)
//! driver-grid process daily.xlsx             # Write daily_grid.xlsx next to the input
//! driver-grid process export.csv -c "U Turn" --individual-count
//! driver-grid columns                        # List recognised violation columns
//! driver-grid inspect export.csv             # Show what the parser sees
//! ```

use clap::{Parser, Subcommand};
use driver_grid::{
    output_file_name, parse_file, process_bytes, AppConfig, ColumnCatalog, ColumnGroup,
    ParseOptions, PipelineError, PipelineOptions, Selection,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "driver-grid")]
#[command(about = "Summarise driver-safety reports into per-driver violation grids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory for generated workbooks
        #[arg(long)]
        storage_dir: Option<PathBuf>,
    },

    /// Process one report file into a grid workbook
    Process {
        /// Input report (.xlsx, .xls, .ods, .csv, ...)
        input: PathBuf,

        /// Output workbook (default: <input>_grid.xlsx next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Violation column to include (repeatable, default: the default group)
        #[arg(short, long = "column")]
        columns: Vec<String>,

        /// Include the harsh-handling columns
        #[arg(long)]
        harsh_handling: bool,

        /// Append each violation's count to the label
        #[arg(short, long)]
        individual_count: bool,

        /// Metadata lines above the header of delimited exports
        #[arg(long)]
        metadata_lines: Option<usize>,

        /// Also print the result rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recognised violation columns
    Columns,

    /// Parse a report and show its columns
    Inspect {
        /// Input report
        input: PathBuf,

        /// Metadata lines above the header of delimited exports
        #[arg(long)]
        metadata_lines: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let result = match cli.command {
        Commands::Serve { port, storage_dir } => cmd_serve(config, port, storage_dir).await,

        Commands::Process {
            input,
            output,
            columns,
            harsh_handling,
            individual_count,
            metadata_lines,
            json,
        } => cmd_process(
            &input,
            output.as_deref(),
            &columns,
            harsh_handling,
            individual_count,
            metadata_lines.unwrap_or(config.metadata_lines),
            json,
        ),

        Commands::Columns => cmd_columns(),

        Commands::Inspect {
            input,
            metadata_lines,
        } => cmd_inspect(&input, metadata_lines.unwrap_or(config.metadata_lines)),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(
    mut config: AppConfig,
    port: Option<u16>,
    storage_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(dir) = storage_dir {
        config.storage_dir = dir;
    }
    driver_grid::server::start_server(config).await
}

fn cmd_process(
    input: &Path,
    output: Option<&Path>,
    columns: &[String],
    harsh_handling: bool,
    individual_count: bool,
    metadata_lines: usize,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let catalog = ColumnCatalog::builtin();
    let selection = Selection::new(&catalog, columns, harsh_handling, individual_count)
        .map_err(PipelineError::from)?;
    let options = PipelineOptions {
        parse: ParseOptions {
            metadata_lines,
            delimiter: None,
        },
    };

    let file_name = input
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = fs::read(input)?;
    let rendered = process_bytes(&bytes, &file_name, &catalog, &selection, &options)?;
    let report = &rendered.report;

    eprintln!("   Name column: {}", report.name_column);
    eprintln!("   Columns: {}", report.columns.join(", "));
    if !report.missing_columns.is_empty() {
        eprintln!("   ⚠️  Missing: {}", report.missing_columns.join(", "));
    }
    eprintln!(
        "   Rows: {} read, {} with violations, {} drivers",
        report.stats.input_rows, report.stats.filtered_rows, report.stats.drivers
    );

    let out_path = match output {
        Some(p) => p.to_path_buf(),
        None => input.with_file_name(output_file_name(&file_name)),
    };
    fs::write(&out_path, &rendered.workbook)?;
    eprintln!("💾 Output written to: {}", out_path.display());

    if json {
        println!("{}", serde_json::to_string_pretty(&report.rows)?);
    }

    Ok(())
}

fn cmd_columns() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = ColumnCatalog::builtin();
    let groups = [
        ("Default", ColumnGroup::Default),
        ("Harsh handling (toggled together)", ColumnGroup::HarshHandling),
        ("Additional", ColumnGroup::Additional),
    ];

    for (title, group) in groups {
        println!("{}:", title);
        for name in catalog.group(group) {
            println!("  - {}", name);
        }
    }
    println!("Name columns: {}", catalog.name_aliases().join(", "));
    Ok(())
}

fn cmd_inspect(input: &Path, metadata_lines: usize) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let options = ParseOptions {
        metadata_lines,
        delimiter: None,
    };
    let parsed = parse_file(input, &options)?;

    if let Some(ref encoding) = parsed.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(delimiter) = parsed.delimiter {
        eprintln!(
            "   Delimiter: '{}'",
            match delimiter {
                '\t' => "\\t".to_string(),
                c => c.to_string(),
            }
        );
    }
    eprintln!("   Rows: {}", parsed.table.len());

    let catalog = ColumnCatalog::builtin();
    for header in parsed.table.headers() {
        let marker = if catalog.contains(header) {
            "✓"
        } else if catalog.name_aliases().contains(header) {
            "🪪"
        } else {
            " "
        };
        println!("  {} {}", marker, header);
    }

    Ok(())
}
