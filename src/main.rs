//! sdgmart CLI - Build the SDG progress star schema
//!
//! # Main Commands
//!
//! ```bash
//! sdgmart run                       # Full pipeline: raw CSVs → mart CSVs
//! sdgmart check                     # Quality report over produced marts
//! sdgmart export                    # Combined denormalized analysis export
//! sdgmart serve                     # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! sdgmart parse raw.csv             # Just parse one raw table to JSON
//! ```

use clap::{Parser, Subcommand};
use sdgmart::{
    build_quality_report, load_table, log_report, read_marts, run_pipeline,
    write_combined_export, PipelineOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sdgmart")]
#[command(about = "Build the SDG progress star schema from raw extracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full transformation pipeline: raw tables → mart tables
    Run {
        /// Directory with the four raw CSV tables (default: $SDGMART_DATA_DIR)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Directory receiving the five mart tables (default: $SDGMART_MART_DIR)
        #[arg(short, long)]
        mart_dir: Option<PathBuf>,

        /// Skip mart schema validation
        #[arg(long)]
        no_validate: bool,

        /// Also write the combined analysis export
        #[arg(long)]
        export: bool,
    },

    /// Data quality report over a produced mart set
    Check {
        /// Mart directory (default: $SDGMART_MART_DIR)
        #[arg(short, long)]
        mart_dir: Option<PathBuf>,
    },

    /// Write the combined denormalized analysis export
    Export {
        /// Mart directory (default: $SDGMART_MART_DIR)
        #[arg(short, long)]
        mart_dir: Option<PathBuf>,

        /// Output directory (default: the mart directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a raw table file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            data_dir,
            mart_dir,
            no_validate,
            export,
        } => cmd_run(data_dir, mart_dir, no_validate, export).await,

        Commands::Check { mart_dir } => cmd_check(mart_dir),

        Commands::Export { mart_dir, output } => cmd_export(mart_dir, output),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_options(data_dir: Option<PathBuf>, mart_dir: Option<PathBuf>) -> PipelineOptions {
    let mut options = PipelineOptions::from_env();
    if let Some(dir) = data_dir {
        options.data_dir = dir;
    }
    if let Some(dir) = mart_dir {
        options.mart_dir = dir;
    }
    options
}

async fn cmd_run(
    data_dir: Option<PathBuf>,
    mart_dir: Option<PathBuf>,
    no_validate: bool,
    export: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = resolve_options(data_dir, mart_dir);
    options.skip_validation = no_validate;

    eprintln!("📄 Raw tables: {}", options.data_dir.display());
    eprintln!("📦 Mart tables: {}", options.mart_dir.display());

    let mart_dir = options.mart_dir.clone();
    let run = run_pipeline(options).await?;

    eprintln!("\n✨ Run {} complete:", run.run_id);
    for (table, rows) in run.marts.row_counts() {
        eprintln!("   {:25} {:>6} rows", table, rows);
    }
    if run.dropped.total() > 0 {
        eprintln!("   ({} malformed indicator rows excluded)", run.dropped.total());
    }

    if export {
        let rows = write_combined_export(&run.marts, &mart_dir)?;
        eprintln!("   sdg_analysis_combined     {:>6} rows", rows);
    }

    Ok(())
}

fn cmd_check(mart_dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(None, mart_dir);
    eprintln!("🔍 Checking marts in: {}", options.mart_dir.display());

    let marts = read_marts(&options.mart_dir)?;
    let report = build_quality_report(&marts);
    log_report(&report);

    if !report.is_clean() {
        return Err("quality check found sentinel contract violations".into());
    }

    Ok(())
}

fn cmd_export(
    mart_dir: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = resolve_options(None, mart_dir);
    let output_dir = output.unwrap_or_else(|| options.mart_dir.clone());

    eprintln!("📦 Exporting combined dataset from: {}", options.mart_dir.display());

    let marts = read_marts(&options.mart_dir)?;
    let rows = write_combined_export(&marts, &output_dir)?;

    eprintln!(
        "✅ Wrote {} rows to {}",
        rows,
        output_dir.join("sdg_analysis_combined.csv").display()
    );

    Ok(())
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing raw table: {}", input.display());

    let name = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table");
    let table = load_table(input, name)?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        match table.delimiter {
            '\t' => "\\t".to_string(),
            c => c.to_string(),
        }
    );
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Parsed {} records", table.records.len());

    let json = serde_json::to_string_pretty(&table.records)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    sdgmart::server::start_server(port).await
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
