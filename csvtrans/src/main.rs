//! csvtrans CLI - Stream CSV files through a row transformation
//!
//! # Commands
//!
//! ```bash
//! csvtrans run input.csv output.csv                  # Copy rows (normalized CSV)
//! csvtrans run input.csv output.csv --skip-header    # Copy rows without row 0
//! csvtrans run input.csv output.csv -m matrix.json   # Apply a column matrix
//! csvtrans check matrix.json                         # Validate a column matrix
//! csvtrans operations                                # Show available operations
//! csvtrans example-matrix                            # Show an example matrix
//! ```

use clap::{Parser, Subcommand};
use csvtrans::config::Settings;
use csvtrans::logs::init_logging;
use csvtrans::{example_matrix, from_fn, operations_description, run_files, ColumnMatrix};
use log::{debug, info};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvtrans")]
#[command(about = "Stream CSV files through a row transformation", long_about = None)]
struct Cli {
    /// Log skipped rows and other details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform INPUT into OUTPUT, one row at a time
    Run {
        /// Input CSV file
        input: PathBuf,

        /// Output CSV file (created or replaced)
        output: PathBuf,

        /// Column matrix to apply (default: $CSVTRANS_MATRIX, else copy rows)
        #[arg(short, long)]
        matrix: Option<PathBuf>,

        /// Drop row 0 when copying rows
        #[arg(long, conflicts_with = "matrix")]
        skip_header: bool,
    },

    /// Load and validate a column matrix file
    Check {
        /// Matrix JSON file
        matrix: PathBuf,
    },

    /// Show available column operations
    Operations,

    /// Show example column matrix
    ExampleMatrix,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings.with_verbose(cli.verbose),
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_logging(settings.log_level) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            matrix,
            skip_header,
        } => {
            let matrix = matrix.or(if skip_header { None } else { settings.matrix });
            cmd_run(&input, &output, matrix.as_deref(), skip_header)
        }

        Commands::Check { matrix } => cmd_check(&matrix),

        Commands::Operations => cmd_operations(),

        Commands::ExampleMatrix => cmd_example_matrix(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    input: &Path,
    output: &Path,
    matrix_path: Option<&Path>,
    skip_header: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Processing: {} -> {}", input.display(), output.display());

    let summary = match matrix_path {
        Some(path) => {
            let matrix = ColumnMatrix::from_path(path)?;
            info!("Matrix: {} ({} columns)", path.display(), matrix.columns.len());
            debug!("Output columns: {}", matrix.target_columns().join(", "));
            run_files(input, output, matrix.into_transformer()?)?
        }
        None => run_files(
            input,
            output,
            from_fn(move |i, row| Ok(if skip_header && i == 0 { None } else { Some(row) })),
        )?,
    };

    info!("{}", summary.summary());
    Ok(())
}

fn cmd_check(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let matrix = ColumnMatrix::from_path(path)?;
    matrix.validate()?;

    info!("Matrix is valid: {}", path.display());
    println!("Columns: {}", matrix.target_columns().join(", "));
    let sources: Vec<String> = matrix.source_columns().iter().map(|c| c.to_string()).collect();
    println!("Reads: {}", sources.join(", "));
    Ok(())
}

fn cmd_operations() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", operations_description());
    Ok(())
}

fn cmd_example_matrix() -> Result<(), Box<dyn std::error::Error>> {
    let json = example_matrix().to_json()?;
    println!("{}", json);
    Ok(())
}
